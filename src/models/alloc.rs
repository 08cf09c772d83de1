//! Identifier allocation.
//!
//! None of the tables use an auto-incrementing key. A new identifier is the
//! current maximum of the column plus one, or the table's floor plus one when
//! the table is empty. Because the value is derived from stored rows it
//! survives restarts and never goes backwards, but it is only safe when the
//! read and the following insert happen in the same write transaction (see
//! [`Connection::write`](super::Connection::write)).

use diesel::dsl::max;
use diesel::prelude::*;

use log::debug;

use crate::{Error, Result};

/// A table whose identifiers are allocated by [`next_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSequence {
    /// `Post.Post_ID`
    Post,
    /// `PostBoard.Postboard_ID`
    Postboard,
    /// `User.User_ID`
    User,
}

impl IdSequence {
    /// The value the first allocated identifier sits one above.
    pub fn floor(self) -> i32 {
        match self {
            IdSequence::Post => 100,
            IdSequence::Postboard => 9,
            IdSequence::User => 0,
        }
    }

    /// The table name on disk.
    pub fn table(self) -> &'static str {
        match self {
            IdSequence::Post => "Post",
            IdSequence::Postboard => "PostBoard",
            IdSequence::User => "User",
        }
    }

    /// The largest identifier currently stored, if any.
    pub fn current_max(self, conn: &mut SqliteConnection) -> QueryResult<Option<i32>> {
        match self {
            IdSequence::Post => {
                use crate::schema::post::columns::post_id;
                use crate::schema::post::dsl::post;

                post.select(max(post_id)).first(conn)
            }
            IdSequence::Postboard => {
                use crate::schema::postboard::columns::postboard_id;
                use crate::schema::postboard::dsl::postboard;

                postboard.select(max(postboard_id)).first(conn)
            }
            IdSequence::User => {
                use crate::schema::user::columns::user_id;
                use crate::schema::user::dsl::user;

                user.select(max(user_id)).first(conn)
            }
        }
    }
}

/// The identifier that follows `current`, given a table floor. `None` once
/// the column has reached `i32::MAX`.
pub fn next_after(current: Option<i32>, floor: i32) -> Option<i32> {
    current.unwrap_or(floor).checked_add(1)
}

/// Allocate the next identifier for a table.
///
/// This only reads; nothing is reserved until the caller inserts a row with
/// the returned value inside the same transaction.
pub fn next_id(conn: &mut SqliteConnection, seq: IdSequence) -> Result<i32> {
    let current = seq.current_max(conn)?;
    let next = next_after(current, seq.floor()).ok_or(Error::IdsExhausted {
        table: seq.table(),
    })?;

    debug!("allocated {} id {} (max {:?})", seq.table(), next, current);

    Ok(next)
}

#[cfg(test)]
mod tests {
    use diesel::insert_into;

    use super::*;
    use crate::models::testing::{at, database};
    use crate::models::{NewPostBoard, PostBoard};

    #[test]
    fn floors() {
        assert_eq!(next_after(None, IdSequence::Post.floor()), Some(101));
        assert_eq!(next_after(None, IdSequence::Postboard.floor()), Some(10));
        assert_eq!(next_after(None, IdSequence::User.floor()), Some(1));
    }

    #[test]
    fn follows_the_maximum() {
        assert_eq!(next_after(Some(104), 100), Some(105));
        // The floor only applies to empty tables.
        assert_eq!(next_after(Some(3), 100), Some(4));
        assert_eq!(next_after(Some(i32::MAX), 100), None);
    }

    #[test]
    fn empty_tables_start_above_the_floor() -> Result<()> {
        let (_dir, db) = database()?;
        let mut conn = db.get()?;

        assert_eq!(next_id(conn.raw(), IdSequence::Post)?, 101);
        assert_eq!(next_id(conn.raw(), IdSequence::Postboard)?, 10);
        assert_eq!(next_id(conn.raw(), IdSequence::User)?, 1);

        Ok(())
    }

    #[test]
    fn allocation_has_no_side_effects() -> Result<()> {
        let (_dir, db) = database()?;
        let mut conn = db.get()?;

        assert_eq!(next_id(conn.raw(), IdSequence::Postboard)?, 10);
        assert_eq!(next_id(conn.raw(), IdSequence::Postboard)?, 10);

        conn.create_postboard(NewPostBoard { hidden: false }, at(0))?;

        assert_eq!(next_id(conn.raw(), IdSequence::Postboard)?, 11);

        Ok(())
    }

    #[test]
    fn full_column_is_an_error() -> Result<()> {
        use crate::schema::postboard::dsl::postboard;

        let (_dir, db) = database()?;
        let mut conn = db.get()?;

        insert_into(postboard)
            .values(&PostBoard {
                postboard_id: i32::MAX,
                postboard_time_stamp: at(0),
                hidden_post: 0,
            })
            .execute(conn.raw())?;

        match conn.create_postboard(NewPostBoard::default(), at(1)) {
            Err(Error::IdsExhausted { table: "PostBoard" }) => {}
            other => panic!("expected IdsExhausted, got {:?}", other),
        }
        assert_eq!(conn.all_boards()?.len(), 1);

        Ok(())
    }
}
