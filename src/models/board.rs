//! Types related to postboards.

use chrono::NaiveDateTime;

use diesel::{insert_into, prelude::*};

use log::info;

use serde::{Deserialize, Serialize};

use crate::models::{Connection, *};
use crate::schema::postboard;
use crate::{Error, Result};

/// A postboard ID.
pub type PostboardId = i32;

/// A collection of posts.
#[derive(Debug, Clone, PartialEq, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = postboard)]
pub struct PostBoard {
    /// The ID of the board.
    #[serde(rename = "Postboard_ID")]
    pub postboard_id: PostboardId,
    /// When the board was created.
    #[serde(rename = "Postboard_TimeStamp", with = "time_stamp")]
    pub postboard_time_stamp: NaiveDateTime,
    /// 1 if the board is hidden, 0 otherwise.
    #[serde(rename = "Hidden_Post")]
    pub hidden_post: i32,
}

impl PostBoard {
    pub fn is_hidden(&self) -> bool {
        self.hidden_post != 0
    }
}

/// A board to be created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewPostBoard {
    pub hidden: bool,
}

/// The JSON body of a board creation request. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct PostBoardRequest {
    #[serde(default)]
    pub hidden: Option<serde_json::Value>,
}

impl From<PostBoardRequest> for NewPostBoard {
    fn from(req: PostBoardRequest) -> NewPostBoard {
        NewPostBoard {
            hidden: req.hidden.as_ref().map_or(false, is_truthy),
        }
    }
}

/// Whether a loosely-typed JSON flag counts as set.
///
/// `true`, non-zero numbers and non-empty strings, arrays and objects are set;
/// everything else (including `null`) is not.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a board.
fn conv_board_error(
    board_id: PostboardId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::BoardNotFound { board_id },
        _ => Error::from(e),
    }
}

/// Insert a new board, allocating its ID. Must run inside a write
/// transaction.
pub(crate) fn insert_postboard(
    conn: &mut SqliteConnection,
    new_board: NewPostBoard,
    time_stamp: NaiveDateTime,
) -> Result<PostBoard> {
    use crate::schema::postboard::dsl::postboard;

    let row = PostBoard {
        postboard_id: next_id(conn, IdSequence::Postboard)?,
        postboard_time_stamp: time_stamp,
        hidden_post: new_board.hidden as i32,
    };

    insert_into(postboard).values(&row).execute(conn)?;

    Ok(row)
}

/// Whether a board with the given ID exists.
pub(crate) fn board_exists(
    conn: &mut SqliteConnection,
    board_id: PostboardId,
) -> Result<bool> {
    use crate::schema::postboard::columns::postboard_id;
    use crate::schema::postboard::dsl::postboard;

    use diesel::dsl::exists;
    use diesel::select;

    Ok(select(exists(postboard.filter(postboard_id.eq(board_id)))).get_result(conn)?)
}

impl<C> Connection<C>
where
    C: InnerConnection,
{
    /// Create a board and return the stored row.
    pub fn create_postboard(
        &mut self,
        new_board: NewPostBoard,
        time_stamp: NaiveDateTime,
    ) -> Result<PostBoard> {
        let board = self.write(|conn| insert_postboard(conn, new_board, time_stamp))?;

        info!(
            "created postboard #{} (hidden {})",
            board.postboard_id, board.hidden_post
        );

        Ok(board)
    }

    /// Get all boards, in storage order.
    pub fn all_boards(&mut self) -> Result<Vec<PostBoard>> {
        use crate::schema::postboard::dsl::postboard;

        Ok(postboard.load(self.raw())?)
    }

    /// Get a board.
    pub fn board(&mut self, board_id: PostboardId) -> Result<PostBoard> {
        use crate::schema::postboard::columns::postboard_id;
        use crate::schema::postboard::dsl::postboard;

        postboard
            .filter(postboard_id.eq(board_id))
            .first(self.raw())
            .map_err(conv_board_error(board_id))
    }
}
