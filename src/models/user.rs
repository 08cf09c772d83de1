//! Types related to users and their course affiliation.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{insert_into, prelude::*};

use log::{debug, info, trace};

use serde::Serialize;

use crate::models::{Connection, *};
use crate::schema::{uc_info, user};
use crate::Result;

/// A user ID.
pub type UserId = i32;

/// A user, identified by email.
#[derive(Debug, Clone, PartialEq, Queryable, Insertable, Serialize)]
#[diesel(table_name = user)]
pub struct User {
    #[serde(rename = "User_ID")]
    pub user_id: UserId,
    pub email: String,
}

/// The course a user is enrolled in.
#[derive(Debug, Clone, PartialEq, Queryable, Insertable, Serialize)]
#[diesel(table_name = uc_info)]
pub struct UcInfo {
    #[serde(rename = "CourseInfo")]
    pub course_info: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Term")]
    pub term: Option<String>,
    #[serde(rename = "User_ID")]
    pub user_id: UserId,
}

fn user_by_email(conn: &mut SqliteConnection, address: &str) -> QueryResult<Option<User>> {
    user::table
        .filter(user::email.eq(address))
        .first(conn)
        .optional()
}

/// Find the user with `address`, creating them if needed. Must run inside a
/// write transaction.
///
/// The insert comes first; a duplicate email is answered with the stored
/// row.
pub(crate) fn find_or_create_user(conn: &mut SqliteConnection, address: &str) -> Result<User> {
    let new_user = User {
        user_id: next_id(conn, IdSequence::User)?,
        email: address.to_string(),
    };

    match insert_into(user::table).values(&new_user).execute(conn) {
        Ok(_) => {
            info!("created user #{} <{}>", new_user.user_id, new_user.email);
            Ok(new_user)
        }
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            debug!("user <{}> already exists", address);
            Ok(user::table.filter(user::email.eq(address)).first(conn)?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Record the user's course affiliation unless one is already stored. Must
/// run inside a write transaction.
pub(crate) fn ensure_affiliation(conn: &mut SqliteConnection, info: &UcInfo) -> Result<()> {
    let stored: i64 = uc_info::table
        .filter(uc_info::user_id.eq(info.user_id))
        .count()
        .get_result(conn)?;

    if stored == 0 {
        insert_into(uc_info::table).values(info).execute(conn)?;
        debug!("recorded affiliation for user #{}", info.user_id);
    }

    Ok(())
}

impl<C> Connection<C>
where
    C: InnerConnection,
{
    /// Get a user by email.
    pub fn user(&mut self, address: &str) -> Result<Option<User>> {
        Ok(user_by_email(self.raw(), address)?)
    }

    /// Get a user's affiliation.
    pub fn affiliation(&mut self, user_id: UserId) -> Result<Option<UcInfo>> {
        Ok(uc_info::table
            .filter(uc_info::user_id.eq(user_id))
            .first(self.raw())
            .optional()?)
    }

    /// Get all users, in storage order.
    pub fn all_users(&mut self) -> Result<Vec<User>> {
        trace!("listing users");

        Ok(user::table.load(self.raw())?)
    }

    /// Get the number of users in the database.
    pub fn num_users(&mut self) -> Result<i64> {
        Ok(user::table.count().get_result(self.raw())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::database;

    #[test]
    fn users_are_found_by_email() -> Result<()> {
        let (_dir, db) = database()?;
        let mut conn = db.get()?;

        let first = conn.write(|c| find_or_create_user(c, "jane@ucmerced.edu"))?;
        let again = conn.write(|c| find_or_create_user(c, "jane@ucmerced.edu"))?;
        let other = conn.write(|c| find_or_create_user(c, "sam@ucmerced.edu"))?;

        assert_eq!(first.user_id, 1);
        // The second call hits the unique email and falls back to the
        // stored row.
        assert_eq!(again, first);
        assert_eq!(other.user_id, 2);
        assert_eq!(conn.num_users()?, 2);
        assert_eq!(conn.user("sam@ucmerced.edu")?, Some(other.clone()));
        assert_eq!(conn.user("nobody@ucmerced.edu")?, None);
        assert_eq!(conn.all_users()?, vec![first, other]);

        Ok(())
    }

    #[test]
    fn affiliation_is_written_once() -> Result<()> {
        let (_dir, db) = database()?;
        let mut conn = db.get()?;

        let jane = conn.write(|c| find_or_create_user(c, "jane@ucmerced.edu"))?;
        let info = UcInfo {
            course_info: Some("CSE111".into()),
            name: Some("Jane Doe".into()),
            term: Some("Fall2025".into()),
            user_id: jane.user_id,
        };

        conn.write(|c| ensure_affiliation(c, &info))?;
        conn.write(|c| {
            ensure_affiliation(
                c,
                &UcInfo {
                    course_info: Some("CSE100".into()),
                    ..info.clone()
                },
            )
        })?;

        assert_eq!(conn.affiliation(jane.user_id)?, Some(info));

        Ok(())
    }

    #[test]
    fn duplicate_email_keeps_the_transaction_usable() -> Result<()> {
        let (_dir, db) = database()?;
        let mut conn = db.get()?;

        let (first, again, other) = conn.write(|c| {
            let first = find_or_create_user(c, "jane@ucmerced.edu")?;
            let again = find_or_create_user(c, "jane@ucmerced.edu")?;
            let other = find_or_create_user(c, "sam@ucmerced.edu")?;
            Ok((first, again, other))
        })?;

        assert_eq!(again, first);
        assert_eq!(other.user_id, 2);
        assert_eq!(conn.num_users()?, 2);

        Ok(())
    }
}
