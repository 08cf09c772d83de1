//! Types related to posts and the events attached to them.

use chrono::{DateTime, NaiveDateTime, SubsecRound};

use diesel::{insert_into, prelude::*};

use log::{info, trace};

use serde::{Deserialize, Serialize};

use crate::models::{Connection, *};
use crate::schema::{event, post, postboard_post};
use crate::{Error, Result};

/// A post ID.
pub type PostId = i32;

/// The event type used when a request does not name one.
pub const DEFAULT_EVENT_TYPE: &str = "General";

/// The post type used when a request does not name one.
pub const DEFAULT_POST_TYPE: &str = "Message";

/// Details of an event attached to a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub name: String,
    pub location: String,
    pub time: NaiveDateTime,
    pub event_type: String,
}

/// What a post is. Only event posts carry event details, and every event
/// post carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostKind {
    Message,
    Information,
    Announcement,
    Event(EventDetails),
    /// Any other caller-supplied type.
    Other(String),
}

impl PostKind {
    /// The value stored in `Post_type`.
    pub fn type_name(&self) -> &str {
        match self {
            PostKind::Message => "Message",
            PostKind::Information => "Information",
            PostKind::Announcement => "Announcement",
            PostKind::Event(_) => "Event",
            PostKind::Other(name) => name,
        }
    }

    /// A kind without event details, from its type name. Returns `None` for
    /// `"Event"`, which cannot exist without details.
    pub fn plain<S>(type_name: S) -> Option<PostKind>
    where
        S: Into<String>,
    {
        let type_name = type_name.into();

        match type_name.as_str() {
            "Message" => Some(PostKind::Message),
            "Information" => Some(PostKind::Information),
            "Announcement" => Some(PostKind::Announcement),
            "Event" => None,
            _ => Some(PostKind::Other(type_name)),
        }
    }

    pub fn event(&self) -> Option<&EventDetails> {
        match self {
            PostKind::Event(details) => Some(details),
            _ => None,
        }
    }
}

/// A validated post, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// The board the post is linked to.
    pub board_id: PostboardId,
    pub time_stamp: NaiveDateTime,
    pub kind: PostKind,
}

/// Whether `create_post` checks that the target board exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCheck {
    /// Reject posts to unknown boards.
    Require,
    /// Link the post to whatever board ID was given.
    Skip,
}

/// The JSON body of a post creation request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub board_id: Option<PostboardId>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub is_event: Option<serde_json::Value>,
    pub event_name: Option<String>,
    pub event_location: Option<String>,
    pub event_time: Option<String>,
    pub event_type: Option<String>,
}

/// A request field, with blank strings counted as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn required(value: Option<String>, param: &str) -> Result<String> {
    present(value).ok_or_else(|| Error::missing(param))
}

/// Parse an event time given by a client.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, the same with a `T` separator, the minute
/// precision `YYYY-MM-DDTHH:MM` sent by browser date pickers, and RFC 3339.
/// The result is truncated to whole seconds.
pub fn parse_event_time(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();

    for format in &[TIME_STAMP_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(time.trunc_subsecs(0));
        }
    }

    DateTime::parse_from_rfc3339(s)
        .map(|time| time.naive_local().trunc_subsecs(0))
        .map_err(|_| {
            Error::invalid("eventTime", format!("'{}' is not a date and time", s))
        })
}

impl PostRequest {
    /// Check a request and turn it into a post to be written at `time_stamp`.
    ///
    /// Nothing is written here, so a rejected request leaves no trace.
    pub fn validate(self, time_stamp: NaiveDateTime) -> Result<NewPost> {
        let board_id = self.board_id.ok_or_else(|| Error::missing("boardId"))?;
        let is_event = self.is_event.as_ref().map_or(false, is_truthy);
        let post_type = present(self.post_type);

        let kind = if is_event {
            if let Some(post_type) = post_type.filter(|t| t != "Event") {
                return Err(Error::invalid(
                    "type",
                    format!("an event post cannot have type '{}'", post_type),
                ));
            }

            let name = required(self.event_name, "eventName")?;
            let location = required(self.event_location, "eventLocation")?;
            let time = parse_event_time(&required(self.event_time, "eventTime")?)?;
            let event_type = present(self.event_type)
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string());

            PostKind::Event(EventDetails {
                name,
                location,
                time,
                event_type,
            })
        } else {
            let post_type =
                post_type.unwrap_or_else(|| DEFAULT_POST_TYPE.to_string());

            PostKind::plain(post_type).ok_or_else(|| {
                Error::invalid("type", "an 'Event' post needs isEvent and event details")
            })?
        };

        Ok(NewPost {
            board_id,
            time_stamp,
            kind,
        })
    }
}

/// The database representation of a post.
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = post)]
struct DbPost {
    post_id: PostId,
    post_time_stamp: NaiveDateTime,
    post_type: String,
}

/// A row linking a post to its board.
#[derive(Debug, Insertable)]
#[diesel(table_name = postboard_post)]
struct PostboardLink {
    postboard_id: PostboardId,
    post_id: PostId,
}

/// An event attached to a post.
#[derive(Debug, Clone, PartialEq, Queryable, Serialize, Deserialize)]
pub struct Event {
    #[serde(skip)]
    pub event_id: i32,
    #[serde(rename = "Event_name")]
    pub event_name: String,
    #[serde(rename = "Event_Location")]
    pub event_location: String,
    #[serde(rename = "Event_attendence")]
    pub event_attendence: i32,
    #[serde(rename = "Event_time", with = "time_stamp")]
    pub event_time: NaiveDateTime,
    #[serde(rename = "Event_type")]
    pub event_type: String,
    /// The post the event is attached to.
    #[serde(rename = "Post_ID")]
    pub post_id: PostId,
}

/// A new event to be inserted in the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = event)]
struct NewEvent<'a> {
    event_name: &'a str,
    event_location: &'a str,
    event_attendence: i32,
    event_time: NaiveDateTime,
    event_type: &'a str,
    post_id: PostId,
}

/// A post as listed on a board, with its event fields flattened in. The event
/// fields are `None` for posts without an event.
#[derive(Debug, Clone, PartialEq, Queryable, Serialize, Deserialize)]
pub struct PostEntry {
    #[serde(rename = "Post_ID")]
    pub post_id: PostId,
    #[serde(rename = "Post_TimeStamp", with = "time_stamp")]
    pub post_time_stamp: NaiveDateTime,
    #[serde(rename = "Post_type")]
    pub post_type: String,
    #[serde(rename = "Event_name")]
    pub event_name: Option<String>,
    #[serde(rename = "Event_Location")]
    pub event_location: Option<String>,
    #[serde(rename = "Event_time", with = "time_stamp::option")]
    pub event_time: Option<NaiveDateTime>,
    #[serde(rename = "Event_type")]
    pub event_type: Option<String>,
}

impl PostEntry {
    /// The entry a freshly written post will be listed as.
    pub fn new(post_id: PostId, time_stamp: NaiveDateTime, kind: &PostKind) -> PostEntry {
        let details = kind.event();

        PostEntry {
            post_id,
            post_time_stamp: time_stamp,
            post_type: kind.type_name().to_string(),
            event_name: details.map(|d| d.name.clone()),
            event_location: details.map(|d| d.location.clone()),
            event_time: details.map(|d| d.time),
            event_type: details.map(|d| d.event_type.clone()),
        }
    }
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a post.
fn conv_post_error(post_id: PostId) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::PostNotFound { post_id },
        _ => Error::from(e),
    }
}

/// Write a post, its board link and its event (if any). Must run inside a
/// write transaction so that a failure at any step leaves nothing behind.
pub(crate) fn insert_post(conn: &mut SqliteConnection, new_post: &NewPost) -> Result<PostId> {
    let post_id = next_id(conn, IdSequence::Post)?;

    insert_into(post::table)
        .values(&DbPost {
            post_id,
            post_time_stamp: new_post.time_stamp,
            post_type: new_post.kind.type_name().to_string(),
        })
        .execute(conn)?;

    insert_into(postboard_post::table)
        .values(&PostboardLink {
            postboard_id: new_post.board_id,
            post_id,
        })
        .execute(conn)?;

    if let PostKind::Event(details) = &new_post.kind {
        insert_into(event::table)
            .values(&NewEvent {
                event_name: &details.name,
                event_location: &details.location,
                event_attendence: 0,
                event_time: details.time,
                event_type: &details.event_type,
                post_id,
            })
            .execute(conn)?;
    }

    Ok(post_id)
}

impl<C> Connection<C>
where
    C: InnerConnection,
{
    /// Create a post on a board.
    ///
    /// The post row, the board link and the event row are committed together
    /// or not at all.
    pub fn create_post(&mut self, new_post: &NewPost, check: BoardCheck) -> Result<PostId> {
        let post_id = self.write(|conn| {
            if check == BoardCheck::Require && !board_exists(conn, new_post.board_id)? {
                return Err(Error::BoardNotFound {
                    board_id: new_post.board_id,
                });
            }

            insert_post(conn, new_post)
        })?;

        info!(
            "created {} post #{} on postboard #{}",
            new_post.kind.type_name(),
            post_id,
            new_post.board_id
        );

        Ok(post_id)
    }

    /// All posts on a board with their event data, most recent first.
    ///
    /// An unknown board simply has no posts.
    pub fn posts_on_board(&mut self, board_id: PostboardId) -> Result<Vec<PostEntry>> {
        trace!("listing posts on postboard #{}", board_id);

        Ok(post::table
            .inner_join(postboard_post::table)
            .left_join(event::table)
            .filter(postboard_post::postboard_id.eq(board_id))
            .select((
                post::post_id,
                post::post_time_stamp,
                post::post_type,
                event::event_name.nullable(),
                event::event_location.nullable(),
                event::event_time.nullable(),
                event::event_type.nullable(),
            ))
            .order(post::post_time_stamp.desc())
            .load(self.raw())?)
    }

    /// Get one post with its event data.
    pub fn post(&mut self, post_id: PostId) -> Result<PostEntry> {
        trace!("getting post #{}", post_id);

        post::table
            .left_join(event::table)
            .filter(post::post_id.eq(post_id))
            .select((
                post::post_id,
                post::post_time_stamp,
                post::post_type,
                event::event_name.nullable(),
                event::event_location.nullable(),
                event::event_time.nullable(),
                event::event_type.nullable(),
            ))
            .first(self.raw())
            .map_err(conv_post_error(post_id))
    }

    /// All events attached to posts on a board, latest event time first.
    pub fn events_on_board(&mut self, board_id: PostboardId) -> Result<Vec<Event>> {
        trace!("listing events on postboard #{}", board_id);

        let posts_on_board = postboard_post::table
            .filter(postboard_post::postboard_id.eq(board_id))
            .select(postboard_post::post_id);

        Ok(event::table
            .filter(event::post_id.eq_any(posts_on_board))
            .order(event::event_time.desc())
            .load(self.raw())?)
    }

    /// Get the number of posts in the database.
    pub fn num_posts(&mut self) -> Result<i64> {
        Ok(post::table.count().get_result(self.raw())?)
    }
}
