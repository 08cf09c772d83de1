//! Demo data for a fixed user.

use chrono::{Duration, NaiveDateTime};

use log::info;

use rand::Rng;

use serde::Serialize;

use crate::models::{Connection, *};
use crate::Result;

/// The email of the demo user.
pub const DEMO_EMAIL: &str = "john@ucmerced.edu";

const DEMO_COURSE: &str = "CSE111";
const DEMO_NAME: &str = "John Doe";
const DEMO_TERM: &str = "Fall2025";

const TOPICS: &[&str] = &[
    "Project Showcase",
    "Study Group",
    "Club Meetup",
    "Exam Review",
    "Research Talk",
];

const LOCATIONS: &[&str] = &[
    "COB2 110",
    "SE2 120",
    "SAAC 203",
    "Library 2nd Floor",
    "Granite Pass",
];

const POST_TYPES: &[&str] = &["Information", "Announcement", "Event"];

/// Number of posts written on each demo board.
pub const DEMO_POSTS: usize = 3;

/// What one demo run wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedOutcome {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub board: PostBoard,
    pub posts: Vec<PostEntry>,
}

fn pick<'a, R: Rng>(rng: &mut R, choices: &[&'a str]) -> &'a str {
    choices[rng.gen_range(0..choices.len())]
}

/// The demo posts for a board, drawn from `rng`.
fn demo_posts<R: Rng>(rng: &mut R, board_id: PostboardId, now: NaiveDateTime) -> Vec<NewPost> {
    (0..DEMO_POSTS)
        .map(|i| {
            let kind = match PostKind::plain(pick(rng, POST_TYPES)) {
                Some(kind) => kind,
                None => PostKind::Event(EventDetails {
                    name: pick(rng, TOPICS).to_string(),
                    location: pick(rng, LOCATIONS).to_string(),
                    time: now + Duration::days(i as i64 + 1),
                    event_type: DEFAULT_EVENT_TYPE.to_string(),
                }),
            };

            NewPost {
                board_id,
                time_stamp: now + Duration::minutes(5 * i as i64),
                kind,
            }
        })
        .collect()
}

impl<C> Connection<C>
where
    C: InnerConnection,
{
    /// Make sure the demo user exists, then give them a new board with three
    /// random posts.
    ///
    /// The user and their affiliation are reused across runs. Every run adds
    /// a board. Everything is written in one transaction.
    pub fn seed_demo<R>(&mut self, rng: &mut R, now: NaiveDateTime) -> Result<SeedOutcome>
    where
        R: Rng,
    {
        let outcome = self.write(|conn| {
            let demo_user = find_or_create_user(conn, DEMO_EMAIL)?;

            ensure_affiliation(
                conn,
                &UcInfo {
                    course_info: Some(DEMO_COURSE.to_string()),
                    name: Some(DEMO_NAME.to_string()),
                    term: Some(DEMO_TERM.to_string()),
                    user_id: demo_user.user_id,
                },
            )?;

            let board = insert_postboard(conn, NewPostBoard::default(), now)?;

            let mut posts = Vec::with_capacity(DEMO_POSTS);
            for new_post in demo_posts(rng, board.postboard_id, now) {
                let post_id = insert_post(conn, &new_post)?;
                posts.push(PostEntry::new(post_id, new_post.time_stamp, &new_post.kind));
            }

            Ok(SeedOutcome {
                user_id: demo_user.user_id,
                board,
                posts,
            })
        })?;

        info!(
            "seeded postboard #{} for user #{}",
            outcome.board.postboard_id, outcome.user_id
        );

        Ok(outcome)
    }
}
