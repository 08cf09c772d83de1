//! The JSON API, mounted at `/api`.

use log::trace;

use rocket::serde::json::{self, Json};
use rocket::tokio::task::spawn_blocking;
use rocket::{catch, catchers, get, post, routes, Catcher, Request, Route, State};

use serde::Serialize;

use serde_json::Value;

use crate::models::*;
use crate::{Config, DemoRng, Error, Result};

/// Run `f` against a pooled connection on the blocking thread pool. Waiting
/// for a free connection and for SQLite's write lock both happen there.
async fn blocking<T, F>(db: &Database, f: F) -> Result<T>
where
    F: FnOnce(&mut PooledConnection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();

    spawn_blocking(move || f(&mut db.get()?)).await?
}

/// The body of a successful post creation.
#[derive(Debug, Serialize)]
pub struct PostCreated {
    pub success: bool,
    #[serde(rename = "postId")]
    pub post_id: PostId,
}

/// List every board.
#[get("/postboards")]
pub async fn list_postboards(db: &State<Database>) -> Result<Json<Vec<PostBoard>>> {
    trace!("listing postboards");
    blocking(db, |conn| conn.all_boards()).await.map(Json)
}

/// Get one board.
#[get("/postboards/<board_id>")]
pub async fn get_postboard(
    board_id: PostboardId,
    db: &State<Database>,
) -> Result<Json<PostBoard>> {
    blocking(db, move |conn| conn.board(board_id)).await.map(Json)
}

/// List the posts on a board, newest first.
#[get("/postboards/<board_id>/posts")]
pub async fn list_posts(
    board_id: PostboardId,
    db: &State<Database>,
) -> Result<Json<Vec<PostEntry>>> {
    blocking(db, move |conn| conn.posts_on_board(board_id))
        .await
        .map(Json)
}

/// List the events on a board, latest event first.
#[get("/postboards/<board_id>/events")]
pub async fn list_events(board_id: PostboardId, db: &State<Database>) -> Result<Json<Vec<Event>>> {
    blocking(db, move |conn| conn.events_on_board(board_id))
        .await
        .map(Json)
}

/// Get one post with its event data.
#[get("/posts/<post_id>")]
pub async fn get_post(post_id: PostId, db: &State<Database>) -> Result<Json<PostEntry>> {
    blocking(db, move |conn| conn.post(post_id)).await.map(Json)
}

/// List every user.
#[get("/users")]
pub async fn list_users(db: &State<Database>) -> Result<Json<Vec<User>>> {
    blocking(db, |conn| conn.all_users()).await.map(Json)
}

/// Create a board. A missing or unreadable body is an empty one.
#[post("/postboards", data = "<body>")]
pub async fn create_postboard(
    body: Option<Json<PostBoardRequest>>,
    db: &State<Database>,
) -> Result<Json<PostBoard>> {
    let new_board = NewPostBoard::from(body.map(Json::into_inner).unwrap_or_default());

    blocking(db, move |conn| conn.create_postboard(new_board, now()))
        .await
        .map(Json)
}

/// Create a post, with its event if it has one.
#[post("/post", data = "<body>")]
pub async fn create_post(
    body: std::result::Result<Json<PostRequest>, json::Error<'_>>,
    config: &State<Config>,
    db: &State<Database>,
) -> Result<Json<PostCreated>> {
    let req = body
        .map_err(|e| Error::invalid("body", e.to_string()))?
        .into_inner();

    let new_post = req.validate(now())?;
    let check = config.board_check();

    let post_id = blocking(db, move |conn| conn.create_post(&new_post, check)).await?;

    Ok(Json(PostCreated {
        success: true,
        post_id,
    }))
}

/// Give the demo user a new board with three random posts.
#[post("/seed-john")]
pub async fn seed_john(db: &State<Database>, rng: &State<DemoRng>) -> Result<Json<SeedOutcome>> {
    let rng = rng.inner().clone();

    blocking(db, move |conn| {
        // A poisoned lock still holds a usable generator.
        let mut rng = rng.0.lock().unwrap_or_else(|e| e.into_inner());
        conn.seed_demo(&mut *rng, now())
    })
    .await
    .map(Json)
}

/// All API routes.
pub fn routes() -> Vec<Route> {
    routes![
        list_postboards,
        get_postboard,
        list_posts,
        list_events,
        get_post,
        list_users,
        create_postboard,
        create_post,
        seed_john,
    ]
}

#[catch(400)]
fn bad_request() -> Json<Value> {
    crate::error::failure_body("bad request")
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    crate::error::failure_body(format!("no route for {} {}", req.method(), req.uri()))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    crate::error::failure_body("malformed request body")
}

#[catch(500)]
fn internal_error() -> Json<Value> {
    crate::error::failure_body("internal error")
}

#[catch(503)]
fn unavailable() -> Json<Value> {
    crate::error::failure_body("database unavailable")
}

/// JSON replacements for rocket's default error pages.
pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        not_found,
        unprocessable,
        internal_error,
        unavailable
    ]
}
