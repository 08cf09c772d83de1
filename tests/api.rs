use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;

use serde_json::{json, Value};

use tempfile::TempDir;

use postboard::{new_instance, Config};

fn client_with(config: Config) -> (TempDir, Client) {
    let dir = TempDir::new().expect("temp dir");
    let config = Config {
        database_url: dir.path().join("api.sqlite").to_string_lossy().into_owned(),
        ..config
    };

    let rocket = new_instance(config).expect("valid config");
    let client = Client::tracked(rocket).expect("valid rocket instance");

    (dir, client)
}

fn client() -> (TempDir, Client) {
    client_with(Config {
        demo_seed: Some(3),
        ..Config::default()
    })
}

fn get(client: &Client, uri: &str) -> (Status, Value) {
    let res = client.get(uri.to_string()).dispatch();
    let status = res.status();
    (status, res.into_json().expect("JSON body"))
}

fn post(client: &Client, uri: &str, body: Value) -> (Status, Value) {
    let res = client
        .post(uri.to_string())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    let status = res.status();
    (status, res.into_json().expect("JSON body"))
}

fn new_board(client: &Client) -> i64 {
    let (status, board) = post(client, "/api/postboards", json!({}));
    assert_eq!(status, Status::Ok);
    board["Postboard_ID"].as_i64().expect("board id")
}

fn post_count(client: &Client, board_id: i64) -> usize {
    let (_, posts) = get(client, &format!("/api/postboards/{}/posts", board_id));
    posts.as_array().expect("array").len()
}

#[test]
fn boards_start_at_ten() {
    let (_dir, client) = client();

    let (status, board) = post(&client, "/api/postboards", json!({}));
    assert_eq!(status, Status::Ok);
    assert_eq!(board["Postboard_ID"], 10);
    assert_eq!(board["Hidden_Post"], 0);

    let (_, hidden) = post(&client, "/api/postboards", json!({ "hidden": true }));
    assert_eq!(hidden["Postboard_ID"], 11);
    assert_eq!(hidden["Hidden_Post"], 1);

    let (status, boards) = get(&client, "/api/postboards");
    assert_eq!(status, Status::Ok);
    let boards = boards.as_array().expect("array");
    assert_eq!(boards.len(), 2);
    assert!(boards.contains(&board));
    assert!(boards.contains(&hidden));

    let (status, one) = get(&client, "/api/postboards/11");
    assert_eq!(status, Status::Ok);
    assert_eq!(one, hidden);
}

#[test]
fn board_without_body() {
    let (_dir, client) = client();

    let res = client.post("/api/postboards").dispatch();
    assert_eq!(res.status(), Status::Ok);

    let board: Value = res.into_json().expect("JSON body");
    assert_eq!(board["Hidden_Post"], 0);
}

#[test]
fn unknown_board() {
    let (_dir, client) = client();

    let (status, body) = get(&client, "/api/postboards/42");
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["success"], false);

    let (status, posts) = get(&client, "/api/postboards/42/posts");
    assert_eq!(status, Status::Ok);
    assert_eq!(posts, json!([]));
}

#[test]
fn posts_and_events() {
    let (_dir, client) = client();
    let board_id = new_board(&client);

    let (status, plain) = post(
        &client,
        "/api/post",
        json!({ "boardId": board_id, "type": "Announcement" }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(plain, json!({ "success": true, "postId": 101 }));

    let (status, event) = post(
        &client,
        "/api/post",
        json!({
            "boardId": board_id,
            "type": "Event",
            "isEvent": true,
            "eventName": "Club Meetup",
            "eventLocation": "SAAC 203",
            "eventTime": "2025-10-01T17:00",
        }),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(event["postId"], 102);

    let (_, posts) = get(&client, &format!("/api/postboards/{}/posts", board_id));
    let posts = posts.as_array().expect("array");
    assert_eq!(posts.len(), 2);

    for entry in posts {
        if entry["Post_ID"] == 102 {
            assert_eq!(entry["Post_type"], "Event");
            assert_eq!(entry["Event_name"], "Club Meetup");
            assert_eq!(entry["Event_Location"], "SAAC 203");
            assert_eq!(entry["Event_time"], "2025-10-01 17:00:00");
            assert_eq!(entry["Event_type"], "General");
        } else {
            assert_eq!(entry["Post_ID"], 101);
            assert_eq!(entry["Post_type"], "Announcement");
            assert_eq!(entry["Event_name"], Value::Null);
            assert_eq!(entry["Event_Location"], Value::Null);
            assert_eq!(entry["Event_time"], Value::Null);
            assert_eq!(entry["Event_type"], Value::Null);
        }
    }

    let (status, events) = get(&client, &format!("/api/postboards/{}/events", board_id));
    assert_eq!(status, Status::Ok);
    assert_eq!(events.as_array().map(Vec::len), Some(1));
    assert_eq!(events[0]["Post_ID"], 102);
    assert_eq!(events[0]["Event_attendence"], 0);
}

#[test]
fn rejected_posts_leave_nothing_behind() {
    let (_dir, client) = client();
    let board_id = new_board(&client);

    let (status, body) = post(
        &client,
        "/api/post",
        json!({
            "boardId": board_id,
            "isEvent": true,
            "eventName": "Exam Review",
            "eventLocation": "COB2 110",
        }),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().expect("message").contains("eventTime"));

    let (status, _) = post(&client, "/api/post", json!({ "type": "Message" }));
    assert_eq!(status, Status::BadRequest);

    let (status, _) = post(&client, "/api/post", json!({ "boardId": "ten" }));
    assert_eq!(status, Status::BadRequest);

    assert_eq!(post_count(&client, board_id), 0);

    // The next accepted post still gets the first ID.
    let (_, created) = post(&client, "/api/post", json!({ "boardId": board_id }));
    assert_eq!(created["postId"], 101);
}

#[test]
fn orphan_posts_are_rejected_by_default() {
    let (_dir, client) = client();

    let (status, body) = post(&client, "/api/post", json!({ "boardId": 77 }));
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["success"], false);
    assert_eq!(post_count(&client, 77), 0);
}

#[test]
fn orphan_posts_can_be_allowed() {
    let (_dir, client) = client_with(Config {
        require_existing_board: false,
        ..Config::default()
    });

    let (status, body) = post(&client, "/api/post", json!({ "boardId": 77 }));
    assert_eq!(status, Status::Ok);
    assert_eq!(body["postId"], 101);
    assert_eq!(post_count(&client, 77), 1);
}

#[test]
fn seeding_twice() {
    let (_dir, client) = client();

    let (status, first) = post(&client, "/api/seed-john", json!(null));
    assert_eq!(status, Status::Ok);
    let (_, second) = post(&client, "/api/seed-john", json!(null));

    assert_eq!(first["userId"], 1);
    assert_eq!(second["userId"], 1);

    let first_board = first["board"]["Postboard_ID"].as_i64().expect("board id");
    let second_board = second["board"]["Postboard_ID"].as_i64().expect("board id");
    assert_ne!(first_board, second_board);

    assert_eq!(first["posts"].as_array().map(Vec::len), Some(3));
    assert_eq!(post_count(&client, first_board), 3);
    assert_eq!(post_count(&client, second_board), 3);
}

#[test]
fn errors_are_json() {
    let (_dir, client) = client();

    let (status, body) = get(&client, "/api/nowhere");
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["success"], false);
}

#[test]
fn single_post_and_users() {
    let (_dir, client) = client();

    let (status, body) = get(&client, "/api/posts/101");
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["success"], false);

    let (_, users) = get(&client, "/api/users");
    assert_eq!(users, json!([]));

    let (_, seeded) = post(&client, "/api/seed-john", json!(null));
    let first = &seeded["posts"][0];

    let (status, one) = get(&client, "/api/posts/101");
    assert_eq!(status, Status::Ok);
    assert_eq!(&one, first);

    let (status, users) = get(&client, "/api/users");
    assert_eq!(status, Status::Ok);
    assert_eq!(users, json!([{ "User_ID": 1, "email": "john@ucmerced.edu" }]));
}
