//! End-to-end coverage of the `/api` router over an in-memory store.

use super::*;
use crate::adapters::MemoryStore;
use crate::config::Config;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(store: MemoryStore) -> Router {
    let config = Config::from_lookup(|_| None).expect("defaults are valid");
    api_router(Arc::new(AppState {
        store: Arc::new(store),
        config: Arc::new(config),
    }))
}

fn sample_app() -> Router {
    app_with(MemoryStore::with_sample_data())
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(middleware::USER_ID_HEADER, user)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value, user: Option<i64>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(middleware::USER_ID_HEADER, user.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn vote_body(target_id: i64, target_type: &str, vote_type: &str) -> Value {
    json!({ "targetId": target_id, "targetType": target_type, "voteType": vote_type })
}

fn question_body(title: &str) -> Value {
    json!({
        "title": title,
        "content": "Plenty of detail about what I tried so far.",
        "tags": ["rust", "axum"]
    })
}

//=========================================================================================
// Questions
//=========================================================================================

#[tokio::test]
async fn questions_are_listed_newest_first() {
    let app = sample_app();
    let (status, body) = send(&app, get_req("/api/questions")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let (_, page) = send(&app, get_req("/api/questions?limit=1&offset=1")).await;
    assert_eq!(page[0]["id"], 2);
    assert_eq!(page.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn search_and_tag_filters_narrow_the_list() {
    let app = sample_app();

    let (_, hits) = send(&app, get_req("/api/questions?search=jwt")).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(
        hits[0]["title"],
        "How to implement user authentication in React with JWT tokens?"
    );

    let (status, none) = send(&app, get_req("/api/questions?search=nonexistent-zzz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none, json!([]));

    let (_, css) = send(&app, get_req("/api/questions?tag=css")).await;
    assert_eq!(css.as_array().unwrap().len(), 1);
    assert_eq!(css[0]["answerCount"], 1);
    assert_eq!(css[0]["accepted"], true);
}

#[tokio::test]
async fn reading_a_question_counts_a_view() {
    let app = sample_app();
    let (status, first) = send(&app, get_req("/api/questions/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["views"], 128);

    let (_, second) = send(&app, get_req("/api/questions/1")).await;
    assert_eq!(second["views"], 129);
}

#[tokio::test]
async fn unknown_question_is_404() {
    let app = sample_app();
    let (status, body) = send(&app, get_req("/api/questions/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("999"));

    let (status, _) = send(&app, get_req("/api/questions/999/answers")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn offsets_past_the_end_give_an_empty_page() {
    let app = sample_app();
    let uri = format!("/api/questions?offset={}", usize::MAX);
    let (status, body) = send(&app, get_req(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn malformed_ids_and_query_strings_get_a_json_400() {
    let app = sample_app();

    for uri in [
        "/api/questions/abc",
        "/api/questions/abc/answers",
        "/api/users/abc",
        "/api/questions?limit=-1",
        "/api/tags?popular=maybe",
    ] {
        let (status, body) = send(&app, get_req(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["message"].is_string(), "{} returned {}", uri, body);
    }

    let (status, body) = send(&app, post_json("/api/answers/x/accept", json!({}), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn asking_a_question_uses_the_caller_identity() {
    let app = sample_app();

    let (status, created) = send(
        &app,
        post_json("/api/questions", question_body("How do extractors work?"), Some(3)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 4);
    assert_eq!(created["authorId"], 3);
    assert_eq!(created["votes"], 0);
    assert_eq!(created["tags"], json!(["rust", "axum"]));

    let (_, anonymous) = send(
        &app,
        post_json("/api/questions", question_body("Asked without any header"), None),
    )
    .await;
    assert_eq!(anonymous["authorId"], 1);
}

#[tokio::test]
async fn invalid_questions_are_rejected_with_400() {
    let app = sample_app();

    let (status, body) = send(
        &app,
        post_json("/api/questions", question_body("Too short"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Title"));

    let (status, _) = send(&app, post_json("/api/questions", json!({ "title": 5 }), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//=========================================================================================
// Answers
//=========================================================================================

#[tokio::test]
async fn answering_updates_the_answer_count_and_can_be_accepted() {
    let app = sample_app();
    let answer = json!({ "content": "Store the token in an httpOnly cookie." });

    let (status, created) =
        send(&app, post_json("/api/questions/1/answers", answer, Some(2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["questionId"], 1);
    assert_eq!(created["authorId"], 2);
    assert_eq!(created["accepted"], false);

    let (_, question) = send(&app, get_req("/api/questions/1")).await;
    assert_eq!(question["answerCount"], 1);

    let answer_id = created["id"].as_i64().unwrap();
    let (status, accepted) = send(
        &app,
        post_json(&format!("/api/answers/{}/accept", answer_id), json!({}), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["accepted"], true);

    let (_, answers) = send(&app, get_req("/api/questions/1/answers")).await;
    assert_eq!(answers.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn answering_a_missing_question_is_404() {
    let app = sample_app();
    let answer = json!({ "content": "This answer has nowhere to go." });
    let (status, _) = send(&app, post_json("/api/questions/77/answers", answer, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/api/answers/77/accept", json!({}), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//=========================================================================================
// Votes
//=========================================================================================

#[tokio::test]
async fn votes_toggle_and_switch() {
    let app = sample_app();

    let (status, up) =
        send(&app, post_json("/api/votes", vote_body(1, "question", "up"), Some(2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(up["outcome"], "created");
    assert_eq!(up["votes"], 16);
    assert_eq!(up["vote"]["voteType"], "up");
    assert_eq!(up["question"]["votes"], 16);

    let (status, removed) =
        send(&app, post_json("/api/votes", vote_body(1, "question", "up"), Some(2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["outcome"], "removed");
    assert_eq!(removed["message"], "Vote removed");
    assert_eq!(removed["votes"], 15);
    assert_eq!(removed["vote"], Value::Null);

    send(&app, post_json("/api/votes", vote_body(1, "question", "up"), Some(2))).await;
    let (status, switched) =
        send(&app, post_json("/api/votes", vote_body(1, "question", "down"), Some(2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(switched["outcome"], "switched");
    assert_eq!(switched["votes"], 14);
}

#[tokio::test]
async fn answer_votes_report_the_answer() {
    let app = sample_app();
    let (_, voted) =
        send(&app, post_json("/api/votes", vote_body(1, "answer", "down"), None)).await;
    assert_eq!(voted["votes"], -1);
    assert_eq!(voted["answer"]["id"], 1);
    assert_eq!(voted["question"], Value::Null);
}

#[tokio::test]
async fn bad_votes_are_rejected() {
    let app = sample_app();

    let (status, _) =
        send(&app, post_json("/api/votes", vote_body(99, "question", "up"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        send(&app, post_json("/api/votes", vote_body(1, "comment", "up"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("comment"));

    let (status, _) = send(&app, post_json("/api/votes", json!({ "targetId": 1 }), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn two_users_voting_cancel_out_then_answer_is_accepted() {
    let app = app_with(MemoryStore::new());

    let (_, question) = send(
        &app,
        post_json("/api/questions", question_body("A question for the scenario"), Some(1)),
    )
    .await;
    assert_eq!(question["votes"], 0);
    assert_eq!(question["views"], 0);
    assert_eq!(question["answerCount"], 0);
    let id = question["id"].as_i64().unwrap();

    let (_, after_a) =
        send(&app, post_json("/api/votes", vote_body(id, "question", "up"), Some(10))).await;
    assert_eq!(after_a["votes"], 1);
    let (_, after_b) =
        send(&app, post_json("/api/votes", vote_body(id, "question", "down"), Some(11))).await;
    assert_eq!(after_b["votes"], 0);

    let answer = json!({ "content": "An answer from a third user." });
    let (_, created) = send(
        &app,
        post_json(&format!("/api/questions/{}/answers", id), answer, Some(12)),
    )
    .await;
    let (_, listed) = send(&app, get_req("/api/questions")).await;
    assert_eq!(listed[0]["answerCount"], 1);

    let (_, accepted) = send(
        &app,
        post_json(&format!("/api/answers/{}/accept", created["id"]), json!({}), None),
    )
    .await;
    assert_eq!(accepted["accepted"], true);
}

//=========================================================================================
// Tags, Users, Identity and Statistics
//=========================================================================================

#[tokio::test]
async fn tags_can_be_listed_or_ranked() {
    let app = sample_app();

    let (_, all) = send(&app, get_req("/api/tags")).await;
    assert_eq!(all.as_array().unwrap().len(), 5);
    assert_eq!(all[0]["name"], "javascript");

    let (_, popular) = send(&app, get_req("/api/tags?popular=true&limit=2")).await;
    let names: Vec<&str> = popular
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["javascript", "react"]);
    assert_eq!(popular[0]["useCount"], 150);
}

#[tokio::test]
async fn new_questions_feed_tag_use_counts() {
    let app = sample_app();
    send(&app, post_json("/api/questions", question_body("Tags should be counted"), None)).await;

    let (_, tags) = send(&app, get_req("/api/tags")).await;
    let rust = tags
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "rust")
        .expect("tag created on first use");
    assert_eq!(rust["useCount"], 1);
}

#[tokio::test]
async fn users_can_register_once() {
    let app = sample_app();
    let body = json!({ "username": "ferris", "email": "ferris@example.com" });

    let (status, user) = send(&app, post_json("/api/users", body.clone(), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["id"], 5);
    assert_eq!(user["role"], "user");
    assert_eq!(user["reputation"], 0);

    let (status, _) = send(&app, post_json("/api/users", body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, users) = send(&app, get_req("/api/users")).await;
    assert_eq!(users.as_array().unwrap().len(), 5);

    let (status, admin) = send(&app, get_req("/api/users/4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(admin["role"], "admin");
}

#[tokio::test]
async fn a_users_questions_are_listed_on_their_profile() {
    let app = sample_app();
    let second = question_body("A second question by Alice");
    send(&app, post_json("/api/questions", second, Some(2))).await;

    let (status, body) = send(&app, get_req("/api/users/2/questions")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 4]);
    assert!(body.as_array().unwrap().iter().all(|q| q["authorId"] == 2));

    let (status, none) = send(&app, get_req("/api/users/4/questions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none, json!([]));

    let (status, _) = send(&app, get_req("/api/users/99/questions")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn current_user_requires_a_known_identity() {
    let app = sample_app();

    let (status, _) = send(&app, get_req("/api/auth/user")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, user) = send(&app, get_as("/api/auth/user", "1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["username"], "john_doe");

    let (status, _) = send(&app, get_as("/api/auth/user", "999")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_as("/api/auth/user", "not-a-number")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_reflect_the_store() {
    let app = sample_app();
    send(&app, post_json("/api/questions", question_body("Counted in today's stats"), None)).await;

    let (status, stats) = send(&app, get_req("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalQuestions"], 4);
    assert_eq!(stats["totalAnswers"], 1);
    assert_eq!(stats["activeUsers"], 4);
    assert!(stats["questionsToday"].as_i64().unwrap() >= 1);
}
