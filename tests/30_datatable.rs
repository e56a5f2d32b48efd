mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

// Post schema order: id, text, published, tags, user_id, created_at
const USER_ID_COLUMN: &str = "4";

#[tokio::test]
async fn form_encoded_page_with_badges() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app
        .post_form("/dt/Post", &[("draw", "7"), ("start", "0"), ("length", "2")])
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;

    assert_eq!(body["draw"], 7);
    assert_eq!(body["recordsTotal"], 4);
    assert_eq!(body["recordsFiltered"], 4);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(
        rows[0]["id"],
        "<a class=\"m-1 py-1 px-2 badge bg-blue-lt lead\" href=\"/Post/1\">1</a>"
    );
    assert_eq!(
        rows[0]["user_id"],
        "<a class=\"m-1 py-1 px-2 badge bg-blue-lt lead\" href=\"/User/1\">ada</a>"
    );
    assert_eq!(rows[0]["text"], "Hello world");
    assert_eq!(rows[0]["published"], true);
    assert_eq!(rows[0]["tags"], json!(["intro"]));
    Ok(())
}

#[tokio::test]
async fn short_last_page_counts_without_query() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app
        .post_form("/dt/Post", &[("draw", "2"), ("start", "3"), ("length", "10")])
        .await?;
    let body: Value = resp.json().await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["recordsTotal"], 4);
    Ok(())
}

#[tokio::test]
async fn reference_columns_sort_by_label() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app
        .post_form(
            "/dt/Post",
            &[
                ("draw", "1"),
                ("start", "0"),
                ("length", "10"),
                ("order[0][column]", USER_ID_COLUMN),
                ("order[0][dir]", "desc"),
            ],
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    let authors: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["user_id"].as_str().unwrap())
        .collect();

    // carol, brian, then ada's two posts by id
    assert!(authors[0].ends_with(">carol</a>"));
    assert!(authors[1].ends_with(">brian</a>"));
    assert!(authors[2].ends_with(">ada</a>"));
    assert!(body["data"][2]["id"].as_str().unwrap().contains("/Post/1\""));
    assert!(body["data"][3]["id"].as_str().unwrap().contains("/Post/3\""));
    Ok(())
}

#[tokio::test]
async fn json_body_and_reverse_relations() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app
        .client
        .post(app.url("/dt/User"))
        .json(&json!({ "draw": 3, "start": 0, "length": 1 }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["draw"], 3);
    assert_eq!(body["recordsTotal"], 3);

    let posts = body["data"][0]["posts"].as_str().unwrap();
    assert_eq!(
        posts,
        "<a class=\"m-1 py-1 px-2 badge bg-blue-lt lead\" href=\"/Post/1\">Hello world</a> \
         <a class=\"m-1 py-1 px-2 badge bg-blue-lt lead\" href=\"/Post/3\">Notes from the admin desk</a>"
    );
    assert!(body["data"][0].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn bad_requests_are_rejected() -> Result<()> {
    let app = TestApp::signed_in().await?;

    // User schema order: id, username, role, bio, posts
    let resp = app
        .post_form(
            "/dt/User",
            &[("draw", "1"), ("order[0][column]", "4"), ("order[0][dir]", "asc")],
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .post_form("/dt/User", &[("draw", "1"), ("order[0][column]", "42")])
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.post_form("/dt/Comment", &[("draw", "1")]).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}
