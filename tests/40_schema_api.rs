mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

#[tokio::test]
async fn schema_comes_in_success_envelope() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app.get("/api/schema/Post").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], true);

    let fields = &body["data"]["fields"];
    assert_eq!(body["data"]["entity"], "Post");
    assert_eq!(fields["text"]["widget"], "text-input");
    assert_eq!(fields["text"]["required"], true);
    assert_eq!(fields["published"]["widget"], "checkbox");
    assert_eq!(fields["created_at"]["required"], false);
    assert_eq!(fields["tags"]["widget"], "multi-select");

    // references stay deferred until asked for
    assert_eq!(fields["user_id"]["widget"], "select");
    assert_eq!(fields["user_id"]["reference_entity"], "User");
    assert_eq!(fields["user_id"]["options_source"], "deferred");
    assert_eq!(fields["user_id"]["options"], json!({}));
    Ok(())
}

#[tokio::test]
async fn materialize_fills_reference_options() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let body: Value = app
        .get("/api/schema/Post?materialize=true")
        .await?
        .json()
        .await?;
    let user_id = &body["data"]["fields"]["user_id"];
    assert_eq!(user_id["options_source"], "loaded");
    assert_eq!(
        user_id["options"],
        json!({ "1": "ada", "2": "brian", "3": "carol" })
    );

    // lists without a target have nothing to load
    let tags = &body["data"]["fields"]["tags"];
    assert_eq!(tags["options_source"], "deferred");
    Ok(())
}

#[tokio::test]
async fn enum_options_are_known_up_front() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let body: Value = app.get("/api/schema/User").await?.json().await?;
    let role = &body["data"]["fields"]["role"];
    assert_eq!(role["widget"], "select");
    assert_eq!(role["options_source"], "enum");
    assert_eq!(role["options"], json!({ "1": "reader", "2": "editor", "3": "admin" }));
    assert!(body["data"]["fields"].get("password").is_none());
    Ok(())
}
