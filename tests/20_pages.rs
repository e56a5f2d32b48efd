mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::{location, TestApp};

#[tokio::test]
async fn public_endpoints() -> Result<()> {
    let app = TestApp::spawn().await?;

    let resp = app.get("/health").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["entities"], 2);

    let resp = app.get("/favicon.ico").await?;
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        location(&resp).as_deref(),
        Some("/statics/placeholders/favicon.svg")
    );

    let resp = app.get("/statics/admin.css").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn index_page_lists_schema_columns() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app.get("/User").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = resp.text().await?;
    assert!(page.contains("data-source=\"/dt/User\""));
    assert!(page.contains("<th>Username</th>"));
    // hidden fields are not columns
    assert!(!page.contains("<th>Password</th>"));
    assert!(page.contains("{\"data\":\"posts\",\"orderable\":false}"));
    assert!(page.contains("{\"data\":\"role\",\"orderable\":true}"));
    Ok(())
}

#[tokio::test]
async fn unknown_entities_are_not_found() -> Result<()> {
    let app = TestApp::signed_in().await?;

    assert_eq!(app.get("/Comment").await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/Comment/1").await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/Post/99").await?.status(), StatusCode::NOT_FOUND);

    let resp = app.get("/api/schema/Comment").await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn edit_page_shows_current_values() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app.get("/Post/3").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = resp.text().await?;
    assert!(page.contains("Posts</a> #3"));
    assert!(page.contains("value=\"Notes from the admin desk\""));
    assert!(page.contains("data-entity=\"User\""));
    assert!(page.contains("<option value=\"1\" selected>ada</option>"));
    assert!(page.contains("<option value=\"2\">brian</option>"));
    assert!(page.contains("<option value=\"ops\" selected>ops</option>"));
    assert!(page.contains("<option value=\"notes\" selected>notes</option>"));
    Ok(())
}

#[tokio::test]
async fn edit_page_selects_reverse_relations_and_enums() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let page = app.get("/User/1").await?.text().await?;
    assert!(page.contains("<option value=\"1\" selected>Hello world</option>"));
    assert!(page.contains("<option value=\"3\" selected>Notes from the admin desk</option>"));
    assert!(page.contains("<option value=\"2\">Second thoughts on first posts</option>"));
    assert!(page.contains("<option value=\"3\" selected>admin</option>"));
    assert!(!page.contains("name=\"password\""));
    Ok(())
}
