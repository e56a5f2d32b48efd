mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::{location, set_cookie, TestApp, ADMIN_PASSWORD, ADMIN_USER};

#[tokio::test]
async fn admin_pages_redirect_to_login_without_session() -> Result<()> {
    let app = TestApp::spawn().await?;

    for path in ["/", "/Post", "/Post/1", "/password", "/api/schema/Post"] {
        let resp = app.get(path).await?;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(location(&resp).as_deref(), Some("/login"), "{}", path);
    }

    let resp = app.post_form("/dt/Post", &[("draw", "1")]).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    Ok(())
}

#[tokio::test]
async fn failed_login_flashes_reason_once() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.create_admin().await?;

    let resp = app.login("nobody", "whatever", false).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    assert_eq!(set_cookie(&resp, "reason").as_deref(), Some("username"));
    assert_eq!(set_cookie(&resp, "username").as_deref(), Some("nobody"));
    assert!(set_cookie(&resp, "password").is_none());

    let page = app.get("/login").await?.text().await?;
    assert!(page.contains("No account with that username"));
    assert!(page.contains("value=\"nobody\""));

    // shown once
    let page = app.get("/login").await?.text().await?;
    assert!(!page.contains("alert-danger"));

    let resp = app.login(ADMIN_USER, "wrong", false).await?;
    assert_eq!(set_cookie(&resp, "reason").as_deref(), Some("password"));
    let page = app.get("/login").await?.text().await?;
    assert!(page.contains("Wrong password"));
    Ok(())
}

#[tokio::test]
async fn login_sets_session_and_opens_dashboard() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.create_admin().await?;

    let resp = app.login(ADMIN_USER, ADMIN_PASSWORD, false).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    let cookie = resp.cookies().find(|c| c.name() == "token").expect("session cookie");
    assert!(cookie.http_only());
    assert_eq!(cookie.max_age(), Some(std::time::Duration::from_secs(3600)));

    let resp = app.get("/").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = resp.text().await?;
    assert!(page.contains("href=\"/Post\">Posts</a>"));
    assert!(page.contains("<span class=\"count\">4</span>"));
    assert!(page.contains(ADMIN_USER));

    // already signed in
    let resp = app.get("/login").await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    Ok(())
}

#[tokio::test]
async fn remember_me_extends_the_session() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.create_admin().await?;

    let resp = app.login(ADMIN_USER, ADMIN_PASSWORD, true).await?;
    let token = resp.cookies().find(|c| c.name() == "token").expect("session cookie");
    assert_eq!(token.max_age(), Some(std::time::Duration::from_secs(3600 * 24 * 30)));
    assert_eq!(set_cookie(&resp, "remember_me").as_deref(), Some("on"));
    Ok(())
}

#[tokio::test]
async fn plain_login_forgets_remember_me() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.create_admin().await?;
    app.login(ADMIN_USER, ADMIN_PASSWORD, true).await?;

    let resp = app.login(ADMIN_USER, ADMIN_PASSWORD, false).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let remember = resp
        .cookies()
        .find(|c| c.name() == "remember_me")
        .expect("remember_me removal");
    assert_eq!(remember.value(), "");
    assert_eq!(remember.max_age(), Some(std::time::Duration::ZERO));

    let token = resp.cookies().find(|c| c.name() == "token").expect("session cookie");
    assert_eq!(token.max_age(), Some(std::time::Duration::from_secs(3600)));
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_session() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app.get("/logout").await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/login"));

    let resp = app.get("/").await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    Ok(())
}

#[tokio::test]
async fn first_admin_registration() -> Result<()> {
    let app = TestApp::spawn().await?;

    let resp = app.get("/reg").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await?.contains("Create the first admin"));

    let resp = app
        .post_form(
            "/reg",
            &[("username", "root"), ("password", "abc"), ("confirm_password", "abd")],
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await?.contains("Passwords do not match"));

    let resp = app
        .post_form(
            "/reg",
            &[("username", "root"), ("password", "abc"), ("confirm_password", "abc")],
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/"));
    assert_eq!(app.get("/").await?.status(), StatusCode::OK);

    // closed once a user exists
    let resp = app.get("/reg").await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    let resp = app
        .post_form(
            "/reg",
            &[("username", "second"), ("password", "x"), ("confirm_password", "x")],
        )
        .await?;
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    assert!(app.state.users.find_by_username("second").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn password_change_requires_old_password_and_logs_out() -> Result<()> {
    let app = TestApp::signed_in().await?;

    let resp = app
        .post_form(
            "/password",
            &[("old_password", "nope"), ("new_password", "n1"), ("confirm_password", "n1")],
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await?.contains("Current password is wrong"));

    let resp = app
        .post_form(
            "/password",
            &[
                ("old_password", ADMIN_PASSWORD),
                ("new_password", "n1"),
                ("confirm_password", "n2"),
            ],
        )
        .await?;
    assert!(resp.text().await?.contains("New passwords do not match"));

    let resp = app
        .post_form(
            "/password",
            &[
                ("old_password", ADMIN_PASSWORD),
                ("new_password", "n1"),
                ("confirm_password", "n1"),
            ],
        )
        .await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    assert_eq!(app.get("/").await?.status(), StatusCode::SEE_OTHER);

    let resp = app.login(ADMIN_USER, ADMIN_PASSWORD, false).await?;
    assert_eq!(location(&resp).as_deref(), Some("/login"));
    let resp = app.login(ADMIN_USER, "n1", false).await?;
    assert_eq!(location(&resp).as_deref(), Some("/"));
    Ok(())
}
