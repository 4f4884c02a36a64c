mod common;

use agency_portal::database::models::Role;
use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn login_validates_before_touching_the_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "  " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["email"], "is required");
    assert_eq!(body["field_errors"]["password"], "is required");
    Ok(())
}

#[tokio::test]
async fn unknown_credentials_are_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "nobody@agency.test", "password": "definitely-wrong" }))
        .send()
        .await?;
    let status = res.status();
    assert!(common::reached_or_unavailable(status, StatusCode::UNAUTHORIZED), "got {}", status);

    if status == StatusCode::UNAUTHORIZED {
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "Invalid email or password");
    }
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/dashboard/summary")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing Authorization header");

    let res = client
        .get(server.url("/api/dashboard/summary"))
        .header(header::AUTHORIZATION, "Token abc")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn tokens_signed_elsewhere_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let forged = {
        let now = chrono::Utc::now().timestamp();
        let claims = agency_portal::auth::Claims {
            sub: uuid::Uuid::new_v4(),
            email: "mallory@agency.test".into(),
            role: Role::Admin,
            exp: now + 600,
            iat: now,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"some-other-secret"),
        )?
    };

    let res = reqwest::Client::new()
        .get(server.url("/api/users"))
        .header(header::AUTHORIZATION, format!("Bearer {}", forged))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn valid_tokens_pass_authentication() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .get(server.url("/api/dashboard/summary"))
        .header(header::AUTHORIZATION, common::bearer(Role::Staff).await?)
        .send()
        .await?;
    let status = res.status();
    assert!(common::reached_or_unavailable(status, StatusCode::OK), "got {}", status);
    Ok(())
}

#[tokio::test]
async fn deactivated_users_lose_access_immediately() -> Result<()> {
    if common::test_database_url().is_none() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let email = format!("leaver-{}@agency.test", uuid::Uuid::new_v4().simple());
    let client = reqwest::Client::new();

    let token = common::bearer_for(&email, Role::Admin, true).await?;
    let res = client
        .get(server.url("/api/auth/me"))
        .header(header::AUTHORIZATION, &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Same token, after the account is switched off
    common::bearer_for(&email, Role::Admin, false).await?;
    let res = client
        .get(server.url("/api/auth/me"))
        .header(header::AUTHORIZATION, &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Account is disabled");
    Ok(())
}
