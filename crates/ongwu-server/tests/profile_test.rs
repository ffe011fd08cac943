//! Tests del perfil de usuario.

mod helpers;

use axum::http::StatusCode;
use helpers::{app, register_user};
use serde_json::json;

#[tokio::test]
async fn profile_returns_user_without_password_hash() {
    let client = app();
    let token = register_user(&client, "alice").await;

    let response = client.get_auth("/api/user/profile", &token).await;

    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn update_requires_correct_current_password() {
    let client = app();
    let token = register_user(&client, "alice").await;

    let response = client
        .put_json_auth(
            "/api/user/profile",
            &token,
            json!({ "username": "alice", "oldPassword": "wrong" }),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_change_applies_to_next_login() {
    let client = app();
    let token = register_user(&client, "alice").await;

    client
        .put_json_auth(
            "/api/user/profile",
            &token,
            json!({
                "username": "alice",
                "oldPassword": "hunter42",
                "newPassword": "different-password",
            }),
        )
        .await
        .assert_status(StatusCode::OK);

    client
        .post_json(
            "/api/auth/login",
            json!({ "username": "alice", "password": "hunter42" }),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    client
        .post_json(
            "/api/auth/login",
            json!({ "username": "alice", "password": "different-password" }),
        )
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn rename_rejects_taken_usernames() {
    let client = app();
    register_user(&client, "bob").await;
    let token = register_user(&client, "alice").await;

    let response = client
        .put_json_auth(
            "/api/user/profile",
            &token,
            json!({ "username": "bob", "oldPassword": "hunter42" }),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn short_new_password_is_rejected() {
    let client = app();
    let token = register_user(&client, "alice").await;

    let response = client
        .put_json_auth(
            "/api/user/profile",
            &token,
            json!({
                "username": "alice",
                "oldPassword": "hunter42",
                "newPassword": "abc",
            }),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
