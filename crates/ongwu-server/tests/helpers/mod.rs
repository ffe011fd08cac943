//! Shared test infrastructure.

pub mod client;

use std::sync::Arc;

use ongwu_db::MemoryStore;
use ongwu_server::AppState;
use ongwu_server::create_router;

use client::TestClient;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router completo sobre un MemoryStore vacio.
pub fn app() -> TestClient {
    let state = AppState::new(Arc::new(MemoryStore::new()), TEST_SECRET);
    TestClient::new(create_router(state))
}

/// Registra un usuario y retorna su token de sesion.
pub async fn register_user(client: &TestClient, username: &str) -> String {
    let response = client
        .post_json(
            "/api/auth/register",
            serde_json::json!({ "username": username, "password": "hunter42" }),
        )
        .await;

    response.assert_status(axum::http::StatusCode::OK);
    response
        .session_cookie()
        .expect("register should set the session cookie")
}
