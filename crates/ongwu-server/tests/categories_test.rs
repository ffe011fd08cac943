//! Tests de endpoints de categorias.

mod helpers;

use axum::http::StatusCode;
use helpers::{app, register_user};
use serde_json::json;

#[tokio::test]
async fn categories_require_authentication() {
    let client = app();

    client
        .get("/api/categories")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_list_round_trip() {
    let client = app();
    let token = register_user(&client, "alice").await;

    let created = client
        .post_json_auth(
            "/api/categories",
            &token,
            json!({ "name": "Work", "description": "projects" }),
        )
        .await;
    created.assert_status(StatusCode::OK);
    assert_eq!(created.json()["category"]["name"], "Work");

    let list = client.get_auth("/api/categories", &token).await;
    list.assert_status(StatusCode::OK);
    let body = list.json();
    assert_eq!(body["categories"].as_array().unwrap().len(), 1);
    assert_eq!(body["categories"][0]["description"], "projects");
}

#[tokio::test]
async fn create_rejects_blank_names() {
    let client = app();
    let token = register_user(&client, "alice").await;

    client
        .post_json_auth("/api/categories", &token, json!({ "name": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_changes_name_and_sort_order() {
    let client = app();
    let token = register_user(&client, "alice").await;

    let a = client
        .post_json_auth("/api/categories", &token, json!({ "name": "Alpha" }))
        .await;
    let b = client
        .post_json_auth("/api/categories", &token, json!({ "name": "Beta" }))
        .await;
    let a_id = a.json()["category"]["id"].as_i64().unwrap();
    let b_id = b.json()["category"]["id"].as_i64().unwrap();

    // Beta primero via sort order
    client
        .put_json_auth(
            &format!("/api/categories/{}", b_id),
            &token,
            json!({ "name": "Beta", "sortOrder": 1 }),
        )
        .await
        .assert_status(StatusCode::OK);
    client
        .put_json_auth(
            &format!("/api/categories/{}", a_id),
            &token,
            json!({ "name": "Alpha renamed", "sortOrder": 2 }),
        )
        .await
        .assert_status(StatusCode::OK);

    let list = client.get_auth("/api/categories", &token).await;
    let categories = list.json()["categories"].as_array().unwrap().clone();
    assert_eq!(categories[0]["name"], "Beta");
    assert_eq!(categories[1]["name"], "Alpha renamed");
}

#[tokio::test]
async fn update_of_missing_category_is_404() {
    let client = app();
    let token = register_user(&client, "alice").await;

    client
        .put_json_auth("/api/categories/42", &token, json!({ "name": "x" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_category_and_unlinks_notes() {
    let client = app();
    let token = register_user(&client, "alice").await;

    let category = client
        .post_json_auth("/api/categories", &token, json!({ "name": "Temp" }))
        .await;
    let category_id = category.json()["category"]["id"].as_i64().unwrap();

    client
        .post_json_auth(
            "/api/notes",
            &token,
            json!({ "title": "inside", "categoryId": category_id }),
        )
        .await
        .assert_status(StatusCode::OK);

    // La lista cacheada ve la nota con nombre de categoria
    let before = client.get_auth("/api/notes", &token).await;
    assert_eq!(before.json()["notes"][0]["categoryName"], "Temp");

    client
        .delete_auth(&format!("/api/categories/{}", category_id), &token)
        .await
        .assert_status(StatusCode::OK);

    // El borrado invalida tambien el cache de notas: el nombre ya no
    // resuelve
    let after = client.get_auth("/api/notes", &token).await;
    assert_eq!(after.json()["notes"][0]["categoryName"], serde_json::Value::Null);

    let list = client.get_auth("/api/categories", &token).await;
    assert!(list.json()["categories"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn users_cannot_touch_each_others_categories() {
    let client = app();
    let alice = register_user(&client, "alice").await;
    let bob = register_user(&client, "bob").await;

    let created = client
        .post_json_auth("/api/categories", &alice, json!({ "name": "private" }))
        .await;
    let id = created.json()["category"]["id"].as_i64().unwrap();

    client
        .delete_auth(&format!("/api/categories/{}", id), &bob)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
