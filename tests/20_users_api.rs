mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn registration_returns_the_dto_without_password() {
    let app = common::test_app().await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/api/users",
        None,
        Some(common::sample_user("diego@example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_str().is_some());
    assert!(body["createdAt"].as_str().is_some());
    assert_eq!(body["email"], "diego@example.com");
    assert_eq!(body["status"], true);
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn registration_validates_the_payload() {
    let app = common::test_app().await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({ "email": "not-an-email", "height": 20 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let errors = body["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors.iter().map(|e| e["field"].as_str().unwrap()).collect();
    assert!(fields.contains(&"firstName"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"height"));
    assert!(fields.contains(&"password"));
    assert!(errors
        .iter()
        .any(|e| e["message"] == "email must be an email"));
    assert!(errors
        .iter()
        .any(|e| e["message"] == "height must not be less than 50"));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = common::test_app().await;
    common::register(&app, "diego@example.com").await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/api/users",
        None,
        Some(common::sample_user("DIEGO@example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["message"], "Error creating record");
}

#[tokio::test]
async fn listing_honors_limit_and_skip() {
    let app = common::test_app().await;
    for n in 0..3 {
        common::register(&app, &format!("user{}@example.com", n)).await;
    }

    let (status, all) = common::request(&app, "GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (status, page) =
        common::request(&app, "GET", "/api/users?limit=2&skip=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn show_rejects_malformed_and_unknown_ids() {
    let app = common::test_app().await;

    let (status, body) = common::request(&app, "GET", "/api/users/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Record id is not valid");

    let ghost = Uuid::new_v4();
    let (status, body) =
        common::request(&app, "GET", &format!("/api/users/{}", ghost), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn update_requires_a_token() {
    let app = common::test_app().await;
    let user = common::register(&app, "diego@example.com").await;
    let id = user["id"].as_str().unwrap();

    let (status, _) = common::request(
        &app,
        "PATCH",
        &format!("/api/users/{}", id),
        None,
        Some(json!({ "height": 180 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_keeps_id_and_email_immutable() {
    let app = common::test_app().await;
    let (user, token) = common::register_and_login(&app, "diego@example.com").await;
    let id = user["id"].as_str().unwrap();

    for payload in [
        json!({ "email": "new@example.com" }),
        json!({ "id": Uuid::new_v4().to_string() }),
    ] {
        let (status, body) = common::request(
            &app,
            "PATCH",
            &format!("/api/users/{}", id),
            Some(&token),
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "You cannot update the id or email");
    }
}

#[tokio::test]
async fn update_changes_only_the_named_fields() {
    let app = common::test_app().await;
    let (user, token) = common::register_and_login(&app, "diego@example.com").await;
    let id = user["id"].as_str().unwrap();

    let (status, body) = common::request(
        &app,
        "PATCH",
        &format!("/api/users/{}", id),
        Some(&token),
        Some(json!({ "height": 180 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["height"], 180);
    assert_eq!(body["firstName"], "Diego");
    assert_eq!(body["email"], "diego@example.com");
}

#[tokio::test]
async fn update_validates_the_payload() {
    let app = common::test_app().await;
    let (user, token) = common::register_and_login(&app, "diego@example.com").await;
    let id = user["id"].as_str().unwrap();

    let (status, body) = common::request(
        &app,
        "PATCH",
        &format!("/api/users/{}", id),
        Some(&token),
        Some(json!({ "gender": "other" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"][0]["message"],
        "gender must be one of the following values: male, female"
    );
}

#[tokio::test]
async fn updated_password_is_stored_hashed() {
    let app = common::test_app().await;
    let (user, token) = common::register_and_login(&app, "diego@example.com").await;
    let id = user["id"].as_str().unwrap();

    let (status, _) = common::request(
        &app,
        "PATCH",
        &format!("/api/users/{}", id),
        Some(&token),
        Some(json!({ "password": "rotated456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, the new one does.
    let (old_status, _) = common::request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "diego@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(old_status, StatusCode::NOT_FOUND);
    common::login(&app, "diego@example.com", "rotated456").await;
}

#[tokio::test]
async fn disable_route_flips_status() {
    let app = common::test_app().await;
    let (user, token) = common::register_and_login(&app, "diego@example.com").await;
    let id = user["id"].as_str().unwrap();

    let (status, body) = common::request(
        &app,
        "PATCH",
        &format!("/api/users/disable/{}", id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], false);
}

#[tokio::test]
async fn delete_returns_the_final_state_and_removes_the_user() {
    let app = common::test_app().await;
    let (user, token) = common::register_and_login(&app, "diego@example.com").await;
    let id = user["id"].as_str().unwrap();

    let (status, body) = common::request(
        &app,
        "DELETE",
        &format!("/api/users/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "diego@example.com");

    let (status, _) =
        common::request(&app, "GET", &format!("/api/users/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
