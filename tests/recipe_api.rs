mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use common::{
    create_ingredient, create_recipe, create_tag, register_and_token, request_json,
    sample_recipe_payload, spawn_app,
};

async fn upload_multipart(
    router: &Router,
    uri: &str,
    token: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (StatusCode, Value) {
    let boundary = "recipeboxtestboundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn listing_requires_authentication() {
    let app = spawn_app().await;
    let (status, _) = request_json(&app.router, "GET", "/api/recipe/recipes/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lists_recipes_newest_first() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    create_recipe(&app.router, &token, sample_recipe_payload("first")).await;
    create_recipe(&app.router, &token, sample_recipe_payload("second")).await;

    let (status, body) =
        request_json(&app.router, "GET", "/api/recipe/recipes/", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[tokio::test]
async fn recipes_limited_to_authenticated_user() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let other_token = register_and_token(&app.router, "hillergon@bara.com", "password34556").await;

    create_recipe(&app.router, &other_token, sample_recipe_payload("theirs")).await;
    create_recipe(&app.router, &token, sample_recipe_payload("mine")).await;

    let (status, body) =
        request_json(&app.router, "GET", "/api/recipe/recipes/", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let recipes = body.as_array().unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0]["title"], "mine");
}

#[tokio::test]
async fn other_users_recipe_detail_is_not_found() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let other_token = register_and_token(&app.router, "hillergon@bara.com", "password34556").await;

    let theirs = create_recipe(&app.router, &other_token, sample_recipe_payload("theirs")).await;
    let uri = format!("/api/recipe/recipes/{}", theirs["id"]);

    let (status, _) = request_json(&app.router, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_recipe_with_relations() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let tag_id = create_tag(&app.router, &token, "dinner").await;
    let ingredient_id = create_ingredient(&app.router, &token, "maize flour").await;

    let body = create_recipe(
        &app.router,
        &token,
        json!({
            "title": "ugali",
            "timeMinutes": 10,
            "price": 20.0,
            "link": "https://example.com/ugali",
            "tags": [tag_id],
            "ingredients": [ingredient_id]
        }),
    )
    .await;

    assert_eq!(body["title"], "ugali");
    assert_eq!(body["timeMinutes"], 10);
    assert_eq!(body["link"], "https://example.com/ugali");
    // Create responds with bare id references.
    assert_eq!(body["tags"], json!([tag_id]));
    assert_eq!(body["ingredients"], json!([ingredient_id]));
}

#[tokio::test]
async fn create_recipe_rejects_foreign_tag_ids() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let other_token = register_and_token(&app.router, "hillergon@bara.com", "password34556").await;
    let foreign_tag = create_tag(&app.router, &other_token, "not yours").await;

    let (status, _) = request_json(
        &app.router,
        "POST",
        "/api/recipe/recipes/",
        Some(&token),
        Some(json!({ "title": "ugali", "timeMinutes": 10, "price": 20.0, "tags": [foreign_tag] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_recipe_rejects_empty_title() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;

    let (status, _) = request_json(
        &app.router,
        "POST",
        "/api/recipe/recipes/",
        Some(&token),
        Some(json!({ "title": "", "timeMinutes": 10, "price": 20.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn detail_expands_tags_and_ingredients() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let tag_id = create_tag(&app.router, &token, "supper").await;
    let ingredient_id = create_ingredient(&app.router, &token, "beef").await;

    let created = create_recipe(
        &app.router,
        &token,
        json!({
            "title": "nyama",
            "timeMinutes": 45,
            "price": 30.0,
            "tags": [tag_id],
            "ingredients": [ingredient_id]
        }),
    )
    .await;

    let uri = format!("/api/recipe/recipes/{}", created["id"]);
    let (status, body) = request_json(&app.router, "GET", &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], json!([{ "id": tag_id, "name": "supper" }]));
    assert_eq!(
        body["ingredients"],
        json!([{ "id": ingredient_id, "name": "beef" }])
    );

    // The list representation keeps bare id references.
    let (_, list) =
        request_json(&app.router, "GET", "/api/recipe/recipes/", Some(&token), None).await;
    assert_eq!(list[0]["tags"], json!([tag_id]));
    assert_eq!(list[0]["ingredients"], json!([ingredient_id]));
}

#[tokio::test]
async fn patch_replaces_tag_set() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let old_tag = create_tag(&app.router, &token, "lunch").await;
    let new_tag = create_tag(&app.router, &token, "brunch").await;

    let created = create_recipe(
        &app.router,
        &token,
        json!({ "title": "chapati", "timeMinutes": 20, "price": 4.0, "tags": [old_tag] }),
    )
    .await;
    let uri = format!("/api/recipe/recipes/{}", created["id"]);

    let (status, body) = request_json(
        &app.router,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "tags": [new_tag] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], json!([{ "id": new_tag, "name": "brunch" }]));
    // Untouched fields survive a partial update.
    assert_eq!(body["title"], "chapati");
    assert_eq!(body["timeMinutes"], 20);
}

#[tokio::test]
async fn patch_without_tags_leaves_relations_alone() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let tag_id = create_tag(&app.router, &token, "lunch").await;

    let created = create_recipe(
        &app.router,
        &token,
        json!({ "title": "chapati", "timeMinutes": 20, "price": 4.0, "tags": [tag_id] }),
    )
    .await;
    let uri = format!("/api/recipe/recipes/{}", created["id"]);

    let (status, body) = request_json(
        &app.router,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "title": "chapo" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "chapo");
    assert_eq!(body["tags"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn put_replaces_all_fields_and_clears_omitted_relations() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let tag_id = create_tag(&app.router, &token, "lunch").await;

    let created = create_recipe(
        &app.router,
        &token,
        json!({
            "title": "pilau",
            "timeMinutes": 60,
            "price": 12.0,
            "link": "https://example.com/pilau",
            "tags": [tag_id]
        }),
    )
    .await;
    let uri = format!("/api/recipe/recipes/{}", created["id"]);

    let (status, body) = request_json(
        &app.router,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "title": "plain rice", "timeMinutes": 25, "price": 6.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "plain rice");
    assert_eq!(body["timeMinutes"], 25);
    assert_eq!(body["link"], Value::Null);
    assert_eq!(body["tags"], json!([]));
    assert_eq!(body["ingredients"], json!([]));
}

#[tokio::test]
async fn upload_image_stores_file_and_returns_path() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let created = create_recipe(&app.router, &token, sample_recipe_payload("ugali")).await;
    let uri = format!("/api/recipe/recipes/{}/upload-image", created["id"]);

    let (status, body) = upload_multipart(
        &app.router,
        &uri,
        &token,
        "myimage.jpg",
        "image/jpeg",
        b"fake jpeg bytes",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let image = body["image"].as_str().expect("image path missing");
    assert!(image.starts_with("uploads/recipe/"));
    assert!(image.ends_with(".jpg"));

    let stored = app.media_root.path().join(image);
    assert_eq!(std::fs::read(stored).unwrap(), b"fake jpeg bytes");
}

#[tokio::test]
async fn upload_rejects_non_image_payload() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let created = create_recipe(&app.router, &token, sample_recipe_payload("ugali")).await;
    let uri = format!("/api/recipe/recipes/{}/upload-image", created["id"]);

    let (status, _) = upload_multipart(
        &app.router,
        &uri,
        &token,
        "notimage.txt",
        "text/plain",
        b"definitely not an image",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_to_other_users_recipe_is_not_found() {
    let app = spawn_app().await;
    let token = register_and_token(&app.router, "kangogo@baratel.com", "mypassword").await;
    let other_token = register_and_token(&app.router, "hillergon@bara.com", "password34556").await;
    let theirs = create_recipe(&app.router, &other_token, sample_recipe_payload("theirs")).await;
    let uri = format!("/api/recipe/recipes/{}/upload-image", theirs["id"]);

    let (status, _) = upload_multipart(
        &app.router,
        &uri,
        &token,
        "myimage.jpg",
        "image/jpeg",
        b"fake jpeg bytes",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
