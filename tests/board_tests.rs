//! Board tests: post CRUD, pagination, search, and nested comments
//! through the authenticated API.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, setup};
use serde_json::json;

#[tokio::test]
async fn test_create_and_read_post() {
    let app = setup().await;
    let (access, _) = app.member("yoon1234", "password1234").await;

    let uuid = app.create_post(&access, "Hello board", "First post body").await;

    // Reading back is public.
    let response = app
        .request(Method::GET, &format!("/posts/{}", uuid), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Hello board");
    assert_eq!(body["content"], "First post body");
    assert_eq!(body["author"], "yoon1234");
}

#[tokio::test]
async fn test_create_post_requires_title() {
    let app = setup().await;
    let (access, _) = app.member("yoon1234", "password1234").await;

    let response = app
        .request(
            Method::POST,
            "/posts",
            Some(&access),
            Some(json!({ "title": "   ", "content": "body" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_author_can_update_or_delete() {
    let app = setup().await;
    let (author, _) = app.member("author", "password1234").await;
    let (other, _) = app.member("other", "password1234").await;

    let uuid = app.create_post(&author, "Mine", "body").await;
    let path = format!("/posts/{}", uuid);

    let response = app
        .request(
            Method::PUT,
            &path,
            Some(&other),
            Some(json!({ "title": "Taken over", "content": "nope" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.request(Method::DELETE, &path, Some(&other), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::PUT,
            &path,
            Some(&author),
            Some(json!({ "title": "Edited", "content": "updated body" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "Edited");

    let response = app.request(Method::DELETE, &path, Some(&author), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.request(Method::GET, &path, None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_can_delete_any_post() {
    let app = setup().await;
    let (author, _) = app.member("author", "password1234").await;
    app.signup("boss", "password1234", "Boss").await;

    sqlx::query("UPDATE members SET role = 'ROLE_ADMIN' WHERE username = 'boss'")
        .execute(app.db.pool())
        .await
        .unwrap();

    // Log in after promotion so the access token carries the admin role.
    let (_, body) = app.login("boss", "password1234").await;
    let admin = body["accessToken"].as_str().unwrap().to_string();

    let uuid = app.create_post(&author, "To be moderated", "body").await;
    let response = app
        .request(Method::DELETE, &format!("/posts/{}", uuid), Some(&admin), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_list_paginates_newest_first() {
    let app = setup().await;
    let (access, _) = app.member("yoon1234", "password1234").await;

    for i in 1..=5 {
        app.create_post(&access, &format!("Post {}", i), "body").await;
    }

    let response = app
        .request(Method::GET, "/posts?page=0&size=2", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);
    assert_eq!(body["posts"][0]["title"], "Post 5");

    let response = app
        .request(Method::GET, "/posts?page=2&size=2", None, None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["title"], "Post 1");
}

#[tokio::test]
async fn test_absurd_page_number_is_just_an_empty_page() {
    let app = setup().await;
    let (access, _) = app.member("yoon1234", "password1234").await;
    app.create_post(&access, "Only post", "body").await;

    let response = app
        .request(
            Method::GET,
            "/posts?page=92233720368547759&size=100",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["posts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let app = setup().await;
    let (access, _) = app.member("yoon1234", "password1234").await;

    app.create_post(&access, "Progress: 100%", "body").await;
    app.create_post(&access, "Plain title", "body").await;

    let response = app
        .request(Method::GET, "/posts?query=100%25", None, None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["posts"][0]["title"], "Progress: 100%");

    // A bare % must not match everything.
    let response = app.request(Method::GET, "/posts?query=%25", None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_comments_support_nested_replies() {
    let app = setup().await;
    let (access, _) = app.member("yoon1234", "password1234").await;

    let post = app.create_post(&access, "Discussion", "body").await;
    let comments_path = format!("/posts/{}/comments", post);

    let response = app
        .request(
            Method::POST,
            &comments_path,
            Some(&access),
            Some(json!({ "content": "Top level" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let top = body_json(response).await;

    let response = app
        .request(
            Method::POST,
            &comments_path,
            Some(&access),
            Some(json!({ "content": "A reply", "parentUuid": top["uuid"] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let reply = body_json(response).await;
    assert_eq!(reply["parentUuid"], top["uuid"]);

    // Listing is public and includes both.
    let response = app.request(Method::GET, &comments_path, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reply_must_target_comment_on_same_post() {
    let app = setup().await;
    let (access, _) = app.member("yoon1234", "password1234").await;

    let first = app.create_post(&access, "First", "body").await;
    let second = app.create_post(&access, "Second", "body").await;

    let response = app
        .request(
            Method::POST,
            &format!("/posts/{}/comments", first),
            Some(&access),
            Some(json!({ "content": "On the first post" })),
        )
        .await;
    let comment = body_json(response).await;

    let response = app
        .request(
            Method::POST,
            &format!("/posts/{}/comments", second),
            Some(&access),
            Some(json!({ "content": "Cross-post reply", "parentUuid": comment["uuid"] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_comment_author_can_delete() {
    let app = setup().await;
    let (author, _) = app.member("author", "password1234").await;
    let (other, _) = app.member("other", "password1234").await;

    let post = app.create_post(&author, "Post", "body").await;
    let response = app
        .request(
            Method::POST,
            &format!("/posts/{}/comments", post),
            Some(&author),
            Some(json!({ "content": "Mine" })),
        )
        .await;
    let comment = body_json(response).await;
    let path = format!("/comments/{}", comment["uuid"].as_str().unwrap());

    let response = app.request(Method::DELETE, &path, Some(&other), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.request(Method::DELETE, &path, Some(&author), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_profile_reflects_member_row() {
    let app = setup().await;
    let (access, _) = app.member("yoon1234", "password1234").await;

    let response = app
        .request(Method::GET, "/members/me", Some(&access), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "yoon1234");
    assert_eq!(body["nickname"], "yoon1234");
    assert_eq!(body["role"], "ROLE_MEMBER");
}
