mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_class_and_school_news() {
    let app = TestApp::new().await;

    let (status, class_news) = app
        .post(
            "/api/news",
            &app.teacher,
            json!({ "title": "Quiz", "context": "Friday, chapter 3", "class_id": app.class.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(class_news["creator_id"], json!(app.teacher.id));

    let (status, _) = app
        .post(
            "/api/news",
            &app.manager,
            json!({ "title": "Open day", "context": "Saturday", "school_id": app.school.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/api/news", &app.student).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app.get("/api/news", &app.outsider).await;
    assert!(body.as_array().unwrap().is_empty());

    let uri = format!("/api/news/{}", class_news["id"].as_str().unwrap());
    let (status, _) = app.get(&uri, &app.outsider).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_news_scope_and_rights() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post(
            "/api/news",
            &app.manager,
            json!({
                "title": "Both",
                "context": "x",
                "school_id": app.school.id,
                "class_id": app.class.id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post("/api/news", &app.manager, json!({ "title": "None", "context": "x" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(
            "/api/news",
            &app.teacher,
            json!({ "title": "Open day", "context": "x", "school_id": app.school.id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_editing_news() {
    let app = TestApp::new().await;
    let (_, news) = app
        .post(
            "/api/news",
            &app.teacher,
            json!({ "title": "Quiz", "context": "Friday", "class_id": app.class.id }),
        )
        .await;
    let uri = format!("/api/news/{}", news["id"].as_str().unwrap());

    let (status, body) = app
        .patch(&uri, &app.manager, json!({ "context": "Monday" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Quiz");
    assert_eq!(body["context"], "Monday");

    let (status, _) = app.patch(&uri, &app.teacher, json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app.delete(&uri, &app.student).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&uri, &app.teacher).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, &app.student).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
