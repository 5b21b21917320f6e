mod common;

use axum::http::StatusCode;
use classbook_models::{Role, User, UserId};
use common::{TestApp, seed_user};
use serde_json::json;

#[tokio::test]
async fn test_requests_without_valid_token_are_unauthorized() {
    let app = TestApp::new().await;

    let (status, body) = app.send("GET", "/api/classes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");

    let ghost = User {
        id: UserId::new(),
        ..app.teacher.clone()
    };
    let (status, _) = app.get("/api/classes", &ghost).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_manager_creates_and_renames_class() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/classes",
            &app.manager,
            json!({ "school_id": app.school.id, "name": "10A", "teacher_id": app.teacher.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "10A");
    let class_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .patch(
            &format!("/api/classes/{}", class_id),
            &app.manager,
            json!({ "name": "10B" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "10B");

    let (status, body) = app.get("/api/classes", &app.teacher).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = app
        .post(
            "/api/classes",
            &app.manager,
            json!({ "school_id": app.school.id, "name": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(
            "/api/classes",
            &app.teacher,
            json!({ "school_id": app.school.id, "name": "10C" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_teacher_manages_membership() {
    let app = TestApp::new().await;
    let uri = format!("/api/classes/{}", app.class.id);
    let outsider = json!({ "national_id": app.outsider.national_id });

    let (status, body) = app
        .post(&format!("{}/add-student", uri), &app.teacher, outsider.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "The student was added to this class.");

    let (status, _) = app
        .post(&format!("{}/add-student", uri), &app.teacher, outsider.clone())
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get(&format!("{}/students", uri), &app.teacher).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = app.get(&uri, &app.outsider).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(&format!("{}/remove-student", uri), &app.teacher, outsider.clone())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&uri, &app.outsider).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            &format!("{}/add-student", uri),
            &app.teacher,
            json!({ "national_id": "12345" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(&format!("{}/add-student", uri), &app.student, outsider)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_lessons_and_school_rosters() {
    let app = TestApp::new().await;
    let uri = format!("/api/classes/{}", app.class.id);

    let (status, body) = app
        .post(&format!("{}/add-lesson", uri), &app.manager, json!({ "name": " Biology " }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Biology");

    let (status, _) = app
        .post(&format!("{}/add-lesson", uri), &app.manager, json!({ "name": "Biology" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get(&format!("{}/lessons", uri), &app.student).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Biology");

    let school = format!("/api/schools/{}", app.school.id);
    let (status, body) = app.get(&format!("{}/students", school), &app.manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], json!(app.student.id));

    let (status, body) = app.get(&format!("{}/teachers", school), &app.manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], json!(app.teacher.id));

    let (status, _) = app.get(&format!("{}/lessons", school), &app.teacher).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deactivated_manager_cannot_delete_class() {
    let app = TestApp::new().await;
    let other_manager = seed_user(&app.store, "manager", Role::Manager).await;
    let uri = format!("/api/classes/{}", app.class.id);

    let (status, _) = app.delete(&uri, &other_manager).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    classbook_authz::Store::set_user_active(app.store.as_ref(), app.manager.id, false)
        .await
        .unwrap();
    let (status, _) = app.delete(&uri, &app.manager).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    classbook_authz::Store::set_user_active(app.store.as_ref(), app.manager.id, true)
        .await
        .unwrap();
    let (status, body) = app.delete(&uri, &app.manager).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.get(&uri, &app.teacher).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_school_visible_to_manager() {
    let app = TestApp::new().await;
    let uri = format!("/api/schools/{}", app.school.id);

    let (status, body) = app.get("/api/schools", &app.manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], json!(app.school.id));

    let (status, body) = app.get(&uri, &app.manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!(app.school.name));

    let (status, body) = app.get("/api/schools", &app.teacher).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = app.get(&uri, &app.student).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
