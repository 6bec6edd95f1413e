mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{
    create_test_class, create_test_course, create_test_student, create_test_teacher,
    create_test_user, fetch_class_capacity, unique_username,
};
use http_body_util::BodyExt;
use rollbook::config::cors::CorsConfig;
use rollbook::config::jwt::JwtConfig;
use rollbook::router::init_router;
use rollbook::state::AppState;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

fn setup_test_app(pool: PgPool) -> axum::Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
    };
    init_router(state)
}

async fn get_auth_token(pool: &PgPool, username: &str, password: &str) -> String {
    let app = setup_test_app(pool.clone());
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({ "username": username, "password": password })).unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    body["access_token"].as_str().unwrap().to_string()
}

async fn send_json(
    pool: &PgPool,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let app = setup_test_app(pool.clone());
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));

    let request = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            builder
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

struct Fixture {
    admin_token: String,
    class_id: Uuid,
    students: Vec<common::TestStudent>,
}

/// One admin, one class, and `student_count` students ready to enroll.
async fn setup_fixture(pool: &PgPool, max_students: i32, student_count: usize) -> Fixture {
    let mut tx = pool.begin().await.unwrap();

    let admin = create_test_user(&mut tx, &unique_username(), "adminpass1", "admin").await;
    let teacher = create_test_teacher(&mut tx, &unique_username(), "teacherpass1").await;
    let course_id = create_test_course(&mut tx).await;
    let class_id = create_test_class(&mut tx, course_id, teacher.teacher_id, max_students).await;

    let mut students = Vec::new();
    for _ in 0..student_count {
        students.push(create_test_student(&mut tx, &unique_username(), "studentpass1").await);
    }

    tx.commit().await.unwrap();

    let admin_token = get_auth_token(pool, &admin.username, &admin.password).await;

    Fixture {
        admin_token,
        class_id,
        students,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_enrollment_increments_counter(pool: PgPool) {
    let fx = setup_fixture(&pool, 30, 1).await;

    let (status, body) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(json!({
            "student_id": fx.students[0].student_id,
            "class_id": fx.class_id,
            "note": "first semester"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["note"], "first semester");
    assert_eq!(body["student_code"], fx.students[0].student_code);

    let (count, open) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 1);
    assert!(open);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollment_closes_registration_at_capacity(pool: PgPool) {
    let fx = setup_fixture(&pool, 2, 2).await;

    for student in &fx.students {
        let (status, _) = send_json(
            &pool,
            "POST",
            "/api/enrollments",
            &fx.admin_token,
            Some(json!({ "student_id": student.student_id, "class_id": fx.class_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (count, open) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 2);
    assert!(!open);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_enrollment_is_rejected(pool: PgPool) {
    let fx = setup_fixture(&pool, 30, 1).await;
    let payload = json!({ "student_id": fx.students[0].student_id, "class_id": fx.class_id });

    let (status, _) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already enrolled"));

    let (count, _) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_user_id_resolves_to_student(pool: PgPool) {
    let fx = setup_fixture(&pool, 30, 1).await;

    // Pass the student's *user* id; the service must resolve it to the
    // student record through the 1:1 link.
    let (status, body) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(json!({ "student_id": fx.students[0].user.id, "class_id": fx.class_id })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["student_id"].as_str().unwrap(),
        fx.students[0].student_id.to_string()
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_student_ref_is_not_found(pool: PgPool) {
    let fx = setup_fixture(&pool, 30, 0).await;

    let (status, _) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(json!({ "student_id": Uuid::new_v4(), "class_id": fx.class_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (count, _) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrolling_into_missing_class_is_not_found(pool: PgPool) {
    let fx = setup_fixture(&pool, 30, 1).await;

    let (status, _) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(json!({ "student_id": fx.students[0].student_id, "class_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_releases_seat_and_reopens(pool: PgPool) {
    let fx = setup_fixture(&pool, 1, 1).await;

    let (_, enrollment) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(json!({ "student_id": fx.students[0].student_id, "class_id": fx.class_id })),
    )
    .await;
    let enrollment_id = enrollment["id"].as_str().unwrap().to_string();

    let (count, open) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 1);
    assert!(!open);

    let (status, body) = send_json(
        &pool,
        "PUT",
        &format!("/api/enrollments/{}/status", enrollment_id),
        &fx.admin_token,
        Some(json!({ "status": "CANCELLED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let (count, open) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 0);
    assert!(open);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_twice_adjusts_counter_once(pool: PgPool) {
    let fx = setup_fixture(&pool, 5, 2).await;

    let mut enrollment_ids = Vec::new();
    for student in &fx.students {
        let (_, body) = send_json(
            &pool,
            "POST",
            "/api/enrollments",
            &fx.admin_token,
            Some(json!({ "student_id": student.student_id, "class_id": fx.class_id })),
        )
        .await;
        enrollment_ids.push(body["id"].as_str().unwrap().to_string());
    }

    let uri = format!("/api/enrollments/{}/status", enrollment_ids[0]);
    let cancel = json!({ "status": "CANCELLED" });

    send_json(&pool, "PUT", &uri, &fx.admin_token, Some(cancel.clone())).await;
    let (count, _) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 1);

    // Cancelling an already-cancelled enrollment is a no-op on the counter.
    let (status, _) = send_json(&pool, "PUT", &uri, &fx.admin_token, Some(cancel)).await;
    assert_eq!(status, StatusCode::OK);
    let (count, _) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_cancel_transitions_leave_counter_alone(pool: PgPool) {
    let fx = setup_fixture(&pool, 5, 1).await;

    let (_, enrollment) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(json!({ "student_id": fx.students[0].student_id, "class_id": fx.class_id })),
    )
    .await;
    let enrollment_id = enrollment["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &pool,
        "PUT",
        &format!("/api/enrollments/{}/status", enrollment_id),
        &fx.admin_token,
        Some(json!({ "status": "ACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ACTIVE");

    let (count, _) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_releases_seat_even_when_already_cancelled(pool: PgPool) {
    let fx = setup_fixture(&pool, 5, 2).await;

    let mut enrollment_ids = Vec::new();
    for student in &fx.students {
        let (_, body) = send_json(
            &pool,
            "POST",
            "/api/enrollments",
            &fx.admin_token,
            Some(json!({ "student_id": student.student_id, "class_id": fx.class_id })),
        )
        .await;
        enrollment_ids.push(body["id"].as_str().unwrap().to_string());
    }

    // Cancel first: counter 2 -> 1.
    send_json(
        &pool,
        "PUT",
        &format!("/api/enrollments/{}/status", enrollment_ids[0]),
        &fx.admin_token,
        Some(json!({ "status": "CANCELLED" })),
    )
    .await;
    let (count, _) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 1);

    // Delete the cancelled enrollment: the seat is released again,
    // regardless of status. 1 -> 0 even though the active enrollment
    // remains.
    let (status, _) = send_json(
        &pool,
        "DELETE",
        &format!("/api/enrollments/{}", enrollment_ids[0]),
        &fx.admin_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (count, open) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 0);
    assert!(open);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_floors_counter_at_zero(pool: PgPool) {
    let fx = setup_fixture(&pool, 5, 1).await;

    let (_, enrollment) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(json!({ "student_id": fx.students[0].student_id, "class_id": fx.class_id })),
    )
    .await;
    let enrollment_id = enrollment["id"].as_str().unwrap().to_string();

    send_json(
        &pool,
        "PUT",
        &format!("/api/enrollments/{}/status", enrollment_id),
        &fx.admin_token,
        Some(json!({ "status": "CANCELLED" })),
    )
    .await;

    let (status, _) = send_json(
        &pool,
        "DELETE",
        &format!("/api/enrollments/{}", enrollment_id),
        &fx.admin_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (count, _) = fetch_class_capacity(&pool, fx.class_id).await;
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_delete_enrollment(pool: PgPool) {
    let fx = setup_fixture(&pool, 5, 1).await;

    let (_, enrollment) = send_json(
        &pool,
        "POST",
        "/api/enrollments",
        &fx.admin_token,
        Some(json!({ "student_id": fx.students[0].student_id, "class_id": fx.class_id })),
    )
    .await;
    let enrollment_id = enrollment["id"].as_str().unwrap().to_string();

    let student = &fx.students[0];
    let student_token = get_auth_token(&pool, &student.user.username, &student.user.password).await;

    let (status, _) = send_json(
        &pool,
        "DELETE",
        &format!("/api/enrollments/{}", enrollment_id),
        &student_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_enrollments_by_student_and_class(pool: PgPool) {
    let fx = setup_fixture(&pool, 5, 2).await;

    for student in &fx.students {
        send_json(
            &pool,
            "POST",
            "/api/enrollments",
            &fx.admin_token,
            Some(json!({ "student_id": student.student_id, "class_id": fx.class_id })),
        )
        .await;
    }

    let (status, body) = send_json(
        &pool,
        "GET",
        &format!("/api/enrollments/student/{}", fx.students[0].student_id),
        &fx.admin_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send_json(
        &pool,
        "GET",
        &format!("/api/enrollments/class/{}", fx.class_id),
        &fx.admin_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}
