mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{
    create_test_class, create_test_course, create_test_student, create_test_teacher,
    unique_username,
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
    teacher_token: String,
    student_token: String,
    student_id: Uuid,
    class_id: Uuid,
    enrollment_id: Uuid,
}

/// One teacher, one enrolled student.
async fn setup_fixture(pool: &PgPool) -> Fixture {
    let mut tx = pool.begin().await.unwrap();

    let teacher = create_test_teacher(&mut tx, &unique_username(), "teacherpass1").await;
    let student = create_test_student(&mut tx, &unique_username(), "studentpass1").await;
    let course_id = create_test_course(&mut tx).await;
    let class_id = create_test_class(&mut tx, course_id, teacher.teacher_id, 30).await;

    let enrollment_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO enrollments (student_id, class_id, status) VALUES ($1, $2, 'ACTIVE') RETURNING id",
    )
    .bind(student.student_id)
    .bind(class_id)
    .fetch_one(&mut *tx)
    .await
    .unwrap();

    tx.commit().await.unwrap();

    let teacher_token = get_auth_token(pool, &teacher.user.username, &teacher.user.password).await;
    let student_token = get_auth_token(pool, &student.user.username, &student.user.password).await;

    Fixture {
        teacher_token,
        student_token,
        student_id: student.student_id,
        class_id,
        enrollment_id,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_grade_computes_weighted_total(pool: PgPool) {
    let fx = setup_fixture(&pool).await;

    let (status, body) = send_json(
        &pool,
        "POST",
        "/api/grades",
        &fx.teacher_token,
        Some(json!({
            "enrollment_id": fx.enrollment_id,
            "attendance_score": "10",
            "midterm_score": "8",
            "final_score": "6"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    // 10*0.2 + 8*0.3 + 6*0.5 = 7.40
    assert_eq!(body["total_score"], "7.40");
    assert!(body["graded_by"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_missing_components_count_as_zero(pool: PgPool) {
    let fx = setup_fixture(&pool).await;

    let (status, body) = send_json(
        &pool,
        "POST",
        "/api/grades",
        &fx.teacher_token,
        Some(json!({
            "enrollment_id": fx.enrollment_id,
            "final_score": "8"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_score"], "4.00");
    assert!(body["attendance_score"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_grade_recomputes_total(pool: PgPool) {
    let fx = setup_fixture(&pool).await;

    let (_, grade) = send_json(
        &pool,
        "POST",
        "/api/grades",
        &fx.teacher_token,
        Some(json!({
            "enrollment_id": fx.enrollment_id,
            "attendance_score": "10",
            "midterm_score": "8",
            "final_score": "6"
        })),
    )
    .await;
    let grade_id = grade["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &pool,
        "PUT",
        &format!("/api/grades/{}", grade_id),
        &fx.teacher_token,
        Some(json!({ "final_score": "10" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // 10*0.2 + 8*0.3 + 10*0.5 = 9.40; untouched components persist
    assert_eq!(body["total_score"], "9.40");
    assert_eq!(body["attendance_score"], "10.00");
    assert!(body["updated_at"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_one_grade_per_enrollment(pool: PgPool) {
    let fx = setup_fixture(&pool).await;
    let payload = json!({ "enrollment_id": fx.enrollment_id, "final_score": "7" });

    let (status, _) = send_json(
        &pool,
        "POST",
        "/api/grades",
        &fx.teacher_token,
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        &pool,
        "POST",
        "/api/grades",
        &fx.teacher_token,
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already has a grade"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_grade_requires_existing_enrollment(pool: PgPool) {
    let fx = setup_fixture(&pool).await;

    let (status, _) = send_json(
        &pool,
        "POST",
        "/api/grades",
        &fx.teacher_token,
        Some(json!({ "enrollment_id": Uuid::new_v4(), "final_score": "7" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_record_grades(pool: PgPool) {
    let fx = setup_fixture(&pool).await;

    let (status, _) = send_json(
        &pool,
        "POST",
        "/api/grades",
        &fx.student_token,
        Some(json!({ "enrollment_id": fx.enrollment_id, "final_score": "10" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lookup_by_enrollment_student_and_class(pool: PgPool) {
    let fx = setup_fixture(&pool).await;

    send_json(
        &pool,
        "POST",
        "/api/grades",
        &fx.teacher_token,
        Some(json!({ "enrollment_id": fx.enrollment_id, "final_score": "9" })),
    )
    .await;

    let (status, body) = send_json(
        &pool,
        "GET",
        &format!("/api/grades/enrollment/{}", fx.enrollment_id),
        &fx.student_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_score"], "4.50");

    let (status, body) = send_json(
        &pool,
        "GET",
        &format!("/api/grades/student/{}", fx.student_id),
        &fx.student_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send_json(
        &pool,
        "GET",
        &format!("/api/grades/class/{}", fx.class_id),
        &fx.teacher_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}
