use rollbook::utils::password::hash_password;
#[allow(unused_imports)]
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Well-known role ids (must match the seed migration)
pub mod system_roles {
    use uuid::Uuid;
    pub const ADMIN: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000001);
    pub const TEACHER: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000002);
    pub const STUDENT: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000003);
}

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

#[allow(dead_code)]
pub struct TestStudent {
    pub user: TestUser,
    pub student_id: Uuid,
    pub student_code: String,
}

#[allow(dead_code)]
pub struct TestTeacher {
    pub user: TestUser,
    pub teacher_id: Uuid,
}

/// Create a test user with one role. `role` is "admin", "teacher" or
/// "student". Does not provision student/teacher records; use
/// `create_test_student` / `create_test_teacher` for those.
pub async fn create_test_user(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
    password: &str,
    role: &str,
) -> TestUser {
    let hashed = hash_password(password).unwrap();

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (username, email, password, full_name)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(username)
    .bind(format!("{}@test.com", username))
    .bind(&hashed)
    .bind("Test User")
    .fetch_one(&mut **tx)
    .await
    .unwrap();

    let role_id = match role {
        "admin" => system_roles::ADMIN,
        "teacher" => system_roles::TEACHER,
        "student" => system_roles::STUDENT,
        _ => panic!("Invalid role: {}", role),
    };

    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
        .bind(id)
        .bind(role_id)
        .execute(&mut **tx)
        .await
        .unwrap();

    TestUser {
        id,
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[allow(dead_code)]
pub async fn create_test_student(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
    password: &str,
) -> TestStudent {
    let user = create_test_user(tx, username, password, "student").await;
    let student_code = format!("STU{}", &Uuid::new_v4().simple().to_string()[..8]);

    let student_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO students (user_id, student_code) VALUES ($1, $2) RETURNING id",
    )
    .bind(user.id)
    .bind(&student_code)
    .fetch_one(&mut **tx)
    .await
    .unwrap();

    TestStudent {
        user,
        student_id,
        student_code,
    }
}

#[allow(dead_code)]
pub async fn create_test_teacher(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
    password: &str,
) -> TestTeacher {
    let user = create_test_user(tx, username, password, "teacher").await;
    let employee_code = format!("TCH{}", &Uuid::new_v4().simple().to_string()[..8]);

    let teacher_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO teachers (user_id, employee_code) VALUES ($1, $2) RETURNING id",
    )
    .bind(user.id)
    .bind(&employee_code)
    .fetch_one(&mut **tx)
    .await
    .unwrap();

    TestTeacher { user, teacher_id }
}

#[allow(dead_code)]
pub async fn create_test_course(tx: &mut Transaction<'_, Postgres>) -> Uuid {
    let code = format!("CRS{}", &Uuid::new_v4().simple().to_string()[..8]);

    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO courses (code, name, credits) VALUES ($1, $2, 3) RETURNING id",
    )
    .bind(&code)
    .bind("Test Course")
    .fetch_one(&mut **tx)
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn create_test_class(
    tx: &mut Transaction<'_, Postgres>,
    course_id: Uuid,
    teacher_id: Uuid,
    max_students: i32,
) -> Uuid {
    let code = format!("CLS{}", &Uuid::new_v4().simple().to_string()[..8]);

    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO classes (code, name, max_students, course_id, teacher_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(&code)
    .bind("Test Class")
    .bind(max_students)
    .bind(course_id)
    .bind(teacher_id)
    .fetch_one(&mut **tx)
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn fetch_class_capacity(pool: &PgPool, class_id: Uuid) -> (i32, bool) {
    sqlx::query_as::<_, (i32, bool)>(
        "SELECT current_students, is_registration_open FROM classes WHERE id = $1",
    )
    .bind(class_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn unique_username() -> String {
    format!("u{}", &Uuid::new_v4().simple().to_string()[..12])
}
