pub mod auth;
pub mod classes;
pub mod enrollments;
pub mod grades;
pub mod users;
