use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A grade, 1:1 with an enrollment. Component scores are optional;
/// `total_score` is derived and recomputed on every insert and update.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Grade {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub attendance_score: Option<Decimal>,
    pub midterm_score: Option<Decimal>,
    pub final_score: Option<Decimal>,
    pub total_score: Decimal,
    pub comment: Option<String>,
    pub graded_by: Option<Uuid>,
    pub graded_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateGradeRequest {
    pub enrollment_id: Uuid,
    pub attendance_score: Option<Decimal>,
    pub midterm_score: Option<Decimal>,
    pub final_score: Option<Decimal>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateGradeRequest {
    pub attendance_score: Option<Decimal>,
    pub midterm_score: Option<Decimal>,
    pub final_score: Option<Decimal>,
    pub comment: Option<String>,
}

/// Weighted total: attendance 20%, midterm 30%, final 50%. Missing
/// components count as zero. The result is rescaled to the 2-decimal
/// scale of the stored column.
pub fn compute_total_score(
    attendance: Option<Decimal>,
    midterm: Option<Decimal>,
    final_score: Option<Decimal>,
) -> Decimal {
    let attendance = attendance.unwrap_or(Decimal::ZERO);
    let midterm = midterm.unwrap_or(Decimal::ZERO);
    let final_score = final_score.unwrap_or(Decimal::ZERO);

    let total = attendance * Decimal::new(2, 1)
        + midterm * Decimal::new(3, 1)
        + final_score * Decimal::new(5, 1);

    total.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
