use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// 평가 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub order_id: i64,
    pub reviewer_id: i64,
    pub reviewee_id: i64,
    pub score: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

// 평가 + 작성자 이름
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ReviewView {
    pub id: i64,
    pub order_id: i64,
    pub reviewer_id: i64,
    pub reviewer_name: String,
    pub score: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// 평가 요약 (좋아요/싫어요 수)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RatingSummary {
    pub positive: i64,
    pub negative: i64,
}

impl RatingSummary {
    /// 긍정 평가 비율(%), 평가가 없으면 None
    pub fn percent(&self) -> Option<i64> {
        let total = self.positive + self.negative;
        if total == 0 {
            None
        } else {
            Some(self.positive * 100 / total)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RatingView {
    pub positive: i64,
    pub negative: i64,
    pub percent: Option<i64>,
}

impl From<RatingSummary> for RatingView {
    fn from(summary: RatingSummary) -> Self {
        Self {
            positive: summary.positive,
            negative: summary.negative,
            percent: summary.percent(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_score"))]
pub struct CreateReviewRequest {
    pub score: i16,
    #[validate(length(max = 1000, message = "평가 내용은 1000자 이하여야 합니다."))]
    #[serde(default)]
    pub comment: String,
}

fn validate_score(req: &CreateReviewRequest) -> Result<(), validator::ValidationError> {
    if req.score == 1 || req.score == -1 {
        Ok(())
    } else {
        Err(validator::ValidationError::new("score_must_be_plus_or_minus_one"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_none_without_reviews() {
        assert_eq!(RatingSummary::default().percent(), None);
    }

    #[test]
    fn percent_rounds_down() {
        let summary = RatingSummary { positive: 2, negative: 1 };
        assert_eq!(summary.percent(), Some(66));
    }

    #[test]
    fn score_must_be_plus_or_minus_one() {
        let ok = CreateReviewRequest { score: -1, comment: String::new() };
        assert!(ok.validate().is_ok());
        let bad = CreateReviewRequest { score: 5, comment: String::new() };
        assert!(bad.validate().is_err());
    }
}
