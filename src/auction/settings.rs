/// 경매 설정 (auction_settings 단일 행)
// region:    --- Imports
use crate::bidding::engine::BidPolicy;
use crate::config::AuctionDefaults;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use validator::Validate;

// endregion: --- Imports

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, Validate)]
pub struct AuctionSettings {
    #[validate(range(min = 0, max = 86400))]
    pub auto_extend_threshold_secs: i64,
    #[validate(range(min = 0, max = 86400))]
    pub auto_extend_duration_secs: i64,
    #[validate(range(min = 0, max = 100, message = "평가 기준은 0~100 사이여야 합니다."))]
    pub min_rating_percent: i64,
}

impl From<AuctionDefaults> for AuctionSettings {
    fn from(defaults: AuctionDefaults) -> Self {
        Self {
            auto_extend_threshold_secs: defaults.auto_extend_threshold_secs,
            auto_extend_duration_secs: defaults.auto_extend_duration_secs,
            min_rating_percent: defaults.min_rating_percent,
        }
    }
}

impl AuctionSettings {
    pub fn policy(&self) -> BidPolicy {
        BidPolicy {
            min_rating_percent: self.min_rating_percent,
            auto_extend_threshold: Duration::seconds(self.auto_extend_threshold_secs),
            auto_extend_duration: Duration::seconds(self.auto_extend_duration_secs),
        }
    }

    /// 저장된 설정, 없으면 기본값
    pub async fn load(
        conn: &mut PgConnection,
        defaults: AuctionDefaults,
    ) -> Result<Self, sqlx::Error> {
        let stored = sqlx::query_as::<_, AuctionSettings>(
            "SELECT auto_extend_threshold_secs, auto_extend_duration_secs, min_rating_percent
             FROM auction_settings WHERE id = 1",
        )
        .fetch_optional(conn)
        .await?;
        Ok(stored.unwrap_or_else(|| defaults.into()))
    }

    pub async fn save(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO auction_settings (id, auto_extend_threshold_secs, auto_extend_duration_secs, min_rating_percent)
             VALUES (1, $1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET
                auto_extend_threshold_secs = EXCLUDED.auto_extend_threshold_secs,
                auto_extend_duration_secs = EXCLUDED.auto_extend_duration_secs,
                min_rating_percent = EXCLUDED.min_rating_percent",
        )
        .bind(self.auto_extend_threshold_secs)
        .bind(self.auto_extend_duration_secs)
        .bind(self.min_rating_percent)
        .execute(conn)
        .await?;
        Ok(())
    }
}
