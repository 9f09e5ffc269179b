use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 경매(상품) 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Scheduled,
    Active,
    Sold,
    Ended,
    Cancelled,
}

impl AuctionStatus {
    pub const ALL: [AuctionStatus; 5] = [
        AuctionStatus::Scheduled,
        AuctionStatus::Active,
        AuctionStatus::Sold,
        AuctionStatus::Ended,
        AuctionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "SCHEDULED",
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Sold => "SOLD",
            AuctionStatus::Ended => "ENDED",
            AuctionStatus::Cancelled => "CANCELLED",
        }
    }

    /// 더 이상 입찰을 받지 않는 상태
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            AuctionStatus::Sold | AuctionStatus::Ended | AuctionStatus::Cancelled
        )
    }
}

impl FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuctionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("알 수 없는 경매 상태: {}", s))
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_strings() {
        assert_eq!("ACTIVE".parse::<AuctionStatus>().unwrap(), AuctionStatus::Active);
        assert_eq!("sold".parse::<AuctionStatus>().unwrap(), AuctionStatus::Sold);
        assert!("PAUSED".parse::<AuctionStatus>().is_err());
    }

    #[test]
    fn closed_states() {
        assert!(!AuctionStatus::Scheduled.is_closed());
        assert!(!AuctionStatus::Active.is_closed());
        assert!(AuctionStatus::Sold.is_closed());
        assert!(AuctionStatus::Ended.is_closed());
        assert!(AuctionStatus::Cancelled.is_closed());
    }
}
