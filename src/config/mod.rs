/// 애플리케이션 설정
/// .env 파일과 환경 변수에서 읽어온다.
// region:    --- Imports
use anyhow::{anyhow, Context, Result};
use std::fmt::Display;
use std::str::FromStr;
use tracing::info;

// endregion: --- Imports

// region:    --- Config

/// 이벤트 버스 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBusKind {
    /// 프로세스 내부에서 바로 실시간 허브로 전달
    Local,
    /// Kafka 토픽을 거쳐 전달
    Kafka,
}

impl FromStr for EventBusKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(EventBusKind::Local),
            "kafka" => Ok(EventBusKind::Kafka),
            other => Err(anyhow!("EVENT_BUS must be 'local' or 'kafka', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    pub currency: String,
}

/// 경매 기본값. DB의 auction_settings 행이 없을 때 사용한다.
#[derive(Debug, Clone, Copy)]
pub struct AuctionDefaults {
    pub auto_extend_threshold_secs: i64,
    pub auto_extend_duration_secs: i64,
    pub min_rating_percent: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub reset_database: bool,
    pub bind_address: String,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub event_bus: EventBusKind,
    pub kafka: KafkaConfig,
    pub stripe: StripeConfig,
    pub payment_deadline_hours: i64,
    pub scheduler_interval_secs: u64,
    pub auction: AuctionDefaults,
}

impl AppConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 구성
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").context("Missing environment variable: DATABASE_URL")?;
        let jwt_secret =
            lookup("JWT_SECRET").context("Missing environment variable: JWT_SECRET")?;
        if jwt_secret.len() < 16 {
            return Err(anyhow!("JWT_SECRET must be at least 16 characters"));
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            reset_database: parse_bool(&lookup, "RESET_DATABASE", false)?,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            jwt_secret,
            access_token_minutes: parse_or(&lookup, "ACCESS_TOKEN_MINUTES", 60)?,
            refresh_token_days: parse_or(&lookup, "REFRESH_TOKEN_DAYS", 7)?,
            event_bus: parse_or(&lookup, "EVENT_BUS", EventBusKind::Local)?,
            kafka: KafkaConfig {
                brokers: lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_string()),
                topic: lookup("KAFKA_TOPIC").unwrap_or_else(|| "market-events".to_string()),
                group_id: lookup("KAFKA_GROUP_ID")
                    .unwrap_or_else(|| "market-events-group".to_string()),
            },
            stripe: StripeConfig {
                secret_key: lookup("STRIPE_SECRET_KEY").unwrap_or_default(),
                api_base: lookup("STRIPE_API_BASE")
                    .unwrap_or_else(|| "https://api.stripe.com".to_string()),
                currency: lookup("PAYMENT_CURRENCY").unwrap_or_else(|| "usd".to_string()),
            },
            payment_deadline_hours: parse_or(&lookup, "PAYMENT_DEADLINE_HOURS", 72)?,
            scheduler_interval_secs: parse_or(&lookup, "SCHEDULER_INTERVAL_SECS", 1)?,
            auction: AuctionDefaults {
                auto_extend_threshold_secs: parse_or(&lookup, "AUTO_EXTEND_THRESHOLD_SECS", 300)?,
                auto_extend_duration_secs: parse_or(&lookup, "AUTO_EXTEND_DURATION_SECS", 600)?,
                min_rating_percent: parse_or(&lookup, "MIN_RATING_PERCENT", 80)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for {}: {}", key, e)),
        None => {
            info!("{:<12} --> {} 미설정, 기본값 사용: {}", "Config", key, default);
            Ok(default)
        }
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref() {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(anyhow!("{} must be 'true' or 'false', got '{}'", key, other)),
    }
}

impl Display for EventBusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventBusKind::Local => write!(f, "local"),
            EventBusKind::Kafka => write!(f, "kafka"),
        }
    }
}

// endregion: --- Config
