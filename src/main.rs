// region:    --- Imports
use anyhow::{Context, Result};
use auction_market::config::{AppConfig, EventBusKind};
use auction_market::database::DatabaseManager;
use auction_market::event_store::{DynEventPublisher, EventConsumer, KafkaEventPublisher};
use auction_market::message_broker::KafkaManager;
use auction_market::routes::create_router;
use auction_market::scheduler::AuctionScheduler;
use auction_market::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<()> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("설정 로드 실패")?;

    // DatabaseManager 생성
    let db_manager = Arc::new(
        DatabaseManager::connect(&config)
            .await
            .context("데이터베이스 연결 실패")?,
    );

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database(config.reset_database).await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    let mut state = AppState::new(config.clone(), Arc::clone(&db_manager))?;

    // 이벤트 버스
    if config.event_bus == EventBusKind::Kafka {
        let kafka_manager = Arc::new(KafkaManager::new(&config.kafka).context("Kafka 설정 오류")?);
        if let Err(e) = kafka_manager.initialize().await {
            error!("{:<12} --> Kafka 초기화 실패: {:?}", "Main", e);
            return Err(anyhow::Error::msg(e));
        }
        info!("{:<12} --> Kafka 초기화 성공", "Main");

        // 토픽 생성
        kafka_manager
            .create_topic(&config.kafka.topic, 5, 1)
            .await
            .map_err(anyhow::Error::msg)?;

        let publisher: DynEventPublisher = Arc::new(KafkaEventPublisher::new(
            kafka_manager.get_producer(),
            &config.kafka.topic,
        ));
        state = state.with_publisher(publisher);

        // Kafka 이벤트를 실시간 허브로
        let event_consumer = EventConsumer::new(
            Arc::clone(&state.hub),
            kafka_manager.get_consumer(),
            &config.kafka.topic,
        );
        tokio::spawn(async move {
            event_consumer.start().await;
        });
    } else {
        info!("{:<12} --> 로컬 이벤트 버스 사용", "Main");
    }

    // 경매 상태 스케줄러
    AuctionScheduler::new(
        Arc::clone(&db_manager),
        Arc::clone(&state.publisher),
        Arc::clone(&state.hub),
        config.scheduler_interval_secs,
        config.payment_deadline_hours,
    )
    .start();

    let routes_all = create_router(state);

    // 리스너 생성
    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("{} 바인드 실패", config.bind_address))?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
