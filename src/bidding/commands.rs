/// 입찰 관련 커맨드 처리
/// 1. 입찰 (수동 / 자동)
/// 2. 즉시 구매
/// 3. 입찰자 거부
/// 4. 자동 입찰 취소
///
/// 상품 스냅샷을 읽고 엔진으로 판정한 뒤 `version` 조건으로 갱신한다.
/// 버전이 바뀌었으면 처음부터 다시 시도한다.
// region:    --- Imports
use crate::auction::events::MarketEvent;
use crate::auction::lifecycle::{append_all, create_order_for_sale};
use crate::auction::settings::AuctionSettings;
use crate::auction::status::AuctionStatus;
use crate::auth::AuthUser;
use crate::bidding::engine::{
    recompute_leader, resolve_bid, resolve_buy_now, BidKind, BidRecord, BidRejection,
    BidResolution, Bidder, ListingSnapshot, ProxyBid,
};
use crate::bidding::model::{BidOutcome, RejectBidderRequest};
use crate::catalog::model::Product;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::event_store::{EventPublisher, StoredEvent};
use crate::query::handlers as query;
use crate::query::queries;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::collections::HashSet;
use tracing::{info, warn};

// endregion: --- Imports

// 최대 재시도 횟수
const MAX_RETRIES: i32 = 100;

/// 한 번의 시도 결과
enum Attempt<T> {
    Done(T, Vec<StoredEvent>),
    VersionConflict,
}

/// 입찰 요청 종류
#[derive(Debug, Clone, Copy)]
pub enum BidCommand {
    Place(BidKind),
    BuyNow,
}

impl TryFrom<&Product> for ListingSnapshot {
    type Error = AppError;

    fn try_from(product: &Product) -> Result<Self, Self::Error> {
        let status: AuctionStatus = product.status.parse().map_err(AppError::Internal)?;
        Ok(ListingSnapshot {
            product_id: product.id,
            seller_id: product.seller_id,
            status,
            starting_price: product.starting_price,
            current_price: product.current_price,
            bid_step: product.bid_step,
            buy_now_price: product.buy_now_price,
            start_time: product.start_time,
            end_time: product.end_time,
            auto_extend: product.auto_extend,
            allow_unrated_bidders: product.allow_unrated_bidders,
            highest_bidder_id: product.highest_bidder_id,
        })
    }
}

// region:    --- Commands

/// 1, 2. 입찰 / 즉시 구매
pub async fn handle_bid(
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
    config: &AppConfig,
    bidder_id: i64,
    product_id: i64,
    command: BidCommand,
) -> AppResult<BidOutcome> {
    info!(
        "{:<12} --> 입찰 요청 처리 시작: product: {} bidder: {} {:?}",
        "Command", product_id, bidder_id, command
    );
    let mut retries = 0;

    while retries < MAX_RETRIES {
        match try_bid(db_manager, config, bidder_id, product_id, command).await? {
            Attempt::Done(outcome, events) => {
                publisher.publish_all(&events).await;
                info!(
                    "{:<12} --> 입찰 처리 완료: product: {} price: {} leader: {}",
                    "Command", product_id, outcome.current_price, outcome.highest_bidder_id
                );
                return Ok(outcome);
            }
            Attempt::VersionConflict => {
                warn!(
                    "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도",
                    "Command"
                );
                retries += 1;
            }
        }
    }

    Err(BidRejection::MaxRetriesExceeded.into())
}

async fn try_bid(
    db_manager: &DatabaseManager,
    config: &AppConfig,
    bidder_id: i64,
    product_id: i64,
    command: BidCommand,
) -> AppResult<Attempt<BidOutcome>> {
    let mut tx = db_manager.pool().begin().await?;

    let product = query::get_product(&mut *tx, product_id).await?;
    let listing = ListingSnapshot::try_from(&product)?;
    let settings = AuctionSettings::load(&mut tx, config.auction).await?;
    let bidder = load_bidder(&mut tx, product_id, bidder_id).await?;
    let now = Utc::now();

    let resolution = match command {
        BidCommand::Place(kind) => {
            let proxies = load_proxies(&mut tx, product_id).await?;
            resolve_bid(&listing, &proxies, &bidder, kind, &settings.policy(), now)?
        }
        BidCommand::BuyNow => resolve_buy_now(&listing, &bidder, &settings.policy(), now)?,
    };

    if !update_listing(&mut tx, &product, &resolution).await? {
        return Ok(Attempt::VersionConflict);
    }

    insert_bids(&mut tx, product_id, &resolution, now).await?;
    if let Some(proxy) = &resolution.proxy_upsert {
        upsert_proxy(&mut tx, product_id, proxy).await?;
    }
    if !resolution.exhausted_proxies.is_empty() {
        sqlx::query(
            "UPDATE auto_bids SET is_active = FALSE, updated_at = NOW()
             WHERE product_id = $1 AND bidder_id = ANY($2)",
        )
        .bind(product_id)
        .bind(&resolution.exhausted_proxies)
        .execute(&mut *tx)
        .await?;
    }

    let mut events = resolution_events(product_id, &resolution, now);
    let mut order_id = None;
    if resolution.sold {
        let (order, order_event) = create_order_for_sale(
            &mut tx,
            &product,
            resolution.leader_id,
            resolution.new_price,
            config.payment_deadline_hours,
            now,
        )
        .await?;
        order_id = Some(order.id);
        events.push(order_event);
    }

    let stored = append_all(&mut tx, &events).await?;
    tx.commit().await?;

    let outcome = BidOutcome {
        product_id,
        current_price: resolution.new_price,
        highest_bidder_id: resolution.leader_id,
        leading: resolution.leader_id == bidder_id,
        end_time: resolution.extended_end_time.unwrap_or(product.end_time),
        extended: resolution.extended_end_time.is_some(),
        sold: resolution.sold,
        order_id,
    };
    Ok(Attempt::Done(outcome, stored))
}

/// 3. 입찰자 거부
/// 거부된 입찰자가 선두였다면 남은 입찰 중 최고가로 다시 계산한다.
pub async fn handle_reject_bidder(
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
    user: AuthUser,
    product_id: i64,
    req: RejectBidderRequest,
) -> AppResult<Product> {
    info!(
        "{:<12} --> 입찰자 거부 요청: product: {} bidder: {}",
        "Command", product_id, req.bidder_id
    );
    let mut retries = 0;

    while retries < MAX_RETRIES {
        match try_reject_bidder(db_manager, user, product_id, &req).await? {
            Attempt::Done(product, events) => {
                publisher.publish_all(&events).await;
                return Ok(product);
            }
            Attempt::VersionConflict => {
                warn!(
                    "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도",
                    "Command"
                );
                retries += 1;
            }
        }
    }

    Err(BidRejection::MaxRetriesExceeded.into())
}

async fn try_reject_bidder(
    db_manager: &DatabaseManager,
    user: AuthUser,
    product_id: i64,
    req: &RejectBidderRequest,
) -> AppResult<Attempt<Product>> {
    let mut tx = db_manager.pool().begin().await?;

    let product = query::get_product(&mut *tx, product_id).await?;
    if product.seller_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "본인 상품의 입찰자만 거부할 수 있습니다.".to_string(),
        ));
    }
    if req.bidder_id == product.seller_id {
        return Err(AppError::BadRequest("판매자는 거부할 수 없습니다.".to_string()));
    }
    let status: AuctionStatus = product.status.parse().map_err(AppError::Internal)?;
    if status.is_closed() {
        return Err(BidRejection::AlreadyEnded.into());
    }

    sqlx::query(
        "INSERT INTO rejected_bidders (product_id, bidder_id, reason) VALUES ($1, $2, $3)
         ON CONFLICT (product_id, bidder_id) DO UPDATE SET reason = EXCLUDED.reason",
    )
    .bind(product_id)
    .bind(req.bidder_id)
    .bind(req.reason.as_deref())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE auto_bids SET is_active = FALSE, updated_at = NOW()
         WHERE product_id = $1 AND bidder_id = $2",
    )
    .bind(product_id)
    .bind(req.bidder_id)
    .execute(&mut *tx)
    .await?;

    let (new_price, new_leader) = if product.highest_bidder_id == Some(req.bidder_id) {
        let bids = sqlx::query_as::<_, (i64, i64, i64, DateTime<Utc>)>(
            "SELECT id, bidder_id, amount, bid_time FROM bids WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(id, bidder_id, amount, bid_time)| BidRecord {
            id,
            bidder_id,
            amount,
            bid_time,
        })
        .collect::<Vec<_>>();
        let rejected: HashSet<i64> = sqlx::query_scalar::<_, i64>(
            "SELECT bidder_id FROM rejected_bidders WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();
        recompute_leader(product.starting_price, &bids, &rejected)
    } else {
        (product.current_price, product.highest_bidder_id)
    };

    // 선두가 바뀌지 않아도 버전을 올려 진행 중인 입찰이 다시 읽게 한다
    let updated = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products p SET current_price = $1, highest_bidder_id = $2, version = p.version + 1
         WHERE p.id = $3 AND p.version = $4
         RETURNING {}",
        queries::PRODUCT_COLUMNS
    ))
    .bind(new_price)
    .bind(new_leader)
    .bind(product_id)
    .bind(product.version)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(updated) = updated else {
        return Ok(Attempt::VersionConflict);
    };

    let event = MarketEvent::BidderRejected {
        product_id,
        bidder_id: req.bidder_id,
        current_price: new_price,
        highest_bidder_id: new_leader,
        timestamp: Utc::now(),
    };
    let stored = append_all(&mut tx, &[event]).await?;
    tx.commit().await?;

    info!(
        "{:<12} --> 입찰자 거부 완료: product: {} price: {} leader: {:?}",
        "Command", product_id, new_price, new_leader
    );
    Ok(Attempt::Done(updated, stored))
}

/// 4. 자동 입찰 취소
pub async fn handle_cancel_auto_bid(
    db_manager: &DatabaseManager,
    bidder_id: i64,
    product_id: i64,
) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE auto_bids SET is_active = FALSE, updated_at = NOW()
         WHERE product_id = $1 AND bidder_id = $2 AND is_active",
    )
    .bind(product_id)
    .bind(bidder_id)
    .execute(db_manager.pool())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("자동 입찰"));
    }
    info!(
        "{:<12} --> 자동 입찰 취소: product: {} bidder: {}",
        "Command", product_id, bidder_id
    );
    Ok(())
}

// endregion: --- Commands

// region:    --- Persistence

async fn load_bidder(
    conn: &mut PgConnection,
    product_id: i64,
    bidder_id: i64,
) -> AppResult<Bidder> {
    let rating = query::get_rating_summary(&mut *conn, bidder_id).await?;
    let rejected: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM rejected_bidders WHERE product_id = $1 AND bidder_id = $2)",
    )
    .bind(product_id)
    .bind(bidder_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(Bidder {
        id: bidder_id,
        rating,
        rejected,
    })
}

async fn load_proxies(conn: &mut PgConnection, product_id: i64) -> AppResult<Vec<ProxyBid>> {
    let rows = sqlx::query_as::<_, (i64, i64, DateTime<Utc>)>(
        "SELECT bidder_id, max_amount, created_at FROM auto_bids
         WHERE product_id = $1 AND is_active
         ORDER BY created_at, id",
    )
    .bind(product_id)
    .fetch_all(conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(bidder_id, max_amount, created_at)| ProxyBid {
            bidder_id,
            max_amount,
            created_at,
        })
        .collect())
}

/// 판정 결과 반영. 버전이 바뀌었으면 false
async fn update_listing(
    conn: &mut PgConnection,
    product: &Product,
    resolution: &BidResolution,
) -> AppResult<bool> {
    let status = if resolution.sold {
        AuctionStatus::Sold
    } else {
        AuctionStatus::Active
    };
    let result = sqlx::query(
        "UPDATE products
         SET current_price = $1,
             highest_bidder_id = $2,
             end_time = COALESCE($3, end_time),
             status = $4,
             bid_count = bid_count + $5,
             version = version + 1
         WHERE id = $6 AND version = $7",
    )
    .bind(resolution.new_price)
    .bind(resolution.leader_id)
    .bind(resolution.extended_end_time)
    .bind(status.as_str())
    .bind(resolution.placed.len() as i64)
    .bind(product.id)
    .bind(product.version)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

async fn insert_bids(
    conn: &mut PgConnection,
    product_id: i64,
    resolution: &BidResolution,
    now: DateTime<Utc>,
) -> AppResult<()> {
    // 판정 순서대로 삽입: 같은 시각의 동률은 id 가 큰 쪽이 선두
    for bid in &resolution.placed {
        sqlx::query(
            "INSERT INTO bids (product_id, bidder_id, amount, is_auto, bid_time)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product_id)
        .bind(bid.bidder_id)
        .bind(bid.amount)
        .bind(bid.is_auto)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// 입찰자당 자동 입찰 하나. 다시 등록하면 상한과 등록 시각을 갱신한다.
async fn upsert_proxy(conn: &mut PgConnection, product_id: i64, proxy: &ProxyBid) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO auto_bids (product_id, bidder_id, max_amount, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, TRUE, $4, $4)
         ON CONFLICT (product_id, bidder_id) DO UPDATE SET
            max_amount = EXCLUDED.max_amount,
            is_active = TRUE,
            created_at = EXCLUDED.created_at,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(product_id)
    .bind(proxy.bidder_id)
    .bind(proxy.max_amount)
    .bind(proxy.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

// endregion: --- Persistence

/// 판정 결과를 도메인 이벤트로
/// 선두를 잃은 사용자 알림은 마지막 입찰 이벤트에만 싣는다.
fn resolution_events(
    product_id: i64,
    resolution: &BidResolution,
    now: DateTime<Utc>,
) -> Vec<MarketEvent> {
    let mut events: Vec<MarketEvent> = resolution
        .placed
        .iter()
        .enumerate()
        .map(|(i, bid)| MarketEvent::BidPlaced {
            product_id,
            bidder_id: bid.bidder_id,
            amount: bid.amount,
            is_auto: bid.is_auto,
            current_price: resolution.new_price,
            highest_bidder_id: resolution.leader_id,
            outbid_id: if i + 1 == resolution.placed.len() {
                resolution.outbid_id
            } else {
                None
            },
            timestamp: now,
        })
        .collect();

    if let Some(new_end_time) = resolution.extended_end_time {
        events.push(MarketEvent::AuctionExtended {
            product_id,
            new_end_time,
            timestamp: now,
        });
    }
    if resolution.sold {
        events.push(MarketEvent::BuyNowExecuted {
            product_id,
            buyer_id: resolution.leader_id,
            price: resolution.new_price,
            timestamp: now,
        });
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::engine::PlacedBid;
    use chrono::Duration;

    fn resolution() -> BidResolution {
        BidResolution {
            placed: vec![
                PlacedBid {
                    bidder_id: 3,
                    amount: 1500,
                    is_auto: false,
                },
                PlacedBid {
                    bidder_id: 2,
                    amount: 1600,
                    is_auto: true,
                },
            ],
            new_price: 1600,
            leader_id: 2,
            outbid_id: Some(3),
            extended_end_time: None,
            sold: false,
            proxy_upsert: None,
            exhausted_proxies: vec![],
        }
    }

    #[test]
    fn outbid_notice_rides_on_the_last_bid_only() {
        let events = resolution_events(10, &resolution(), Utc::now());
        let outbids: Vec<Option<i64>> = events
            .iter()
            .map(|e| match e {
                MarketEvent::BidPlaced { outbid_id, .. } => *outbid_id,
                _ => panic!("unexpected event"),
            })
            .collect();
        assert_eq!(outbids, vec![None, Some(3)]);
    }

    #[test]
    fn extension_and_sale_add_events() {
        let now = Utc::now();
        let mut res = resolution();
        res.extended_end_time = Some(now + Duration::minutes(10));
        res.sold = true;
        let types: Vec<&str> = resolution_events(10, &res, now)
            .iter()
            .map(MarketEvent::event_type)
            .collect();
        assert_eq!(
            types,
            vec!["BidPlaced", "BidPlaced", "AuctionExtended", "BuyNowExecuted"]
        );
    }

    #[test]
    fn product_row_becomes_snapshot() {
        let now = Utc::now();
        let product = Product {
            id: 1,
            seller_id: 2,
            category_id: 1,
            title: "Lamp".into(),
            description: "Brass".into(),
            image_urls: vec![],
            starting_price: 1000,
            current_price: 1000,
            bid_step: 100,
            buy_now_price: None,
            start_time: now,
            end_time: now + Duration::hours(1),
            status: "ACTIVE".into(),
            auto_extend: true,
            allow_unrated_bidders: true,
            highest_bidder_id: None,
            bid_count: 0,
            version: 0,
            created_at: now,
        };
        let snapshot = ListingSnapshot::try_from(&product).unwrap();
        assert_eq!(snapshot.status, AuctionStatus::Active);
        assert_eq!(snapshot.minimum_bid(), 1000);

        let broken = Product {
            status: "UNKNOWN".into(),
            ..product
        };
        assert!(ListingSnapshot::try_from(&broken).is_err());
    }
}
