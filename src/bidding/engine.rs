/// 입찰 판정 엔진
/// DB 와 무관한 순수 로직. 커맨드 계층이 스냅샷을 읽어 넘겨주고,
/// 결과(입찰 기록, 새 가격, 최고 입찰자, 연장된 종료 시간)를 저장한다.
// region:    --- Imports
use crate::auction::status::AuctionStatus;
use crate::reviews::model::RatingSummary;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Types

/// 입찰 판정에 필요한 상품 상태
#[derive(Debug, Clone)]
pub struct ListingSnapshot {
    pub product_id: i64,
    pub seller_id: i64,
    pub status: AuctionStatus,
    pub starting_price: i64,
    pub current_price: i64,
    pub bid_step: i64,
    pub buy_now_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub auto_extend: bool,
    pub allow_unrated_bidders: bool,
    pub highest_bidder_id: Option<i64>,
}

impl ListingSnapshot {
    /// 다음 입찰의 최소 금액
    pub fn minimum_bid(&self) -> i64 {
        match self.highest_bidder_id {
            None => self.starting_price,
            Some(_) => self.current_price.saturating_add(self.bid_step),
        }
    }
}

/// 활성 자동 입찰(대리 입찰)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyBid {
    pub bidder_id: i64,
    pub max_amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidKind {
    Manual { amount: i64 },
    Auto { max_amount: i64 },
}

/// 입찰자 정보
#[derive(Debug, Clone, Copy)]
pub struct Bidder {
    pub id: i64,
    pub rating: RatingSummary,
    pub rejected: bool,
}

/// 입찰 정책 (auction_settings)
#[derive(Debug, Clone, Copy)]
pub struct BidPolicy {
    pub min_rating_percent: i64,
    pub auto_extend_threshold: Duration,
    pub auto_extend_duration: Duration,
}

/// 판정 결과로 생성되는 입찰 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedBid {
    pub bidder_id: i64,
    pub amount: i64,
    pub is_auto: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidResolution {
    pub placed: Vec<PlacedBid>,
    pub new_price: i64,
    pub leader_id: i64,
    /// 선두를 잃었거나 즉시 자동 입찰에 밀린 사용자
    pub outbid_id: Option<i64>,
    /// 자동 연장된 경우 새 종료 시간
    pub extended_end_time: Option<DateTime<Utc>>,
    pub sold: bool,
    /// 저장할 자동 입찰 (자동 입찰 요청일 때)
    pub proxy_upsert: Option<ProxyBid>,
    /// 더 이상 가격을 넘을 수 없어 비활성화할 자동 입찰자
    pub exhausted_proxies: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidRejection {
    #[error("경매가 아직 시작되지 않았습니다.")]
    NotStarted,
    #[error("경매가 이미 종료되었습니다.")]
    AlreadyEnded,
    #[error("잘못된 경매 상태입니다.")]
    InvalidStatus,
    #[error("판매자는 자신의 상품에 입찰할 수 없습니다.")]
    SellerCannotBid,
    #[error("판매자가 이 상품에 대한 입찰을 거부했습니다.")]
    BidderRejected,
    #[error("평가 점수가 부족합니다. ({percent}% < {required}%)")]
    RatingTooLow { percent: i64, required: i64 },
    #[error("평가 이력이 없는 사용자는 이 상품에 입찰할 수 없습니다.")]
    UnratedNotAllowed,
    #[error("입찰 금액이 최소 입찰가({minimum})보다 낮습니다.")]
    BelowMinimum { minimum: i64 },
    #[error("이미 최고 입찰자입니다.")]
    AlreadyHighest,
    #[error("즉시 구매가 설정되지 않은 상품입니다.")]
    NoBuyNowPrice,
    #[error("최대 재시도 횟수 초과")]
    MaxRetriesExceeded,
}

impl BidRejection {
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::NotStarted => "NOT_STARTED",
            BidRejection::AlreadyEnded => "ALREADY_ENDED",
            BidRejection::InvalidStatus => "INVALID_STATUS",
            BidRejection::SellerCannotBid => "SELLER_CANNOT_BID",
            BidRejection::BidderRejected => "BIDDER_REJECTED",
            BidRejection::RatingTooLow { .. } => "RATING_TOO_LOW",
            BidRejection::UnratedNotAllowed => "UNRATED_NOT_ALLOWED",
            BidRejection::BelowMinimum { .. } => "LOW_BID",
            BidRejection::AlreadyHighest => "ALREADY_HIGHEST",
            BidRejection::NoBuyNowPrice => "NO_BUY_NOW",
            BidRejection::MaxRetriesExceeded => "MAX_RETRIES_EXCEEDED",
        }
    }
}

// endregion: --- Types

// region:    --- Eligibility

/// 경매 진행 여부와 입찰 자격 검증
pub fn check_eligibility(
    listing: &ListingSnapshot,
    bidder: &Bidder,
    policy: &BidPolicy,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    match listing.status {
        AuctionStatus::Scheduled => return Err(BidRejection::NotStarted),
        AuctionStatus::Sold | AuctionStatus::Ended => return Err(BidRejection::AlreadyEnded),
        AuctionStatus::Cancelled => return Err(BidRejection::InvalidStatus),
        AuctionStatus::Active => {}
    }
    if now < listing.start_time {
        return Err(BidRejection::NotStarted);
    }
    if now > listing.end_time {
        return Err(BidRejection::AlreadyEnded);
    }
    if bidder.id == listing.seller_id {
        return Err(BidRejection::SellerCannotBid);
    }
    if bidder.rejected {
        return Err(BidRejection::BidderRejected);
    }
    match bidder.rating.percent() {
        Some(percent) if percent < policy.min_rating_percent => Err(BidRejection::RatingTooLow {
            percent,
            required: policy.min_rating_percent,
        }),
        None if !listing.allow_unrated_bidders => Err(BidRejection::UnratedNotAllowed),
        _ => Ok(()),
    }
}

// endregion: --- Eligibility

// region:    --- Resolution

struct Contender {
    bidder_id: i64,
    ceiling: i64,
    // (우선순위 등급, 시각): 작을수록 동률에서 이긴다
    priority: (u8, DateTime<Utc>),
    has_proxy: bool,
}

/// 입찰 판정
/// 1. 자격 검증
/// 2. 즉시 구매가 이상 수동 입찰이면 바로 낙찰
/// 3. 현재 선두, 다른 자동 입찰, 신규 입찰 중 상한이 가장 높은 쪽이 선두
pub fn resolve_bid(
    listing: &ListingSnapshot,
    proxies: &[ProxyBid],
    bidder: &Bidder,
    kind: BidKind,
    policy: &BidPolicy,
    now: DateTime<Utc>,
) -> Result<BidResolution, BidRejection> {
    check_eligibility(listing, bidder, policy, now)?;

    let minimum = listing.minimum_bid();
    let leader = listing.highest_bidder_id;
    let is_leader = leader == Some(bidder.id);

    match kind {
        BidKind::Manual { amount } => {
            if is_leader {
                return Err(BidRejection::AlreadyHighest);
            }
            if amount < minimum {
                return Err(BidRejection::BelowMinimum { minimum });
            }
            if let Some(buy_now) = listing.buy_now_price {
                if amount >= buy_now {
                    return Ok(buy_now_resolution(listing, bidder.id, buy_now));
                }
            }
        }
        BidKind::Auto { max_amount } => {
            if is_leader {
                if max_amount <= listing.current_price {
                    return Err(BidRejection::BelowMinimum {
                        minimum: listing.current_price.saturating_add(1),
                    });
                }
            } else if max_amount < minimum {
                return Err(BidRejection::BelowMinimum { minimum });
            }
        }
    }

    let incoming_ceiling = match kind {
        BidKind::Manual { amount } => amount,
        BidKind::Auto { max_amount } => max_amount,
    };

    // 상한 목록 구성
    let mut contenders: Vec<Contender> = Vec::new();
    if let Some(leader_id) = leader {
        let own_proxy = proxies.iter().find(|p| p.bidder_id == leader_id);
        let mut ceiling = own_proxy
            .map(|p| p.max_amount.max(listing.current_price))
            .unwrap_or(listing.current_price);
        if is_leader {
            // 선두의 상한 변경
            ceiling = incoming_ceiling.max(listing.current_price);
        }
        contenders.push(Contender {
            bidder_id: leader_id,
            ceiling,
            priority: (0, DateTime::<Utc>::MIN_UTC),
            has_proxy: own_proxy.is_some() || is_leader,
        });
    }
    for proxy in proxies {
        if Some(proxy.bidder_id) == leader || proxy.bidder_id == bidder.id {
            continue;
        }
        contenders.push(Contender {
            bidder_id: proxy.bidder_id,
            ceiling: proxy.max_amount,
            priority: (1, proxy.created_at),
            has_proxy: true,
        });
    }
    if !is_leader {
        let existing = proxies.iter().find(|p| p.bidder_id == bidder.id);
        let (ceiling, has_proxy) = match (kind, existing) {
            (BidKind::Auto { max_amount }, _) => (max_amount, true),
            (BidKind::Manual { amount }, Some(p)) => (amount.max(p.max_amount), true),
            (BidKind::Manual { amount }, None) => (amount, false),
        };
        contenders.push(Contender {
            bidder_id: bidder.id,
            ceiling,
            priority: (2, now),
            has_proxy,
        });
    }

    contenders.sort_by(|a, b| {
        b.ceiling
            .cmp(&a.ceiling)
            .then_with(|| a.priority.cmp(&b.priority))
    });

    let winner = &contenders[0];
    let runner_up = contenders.get(1);

    // 가격 산정
    let mut floor = if Some(winner.bidder_id) == leader {
        listing.current_price
    } else {
        minimum
    };
    if let BidKind::Manual { amount } = kind {
        if winner.bidder_id == bidder.id {
            floor = floor.max(amount);
        }
    }
    let raw = match runner_up {
        Some(r) => floor.max(r.ceiling.saturating_add(listing.bid_step)),
        None => floor,
    };
    let mut new_price = if winner.bidder_id == bidder.id && !winner.has_proxy {
        // 자동 입찰 없이 수동 입찰로 선두: 입찰 금액 그대로
        floor
    } else {
        winner.ceiling.min(raw)
    };

    let mut sold = false;
    if let Some(buy_now) = listing.buy_now_price {
        if new_price >= buy_now {
            new_price = buy_now;
            sold = true;
        }
    }

    // 입찰 기록
    let mut placed = Vec::new();
    let incoming_is_auto = matches!(kind, BidKind::Auto { .. });
    if winner.bidder_id == bidder.id {
        if !is_leader || new_price != listing.current_price {
            placed.push(PlacedBid {
                bidder_id: bidder.id,
                amount: new_price,
                is_auto: incoming_is_auto,
            });
        }
    } else {
        let losing_amount = match listing.buy_now_price {
            Some(buy_now) => incoming_ceiling.min(buy_now),
            None => incoming_ceiling,
        };
        placed.push(PlacedBid {
            bidder_id: bidder.id,
            amount: losing_amount,
            is_auto: incoming_is_auto,
        });
        placed.push(PlacedBid {
            bidder_id: winner.bidder_id,
            amount: new_price,
            is_auto: true,
        });
    }

    let outbid_id = match leader {
        Some(leader_id) if leader_id != winner.bidder_id => Some(leader_id),
        _ if winner.bidder_id != bidder.id => Some(bidder.id),
        _ => None,
    };

    let exhausted_proxies = contenders
        .iter()
        .filter(|c| c.bidder_id != winner.bidder_id && c.has_proxy)
        .filter(|c| {
            new_price
                .checked_add(listing.bid_step)
                .map_or(true, |next| c.ceiling < next)
        })
        .map(|c| c.bidder_id)
        .collect();

    let proxy_upsert = match kind {
        BidKind::Auto { max_amount } => Some(ProxyBid {
            bidder_id: bidder.id,
            max_amount,
            created_at: now,
        }),
        BidKind::Manual { .. } => None,
    };

    let extended_end_time = if placed.is_empty() || sold {
        None
    } else {
        extension_for(listing, policy, now)
    };

    Ok(BidResolution {
        placed,
        new_price,
        leader_id: winner.bidder_id,
        outbid_id,
        extended_end_time,
        sold,
        proxy_upsert,
        exhausted_proxies,
    })
}

/// 즉시 구매 판정
pub fn resolve_buy_now(
    listing: &ListingSnapshot,
    bidder: &Bidder,
    policy: &BidPolicy,
    now: DateTime<Utc>,
) -> Result<BidResolution, BidRejection> {
    check_eligibility(listing, bidder, policy, now)?;
    let buy_now = listing.buy_now_price.ok_or(BidRejection::NoBuyNowPrice)?;
    Ok(buy_now_resolution(listing, bidder.id, buy_now))
}

fn buy_now_resolution(listing: &ListingSnapshot, buyer_id: i64, price: i64) -> BidResolution {
    BidResolution {
        placed: vec![PlacedBid {
            bidder_id: buyer_id,
            amount: price,
            is_auto: false,
        }],
        new_price: price,
        leader_id: buyer_id,
        outbid_id: listing.highest_bidder_id.filter(|id| *id != buyer_id),
        extended_end_time: None,
        sold: true,
        proxy_upsert: None,
        exhausted_proxies: Vec::new(),
    }
}

/// 종료 임박 입찰 시 자동 연장
pub fn extension_for(
    listing: &ListingSnapshot,
    policy: &BidPolicy,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if !listing.auto_extend {
        return None;
    }
    let remaining = listing.end_time - now;
    if remaining <= policy.auto_extend_threshold {
        Some(listing.end_time + policy.auto_extend_duration)
    } else {
        None
    }
}

// endregion: --- Resolution

// region:    --- Rejection

/// 입찰 기록 (입찰 거부 후 재계산용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidRecord {
    pub id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub bid_time: DateTime<Utc>,
}

/// 거부된 입찰자를 제외하고 최고 입찰자/가격 재계산
/// 동일 금액이면 먼저 입찰한 사람이 선두.
/// 한 번의 판정에서 같은 시각으로 기록된 동률은 나중 행(선두의 자동 응찰)이 이긴다.
pub fn recompute_leader(
    starting_price: i64,
    bids: &[BidRecord],
    rejected: &HashSet<i64>,
) -> (i64, Option<i64>) {
    bids.iter()
        .filter(|b| !rejected.contains(&b.bidder_id))
        .max_by(|a, b| {
            a.amount
                .cmp(&b.amount)
                .then_with(|| b.bid_time.cmp(&a.bid_time))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|b| (b.amount, Some(b.bidder_id)))
        .unwrap_or((starting_price, None))
}

// endregion: --- Rejection

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn listing() -> ListingSnapshot {
        ListingSnapshot {
            product_id: 1,
            seller_id: 100,
            status: AuctionStatus::Active,
            starting_price: 1000,
            current_price: 1000,
            bid_step: 100,
            buy_now_price: Some(10_000),
            start_time: now() - Duration::hours(1),
            end_time: now() + Duration::hours(1),
            auto_extend: true,
            allow_unrated_bidders: true,
            highest_bidder_id: None,
        }
    }

    /// 선두(1)가 있는 상품
    fn led_by_one(current_price: i64) -> ListingSnapshot {
        ListingSnapshot {
            highest_bidder_id: Some(1),
            current_price,
            ..listing()
        }
    }

    fn policy() -> BidPolicy {
        BidPolicy {
            min_rating_percent: 80,
            auto_extend_threshold: Duration::minutes(5),
            auto_extend_duration: Duration::minutes(10),
        }
    }

    fn bidder(id: i64) -> Bidder {
        Bidder {
            id,
            rating: RatingSummary::default(),
            rejected: false,
        }
    }

    fn rated(id: i64, positive: i64, negative: i64) -> Bidder {
        Bidder {
            rating: RatingSummary { positive, negative },
            ..bidder(id)
        }
    }

    fn proxy(bidder_id: i64, max_amount: i64, minutes_ago: i64) -> ProxyBid {
        ProxyBid {
            bidder_id,
            max_amount,
            created_at: now() - Duration::minutes(minutes_ago),
        }
    }

    fn manual(amount: i64) -> BidKind {
        BidKind::Manual { amount }
    }

    fn auto(max_amount: i64) -> BidKind {
        BidKind::Auto { max_amount }
    }

    fn placed(bidder_id: i64, amount: i64, is_auto: bool) -> PlacedBid {
        PlacedBid {
            bidder_id,
            amount,
            is_auto,
        }
    }

    fn resolve_as(
        l: &ListingSnapshot,
        proxies: &[ProxyBid],
        who: &Bidder,
        kind: BidKind,
    ) -> Result<BidResolution, BidRejection> {
        resolve_bid(l, proxies, who, kind, &policy(), now())
    }

    fn resolve(
        l: &ListingSnapshot,
        proxies: &[ProxyBid],
        who: i64,
        kind: BidKind,
    ) -> Result<BidResolution, BidRejection> {
        resolve_as(l, proxies, &bidder(who), kind)
    }

    fn record(id: i64, bidder_id: i64, amount: i64, secs: i64) -> BidRecord {
        BidRecord {
            id,
            bidder_id,
            amount,
            bid_time: now() + Duration::seconds(secs),
        }
    }

    #[test]
    fn first_manual_bid_at_starting_price() {
        let res = resolve(&listing(), &[], 1, manual(1000)).unwrap();
        assert_eq!(res.new_price, 1000);
        assert_eq!(res.leader_id, 1);
        assert_eq!(res.outbid_id, None);
        assert_eq!(res.placed, vec![placed(1, 1000, false)]);
    }

    #[test]
    fn manual_bid_below_minimum_is_rejected() {
        let mut l = listing();
        l.highest_bidder_id = Some(2);
        l.current_price = 1500;
        let err = resolve(&l, &[], 1, manual(1550)).unwrap_err();
        assert_eq!(err, BidRejection::BelowMinimum { minimum: 1600 });
    }

    #[test]
    fn leader_cannot_outbid_themselves() {
        let l = led_by_one(1000);
        let err = resolve(&l, &[], 1, manual(5000)).unwrap_err();
        assert_eq!(err, BidRejection::AlreadyHighest);
    }

    #[test]
    fn status_and_time_window_are_enforced() {
        let mut l = listing();
        l.status = AuctionStatus::Scheduled;
        let err = resolve(&l, &[], 1, manual(1000)).unwrap_err();
        assert_eq!(err, BidRejection::NotStarted);

        let mut l = listing();
        l.end_time = now() - Duration::seconds(1);
        let err = resolve(&l, &[], 1, manual(1000)).unwrap_err();
        assert_eq!(err, BidRejection::AlreadyEnded);

        let mut l = listing();
        l.status = AuctionStatus::Sold;
        let err = resolve(&l, &[], 1, manual(1000)).unwrap_err();
        assert_eq!(err, BidRejection::AlreadyEnded);
    }

    #[test]
    fn seller_and_rejected_bidders_are_refused() {
        let l = listing();
        let err = resolve(&l, &[], 100, manual(1000)).unwrap_err();
        assert_eq!(err, BidRejection::SellerCannotBid);

        let mut b = bidder(1);
        b.rejected = true;
        let err = resolve_as(&l, &[], &b, manual(1000)).unwrap_err();
        assert_eq!(err, BidRejection::BidderRejected);
    }

    #[test]
    fn rating_threshold_and_unrated_policy() {
        let (l, low) = (listing(), rated(1, 7, 3));
        let err = resolve_as(&l, &[], &low, manual(1000)).unwrap_err();
        assert_eq!(
            err,
            BidRejection::RatingTooLow {
                percent: 70,
                required: 80
            }
        );

        assert!(resolve_as(&l, &[], &rated(1, 9, 1), manual(1000)).is_ok());

        let mut l = listing();
        l.allow_unrated_bidders = false;
        let err = resolve(&l, &[], 2, manual(1000)).unwrap_err();
        assert_eq!(err, BidRejection::UnratedNotAllowed);
    }

    #[test]
    fn first_auto_bid_opens_at_starting_price() {
        let res = resolve(&listing(), &[], 1, auto(5000)).unwrap();
        assert_eq!(res.new_price, 1000);
        assert_eq!(res.leader_id, 1);
        assert_eq!(res.placed, vec![placed(1, 1000, true)]);
        assert_eq!(res.proxy_upsert.unwrap().max_amount, 5000);
    }

    #[test]
    fn proxy_defends_against_manual_bid() {
        let proxies = [proxy(1, 5000, 10)];

        let l = led_by_one(1000);
        let res = resolve(&l, &proxies, 2, manual(2000)).unwrap();
        assert_eq!(res.leader_id, 1);
        assert_eq!(res.new_price, 2100);
        assert_eq!(res.outbid_id, Some(2));
        assert_eq!(
            res.placed,
            vec![placed(2, 2000, false), placed(1, 2100, true)]
        );
    }

    #[test]
    fn tie_goes_to_the_sitting_leader() {
        let proxies = [proxy(1, 3000, 10)];

        let l = led_by_one(1000);
        let res = resolve(&l, &proxies, 2, manual(3000)).unwrap();
        assert_eq!(res.leader_id, 1);
        assert_eq!(res.new_price, 3000);
        assert!(res.exhausted_proxies.is_empty());
        // 동률 입찰과 선두의 응찰은 같은 판정에서 순서대로 기록된다
        assert_eq!(
            res.placed,
            vec![placed(2, 3000, false), placed(1, 3000, true)]
        );
    }

    #[test]
    fn manual_bid_over_proxy_ceiling_takes_the_lead_at_its_amount() {
        let proxies = [proxy(1, 2000, 10)];

        let l = led_by_one(1200);
        let res = resolve(&l, &proxies, 2, manual(2500)).unwrap();
        assert_eq!(res.leader_id, 2);
        assert_eq!(res.new_price, 2500);
        assert_eq!(res.outbid_id, Some(1));
        assert_eq!(res.exhausted_proxies, vec![1]);
    }

    #[test]
    fn competing_proxies_settle_one_step_above_the_runner_up() {
        let proxies = [proxy(1, 3000, 10)];

        let l = led_by_one(1000);
        let res = resolve(&l, &proxies, 2, auto(4000)).unwrap();
        assert_eq!(res.leader_id, 2);
        assert_eq!(res.new_price, 3100);
        assert_eq!(res.outbid_id, Some(1));
        assert_eq!(res.placed, vec![placed(2, 3100, true)]);
        assert_eq!(res.exhausted_proxies, vec![1]);
    }

    #[test]
    fn losing_proxy_is_recorded_then_leader_counters() {
        let proxies = [proxy(1, 5000, 10)];

        let l = led_by_one(1000);
        let res = resolve(&l, &proxies, 2, auto(2000)).unwrap();
        assert_eq!(res.leader_id, 1);
        assert_eq!(res.new_price, 2100);
        assert_eq!(
            res.placed,
            vec![placed(2, 2000, true), placed(1, 2100, true)]
        );
        assert_eq!(res.exhausted_proxies, vec![2]);
    }

    #[test]
    fn winner_price_is_capped_by_its_ceiling() {
        let proxies = [proxy(1, 2050, 10)];

        let l = led_by_one(1000);
        let res = resolve(&l, &proxies, 2, manual(2000)).unwrap();
        assert_eq!(res.leader_id, 1);
        assert_eq!(res.new_price, 2050);
    }

    #[test]
    fn leader_raising_ceiling_does_not_move_price() {
        let proxies = [proxy(1, 2000, 10)];

        let l = led_by_one(1500);
        let res = resolve(&l, &proxies, 1, auto(6000)).unwrap();
        assert_eq!(res.new_price, 1500);
        assert_eq!(res.leader_id, 1);
        assert!(res.placed.is_empty());
        assert_eq!(res.extended_end_time, None);
        assert_eq!(res.proxy_upsert.unwrap().max_amount, 6000);
    }

    #[test]
    fn older_proxy_wins_a_tie_between_challengers() {
        let proxies = [proxy(3, 4000, 30)];

        let l = led_by_one(1000);
        let res = resolve(&l, &proxies, 2, auto(4000)).unwrap();
        assert_eq!(res.leader_id, 3);
        assert_eq!(res.new_price, 4000);
        assert_eq!(res.outbid_id, Some(1));
    }

    #[test]
    fn manual_bid_reaching_buy_now_sells_immediately() {
        let proxies = [proxy(1, 20_000, 10)];

        let l = led_by_one(5000);
        let res = resolve(&l, &proxies, 2, manual(12_000)).unwrap();
        assert!(res.sold);
        assert_eq!(res.leader_id, 2);
        assert_eq!(res.new_price, 10_000);
        assert_eq!(res.outbid_id, Some(1));
    }

    #[test]
    fn proxy_war_reaching_buy_now_sells_to_winner() {
        let proxies = [proxy(1, 20_000, 10)];

        let l = led_by_one(5000);
        let res = resolve(&l, &proxies, 2, auto(15_000)).unwrap();
        assert!(res.sold);
        assert_eq!(res.leader_id, 1);
        assert_eq!(res.new_price, 10_000);
        assert_eq!(res.placed[0].amount, 10_000);
    }

    #[test]
    fn extreme_ceilings_do_not_overflow() {
        let mut l = led_by_one(1000);
        l.buy_now_price = None;
        let proxies = [proxy(1, i64::MAX, 10)];

        // 같은 상한의 도전자: 선두가 이기되 가격은 상한까지 올라간다
        let res = resolve(&l, &proxies, 2, auto(i64::MAX)).unwrap();
        assert_eq!(res.leader_id, 1);
        assert_eq!(res.new_price, i64::MAX);
        assert_eq!(res.exhausted_proxies, vec![2]);

        let l = led_by_one(i64::MAX);
        let err = resolve(&l, &[], 1, auto(i64::MAX)).unwrap_err();
        assert_eq!(err, BidRejection::BelowMinimum { minimum: i64::MAX });
    }

    #[test]
    fn huge_bid_step_saturates_the_minimum() {
        let mut l = led_by_one(1000);
        l.bid_step = i64::MAX;
        assert_eq!(l.minimum_bid(), i64::MAX);

        let err = resolve(&l, &[], 2, manual(5000)).unwrap_err();
        assert_eq!(err, BidRejection::BelowMinimum { minimum: i64::MAX });
    }

    #[test]
    fn bid_near_close_extends_the_auction() {
        let mut l = listing();
        l.end_time = now() + Duration::minutes(2);
        let res = resolve(&l, &[], 1, manual(1000)).unwrap();
        assert_eq!(res.extended_end_time, Some(l.end_time + Duration::minutes(10)));

        l.auto_extend = false;
        let res = resolve(&l, &[], 1, manual(1000)).unwrap();
        assert_eq!(res.extended_end_time, None);
    }

    #[test]
    fn bid_far_from_close_does_not_extend() {
        let res = resolve(&listing(), &[], 1, manual(1000)).unwrap();
        assert_eq!(res.extended_end_time, None);
    }

    #[test]
    fn buy_now_requires_a_price() {
        let mut l = listing();
        l.buy_now_price = None;
        assert_eq!(
            resolve_buy_now(&l, &bidder(1), &policy(), now()).unwrap_err(),
            BidRejection::NoBuyNowPrice
        );

        let l = listing();
        let res = resolve_buy_now(&l, &bidder(1), &policy(), now()).unwrap();
        assert!(res.sold);
        assert_eq!(res.new_price, 10_000);
    }

    #[test]
    fn rejecting_the_leader_falls_back_to_next_best_bid() {
        let bids = vec![
            record(1, 1, 1000, 0),
            record(2, 2, 1200, 1),
            record(3, 3, 1200, 2),
            record(4, 4, 1500, 3),
        ];
        let rejected: HashSet<i64> = [4].into_iter().collect();
        assert_eq!(recompute_leader(1000, &bids, &rejected), (1200, Some(2)));

        let rejected: HashSet<i64> = [1, 2, 3, 4].into_iter().collect();
        assert_eq!(recompute_leader(1000, &bids, &rejected), (1000, None));
    }

    #[test]
    fn same_instant_tie_keeps_the_counter_bidding_leader() {
        // 수동 입찰(행 11)과 자동 응찰(행 12)이 같은 시각, 같은 금액으로 기록된 경우
        let bids = vec![
            record(10, 3, 2000, 0),
            record(11, 2, 3000, 5),
            record(12, 1, 3000, 5),
            record(13, 4, 3500, 9),
        ];
        let rejected: HashSet<i64> = [4].into_iter().collect();
        assert_eq!(recompute_leader(1000, &bids, &rejected), (3000, Some(1)));

        // 읽어 온 순서와 무관하다
        let reversed: Vec<BidRecord> = bids.into_iter().rev().collect();
        assert_eq!(recompute_leader(1000, &reversed, &rejected), (3000, Some(1)));
    }
}
