/// 카탈로그 커맨드
/// 1. 카테고리 생성/수정/삭제 (관리자)
/// 2. 상품 등록/수정 (판매자, 입찰 전까지)
/// 3. 상품 삭제 → CANCELLED (판매자는 입찰 전, 관리자는 언제든)
// region:    --- Imports
use crate::auction::events::MarketEvent;
use crate::auction::lifecycle::{append_all, deactivate_auto_bids};
use crate::auction::status::AuctionStatus;
use crate::auth::AuthUser;
use crate::catalog::model::{Category, CategoryRequest, CreateProductRequest, Product};
use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::event_store::EventPublisher;
use crate::query::handlers as query;
use crate::query::queries;
use chrono::{DateTime, Utc};
use tracing::info;

// endregion: --- Imports

// region:    --- Categories

fn category_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        return AppError::Conflict("이미 존재하는 카테고리 이름입니다.".to_string());
    }
    let foreign_key_violation =
        matches!(&err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"));
    if foreign_key_violation {
        AppError::BadRequest("상위 카테고리가 존재하지 않습니다.".to_string())
    } else {
        AppError::from(err)
    }
}

pub async fn handle_create_category(
    db_manager: &DatabaseManager,
    req: CategoryRequest,
) -> AppResult<Category> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, parent_id) VALUES ($1, $2) RETURNING id, name, parent_id",
    )
    .bind(req.name.trim())
    .bind(req.parent_id)
    .fetch_one(db_manager.pool())
    .await
    .map_err(category_error)?;
    info!("{:<12} --> 카테고리 생성: {}", "Command", category.name);
    Ok(category)
}

pub async fn handle_update_category(
    db_manager: &DatabaseManager,
    category_id: i64,
    req: CategoryRequest,
) -> AppResult<Category> {
    if req.parent_id == Some(category_id) {
        return Err(AppError::BadRequest(
            "자기 자신을 상위 카테고리로 지정할 수 없습니다.".to_string(),
        ));
    }
    sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $1, parent_id = $2 WHERE id = $3 RETURNING id, name, parent_id",
    )
    .bind(req.name.trim())
    .bind(req.parent_id)
    .bind(category_id)
    .fetch_optional(db_manager.pool())
    .await
    .map_err(category_error)?
    .ok_or_else(|| AppError::not_found("카테고리"))
}

/// 상품이나 하위 카테고리가 있으면 삭제하지 않는다
pub async fn handle_delete_category(
    db_manager: &DatabaseManager,
    category_id: i64,
) -> AppResult<()> {
    let in_use: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM products WHERE category_id = $1)
             OR EXISTS (SELECT 1 FROM categories WHERE parent_id = $1)",
    )
    .bind(category_id)
    .fetch_one(db_manager.pool())
    .await?;
    if in_use {
        return Err(AppError::Conflict(
            "사용 중인 카테고리는 삭제할 수 없습니다.".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(category_id)
        .execute(db_manager.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("카테고리"));
    }
    Ok(())
}

// endregion: --- Categories

// region:    --- Products

/// 시작 시간이 미래면 SCHEDULED, 아니면 ACTIVE
pub fn initial_status(start_time: DateTime<Utc>, now: DateTime<Utc>) -> AuctionStatus {
    if start_time > now {
        AuctionStatus::Scheduled
    } else {
        AuctionStatus::Active
    }
}

async fn ensure_category(db_manager: &DatabaseManager, category_id: i64) -> AppResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(category_id)
        .fetch_one(db_manager.pool())
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::BadRequest("존재하지 않는 카테고리입니다.".to_string()))
    }
}

/// 2. 상품 등록
pub async fn handle_create_product(
    db_manager: &DatabaseManager,
    seller: AuthUser,
    req: CreateProductRequest,
) -> AppResult<Product> {
    seller.require_seller()?;
    ensure_category(db_manager, req.category_id).await?;

    let now = Utc::now();
    let start_time = req.start_time.unwrap_or(now);
    let status = initial_status(start_time, now);

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products AS p (seller_id, category_id, title, description, image_urls,
            starting_price, current_price, bid_step, buy_now_price, start_time, end_time, status,
            auto_extend, allow_unrated_bidders)
         VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING {}",
        queries::PRODUCT_COLUMNS
    ))
    .bind(seller.id)
    .bind(req.category_id)
    .bind(req.title.trim())
    .bind(req.description.trim())
    .bind(&req.image_urls)
    .bind(req.starting_price)
    .bind(req.bid_step)
    .bind(req.buy_now_price)
    .bind(start_time)
    .bind(req.end_time)
    .bind(status.as_str())
    .bind(req.auto_extend)
    .bind(req.allow_unrated_bidders)
    .fetch_one(db_manager.pool())
    .await?;

    info!(
        "{:<12} --> 상품 등록 id: {} seller: {} status: {}",
        "Command", product.id, seller.id, product.status
    );
    Ok(product)
}

/// 2. 상품 수정 (입찰 전, 진행 중/예정 상품만)
pub async fn handle_update_product(
    db_manager: &DatabaseManager,
    seller: AuthUser,
    product_id: i64,
    req: CreateProductRequest,
) -> AppResult<Product> {
    let product = query::get_product(db_manager.pool(), product_id).await?;
    if product.seller_id != seller.id {
        return Err(AppError::Forbidden("본인 상품만 수정할 수 있습니다.".to_string()));
    }
    let status: AuctionStatus = product.status.parse().map_err(AppError::Internal)?;
    if status.is_closed() || product.bid_count > 0 {
        return Err(AppError::Conflict(
            "입찰이 시작된 상품은 수정할 수 없습니다.".to_string(),
        ));
    }
    ensure_category(db_manager, req.category_id).await?;

    let now = Utc::now();
    let start_time = req.start_time.unwrap_or(product.start_time);
    let new_status = initial_status(start_time, now);

    // 읽은 뒤 입찰이 들어왔으면 version 이 달라 갱신되지 않는다
    sqlx::query_as::<_, Product>(&format!(
        "UPDATE products p SET category_id = $1, title = $2, description = $3, image_urls = $4,
            starting_price = $5, current_price = $5, bid_step = $6, buy_now_price = $7,
            start_time = $8, end_time = $9, status = $10, auto_extend = $11,
            allow_unrated_bidders = $12, version = p.version + 1
         WHERE p.id = $13 AND p.version = $14 AND p.bid_count = 0
         RETURNING {}",
        queries::PRODUCT_COLUMNS
    ))
    .bind(req.category_id)
    .bind(req.title.trim())
    .bind(req.description.trim())
    .bind(&req.image_urls)
    .bind(req.starting_price)
    .bind(req.bid_step)
    .bind(req.buy_now_price)
    .bind(start_time)
    .bind(req.end_time)
    .bind(new_status.as_str())
    .bind(req.auto_extend)
    .bind(req.allow_unrated_bidders)
    .bind(product_id)
    .bind(product.version)
    .fetch_optional(db_manager.pool())
    .await?
    .ok_or_else(|| AppError::Conflict("상품이 그 사이 변경되었습니다.".to_string()))
}

/// 3. 상품 삭제 (CANCELLED)
pub async fn handle_delete_product(
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
    user: AuthUser,
    product_id: i64,
) -> AppResult<Product> {
    let product = query::get_product(db_manager.pool(), product_id).await?;
    let status: AuctionStatus = product.status.parse().map_err(AppError::Internal)?;

    if !user.is_admin() {
        if product.seller_id != user.id {
            return Err(AppError::Forbidden("본인 상품만 삭제할 수 있습니다.".to_string()));
        }
        if status.is_closed() || product.bid_count > 0 {
            return Err(AppError::Conflict(
                "입찰이 시작된 상품은 삭제할 수 없습니다.".to_string(),
            ));
        }
    }
    if status == AuctionStatus::Cancelled {
        return Ok(product);
    }

    let mut tx = db_manager.pool().begin().await?;
    let cancelled = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products p SET status = 'CANCELLED', version = p.version + 1
         WHERE p.id = $1 AND p.version = $2 AND (p.bid_count = 0 OR $3)
         RETURNING {}",
        queries::PRODUCT_COLUMNS
    ))
    .bind(product_id)
    .bind(product.version)
    .bind(user.is_admin())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::Conflict("상품이 그 사이 변경되었습니다.".to_string()))?;

    deactivate_auto_bids(&mut tx, product_id).await?;
    let event = MarketEvent::AuctionClosed {
        product_id,
        winner_id: None,
        final_price: None,
        timestamp: Utc::now(),
    };
    let stored = append_all(&mut tx, &[event]).await?;
    tx.commit().await?;

    info!(
        "{:<12} --> 상품 취소 id: {} by: {}",
        "Command", product_id, user.id
    );
    publisher.publish_all(&stored).await;
    Ok(cancelled)
}

// endregion: --- Products

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn future_start_is_scheduled() {
        let now = Utc::now();
        assert_eq!(
            initial_status(now + Duration::hours(1), now),
            AuctionStatus::Scheduled
        );
        assert_eq!(initial_status(now, now), AuctionStatus::Active);
    }
}
