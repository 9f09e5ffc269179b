/// 사용자 커맨드
/// 1. 프로필 수정
/// 2. 비밀번호 변경
/// 3. 판매자 전환 요청
/// 4. 관심 상품 추가/삭제
// region:    --- Imports
use crate::auth::password::PasswordHasher;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::query::handlers as query;
use crate::users::model::{ChangePasswordRequest, UpdateProfileRequest, User, UserRole};
use tracing::info;

// endregion: --- Imports

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, address, role, is_active, seller_requested_at, created_at";

/// 1. 프로필 수정
pub async fn handle_update_profile(
    db_manager: &DatabaseManager,
    user_id: i64,
    req: UpdateProfileRequest,
) -> AppResult<User> {
    let address = req.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET full_name = $1, address = $2 WHERE id = $3 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(req.full_name.trim())
    .bind(address)
    .bind(user_id)
    .fetch_optional(db_manager.pool())
    .await?
    .ok_or_else(|| AppError::not_found("사용자"))
}

/// 2. 비밀번호 변경 (현재 비밀번호 확인)
pub async fn handle_change_password(
    db_manager: &DatabaseManager,
    hasher: &PasswordHasher,
    user_id: i64,
    req: ChangePasswordRequest,
) -> AppResult<()> {
    let user = query::get_user(db_manager.pool(), user_id).await?;
    hasher
        .compare_password(&user.password_hash, &req.current_password)
        .await
        .map_err(|e| match e {
            AppError::Unauthorized(_) => {
                AppError::BadRequest("현재 비밀번호가 올바르지 않습니다.".to_string())
            }
            other => other,
        })?;

    let password_hash = hasher.hash_password(&req.new_password).await?;
    let mut tx = db_manager.pool().begin().await?;
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    crate::auth::commands::revoke_all_refresh_tokens(&mut tx, user_id).await?;
    tx.commit().await?;

    info!("{:<12} --> 비밀번호 변경 user: {}", "Command", user_id);
    Ok(())
}

/// 3. 판매자 전환 요청
pub async fn handle_seller_request(db_manager: &DatabaseManager, user_id: i64) -> AppResult<User> {
    let user = query::get_user(db_manager.pool(), user_id).await?;
    if user.user_role() != UserRole::Bidder {
        return Err(AppError::Conflict("이미 판매자 권한이 있습니다.".to_string()));
    }
    if user.seller_requested_at.is_some() {
        return Err(AppError::Conflict("이미 판매자 전환을 요청했습니다.".to_string()));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET seller_requested_at = NOW() WHERE id = $1 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_one(db_manager.pool())
    .await?;
    info!("{:<12} --> 판매자 전환 요청 user: {}", "Command", user_id);
    Ok(user)
}

/// 4. 관심 상품 추가
pub async fn handle_add_watch(
    db_manager: &DatabaseManager,
    user_id: i64,
    product_id: i64,
) -> AppResult<()> {
    query::get_product(db_manager.pool(), product_id).await?;
    sqlx::query(
        "INSERT INTO watchlist (user_id, product_id) VALUES ($1, $2)
         ON CONFLICT (user_id, product_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(db_manager.pool())
    .await?;
    Ok(())
}

/// 4. 관심 상품 삭제
pub async fn handle_remove_watch(
    db_manager: &DatabaseManager,
    user_id: i64,
    product_id: i64,
) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(db_manager.pool())
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("관심 상품"));
    }
    Ok(())
}
