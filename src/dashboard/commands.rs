/// 관리자 커맨드
/// 1. 역할 변경 (판매자 승인 포함)
/// 2. 계정 정지/해제
/// 3. 경매 설정 변경
///
/// 역할 변경과 정지는 리프레시 토큰을 모두 폐기한다. 발급된 액세스 토큰은 만료까지 유효하다.
// region:    --- Imports
use crate::auction::settings::AuctionSettings;
use crate::auth::commands::revoke_all_refresh_tokens;
use crate::config::AuctionDefaults;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::users::model::{User, UserRole};
use tracing::info;

// endregion: --- Imports

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, address, role, is_active, seller_requested_at, created_at";

/// 1. 역할 변경
pub async fn handle_update_role(
    db_manager: &DatabaseManager,
    admin_id: i64,
    user_id: i64,
    role: UserRole,
) -> AppResult<User> {
    if admin_id == user_id && role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "자신의 관리자 권한은 해제할 수 없습니다.".to_string(),
        ));
    }

    let mut tx = db_manager.pool().begin().await?;
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET role = $1, seller_requested_at = NULL WHERE id = $2 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(role.as_str())
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("사용자"))?;
    revoke_all_refresh_tokens(&mut tx, user_id).await?;
    tx.commit().await?;

    info!("{:<12} --> 역할 변경 user: {} -> {}", "Command", user_id, role);
    Ok(user)
}

/// 2. 계정 정지/해제
pub async fn handle_set_active(
    db_manager: &DatabaseManager,
    admin_id: i64,
    user_id: i64,
    is_active: bool,
) -> AppResult<User> {
    if admin_id == user_id && !is_active {
        return Err(AppError::BadRequest("자신의 계정은 정지할 수 없습니다.".to_string()));
    }

    let mut tx = db_manager.pool().begin().await?;
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_active = $1 WHERE id = $2 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(is_active)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("사용자"))?;
    if !is_active {
        revoke_all_refresh_tokens(&mut tx, user_id).await?;
    }
    tx.commit().await?;

    info!("{:<12} --> 계정 활성 상태 user: {} -> {}", "Command", user_id, is_active);
    Ok(user)
}

pub async fn handle_get_settings(
    db_manager: &DatabaseManager,
    defaults: AuctionDefaults,
) -> AppResult<AuctionSettings> {
    let mut conn = db_manager.pool().acquire().await?;
    Ok(AuctionSettings::load(&mut conn, defaults).await?)
}

/// 3. 경매 설정 변경
pub async fn handle_update_settings(
    db_manager: &DatabaseManager,
    settings: AuctionSettings,
) -> AppResult<AuctionSettings> {
    let mut conn = db_manager.pool().acquire().await?;
    settings.save(&mut conn).await?;
    info!("{:<12} --> 경매 설정 변경 {:?}", "Command", settings);
    Ok(settings)
}
