/// 인증 커맨드
/// 1. 회원가입
/// 2. 로그인
/// 3. 토큰 갱신 (리프레시 토큰은 1회용)
/// 4. 로그아웃
// region:    --- Imports
use crate::auth::jwt::{JwtManager, TokenType};
use crate::auth::model::{
    normalize_email, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse,
};
use crate::auth::password::PasswordHasher;
use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::query::handlers as query;
use crate::users::model::User;
use chrono::Utc;
use sqlx::PgConnection;
use tracing::{info, warn};

// endregion: --- Imports

/// 1. 회원가입
pub async fn register(
    db_manager: &DatabaseManager,
    hasher: &PasswordHasher,
    req: RegisterRequest,
) -> AppResult<User> {
    let email = normalize_email(&req.email);
    info!("{:<12} --> 회원가입 요청: {}", "Auth", email);

    if query::find_user_by_email(db_manager, &email).await?.is_some() {
        return Err(AppError::Conflict("이미 사용 중인 이메일입니다.".to_string()));
    }

    let password_hash = hasher.hash_password(&req.password).await?;
    let address = req.address.filter(|a| !a.trim().is_empty());

    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, full_name, address)
         VALUES ($1, $2, $3, $4)
         RETURNING id, email, password_hash, full_name, address, role, is_active, seller_requested_at, created_at",
    )
    .bind(&email)
    .bind(password_hash)
    .bind(req.full_name.trim())
    .bind(address)
    .fetch_one(db_manager.pool())
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("이미 사용 중인 이메일입니다.".to_string())
        } else {
            AppError::from(e)
        }
    })
}

/// 2. 로그인
pub async fn login(
    db_manager: &DatabaseManager,
    hasher: &PasswordHasher,
    jwt: &JwtManager,
    req: LoginRequest,
) -> AppResult<TokenResponse> {
    let email = normalize_email(&req.email);
    info!("{:<12} --> 로그인 요청: {}", "Auth", email);

    let invalid = || AppError::Unauthorized("이메일 또는 비밀번호가 올바르지 않습니다.".to_string());
    let user = query::find_user_by_email(db_manager, &email)
        .await?
        .ok_or_else(invalid)?;
    hasher.compare_password(&user.password_hash, &req.password).await?;

    if !user.is_active {
        warn!("{:<12} --> 정지된 계정 로그인 시도: {}", "Auth", user.id);
        return Err(AppError::Forbidden("정지된 계정입니다.".to_string()));
    }

    let mut conn = db_manager.pool().acquire().await?;
    issue_tokens(&mut conn, jwt, user).await
}

/// 3. 토큰 갱신
/// 사용한 리프레시 토큰은 즉시 폐기되고 새 토큰 쌍을 발급한다.
pub async fn refresh(
    db_manager: &DatabaseManager,
    jwt: &JwtManager,
    req: RefreshRequest,
) -> AppResult<TokenResponse> {
    let claims = jwt.verify_token(&req.refresh_token, TokenType::Refresh)?;

    let mut tx = db_manager.pool().begin().await?;
    let owner: Option<i64> = sqlx::query_scalar(
        "UPDATE refresh_tokens SET revoked = TRUE
         WHERE token = $1 AND revoked = FALSE AND expires_at > NOW()
         RETURNING user_id",
    )
    .bind(&req.refresh_token)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = owner.filter(|id| *id == claims.sub) else {
        warn!("{:<12} --> 폐기되었거나 알 수 없는 리프레시 토큰 user: {}", "Auth", claims.sub);
        return Err(AppError::Unauthorized("유효하지 않은 토큰입니다.".to_string()));
    };

    let user = query::get_user(&mut *tx, user_id).await?;
    if !user.is_active {
        return Err(AppError::Unauthorized("정지된 계정입니다.".to_string()));
    }

    let tokens = issue_tokens(&mut tx, jwt, user).await?;
    tx.commit().await?;
    info!("{:<12} --> 토큰 갱신 user: {}", "Auth", user_id);
    Ok(tokens)
}

/// 4. 로그아웃
pub async fn logout(db_manager: &DatabaseManager, req: RefreshRequest) -> AppResult<()> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE token = $1")
        .bind(&req.refresh_token)
        .execute(db_manager.pool())
        .await?;
    Ok(())
}

/// 사용자의 모든 리프레시 토큰 폐기 (정지, 역할 변경)
pub async fn revoke_all_refresh_tokens(conn: &mut PgConnection, user_id: i64) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE",
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

async fn issue_tokens(
    conn: &mut PgConnection,
    jwt: &JwtManager,
    user: User,
) -> AppResult<TokenResponse> {
    let role = user.user_role();
    let access_token = jwt.generate_token(user.id, role, TokenType::Access)?;
    let refresh_token = jwt.generate_token(user.id, role, TokenType::Refresh)?;

    sqlx::query("INSERT INTO refresh_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)")
        .bind(user.id)
        .bind(&refresh_token)
        .bind(Utc::now() + jwt.refresh_ttl())
        .execute(conn)
        .await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        user,
    })
}
