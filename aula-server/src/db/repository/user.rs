//! User Repository

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sqlx::SqlitePool;
use uuid::Uuid;

use shared::models::{User, UserCreate, UserRole, UserUpdate};

use super::{RepoError, RepoResult};

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, display_name, password_hash, role, is_active, created_at, updated_at FROM user WHERE is_active = 1 ORDER BY username",
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, display_name, password_hash, role, is_active, created_at, updated_at FROM user WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, display_name, password_hash, role, is_active, created_at, updated_at FROM user WHERE username = ? LIMIT 1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Create a new user with a freshly hashed password
pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    if find_by_username(pool, &data.username).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "User '{}' already exists",
            data.username
        )));
    }

    let now = shared::util::now_millis();
    let id = Uuid::new_v4().to_string();
    let role = data.role.unwrap_or(UserRole::Student);
    let password_hash = hash_password(&data.password)?;

    sqlx::query(
        "INSERT INTO user (id, username, display_name, password_hash, role, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(&id)
    .bind(&data.username)
    .bind(&data.display_name)
    .bind(&password_hash)
    .bind(role)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

/// Partial update; a present password is re-hashed before persistence
pub async fn update(pool: &SqlitePool, id: &str, data: UserUpdate) -> RepoResult<User> {
    let password_hash = match &data.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE user SET display_name = COALESCE(?, display_name), password_hash = COALESCE(?, password_hash), role = COALESCE(?, role), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(&data.display_name)
    .bind(&password_hash)
    .bind(data.role)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

/// Soft delete
pub async fn delete(pool: &SqlitePool, id: &str) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE user SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Seed the default admin account when the user table is empty
pub async fn ensure_default_admin(pool: &SqlitePool, password: &str) -> RepoResult<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    create(
        pool,
        UserCreate {
            username: "admin".into(),
            display_name: "Administrator".into(),
            password: password.into(),
            role: Some(UserRole::Admin),
        },
    )
    .await?;
    tracing::info!("Seeded default admin account");
    Ok(())
}

/// Hash a password with Argon2id and a fresh salt
pub fn hash_password(password: &str) -> RepoResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RepoError::Database(format!("Password hashing failed: {e}")))
}

/// Verify a password against a stored PHC hash string
pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
