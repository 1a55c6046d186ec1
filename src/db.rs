use std::{str::FromStr, time::Duration};

use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    errors::AppError,
    models::{Directory, NewDirectory, NewUser, User},
    utils::hash_password,
};

/// Timestamp text for `dated`. Matches the column default so rows sort the
/// same whether they were written here or by hand.
fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Opens (creating if needed) the SQLite database and applies pending migrations.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .read_only(false)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(opts)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    log::info!("Database migrated successfully");
    Ok(pool)
}

/// A private in-memory database. The pool holds a single connection that
/// never expires, since every new connection would see an empty database.
#[cfg(test)]
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    Ok(pool)
}

pub async fn create_user(pool: &SqlitePool, new_user: NewUser) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"INSERT INTO "user" (username, email, dated, is_deleted) VALUES ($1, $2, $3, FALSE) RETURNING *"#,
    )
    .bind(new_user.username)
    .bind(new_user.email)
    .bind(now_timestamp())
    .fetch_one(pool)
    .await?;
    log::info!("{} created", user);
    Ok(user)
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE user_id = $1"#)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = $1"#)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_all_users(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" ORDER BY user_id"#)
        .fetch_all(pool)
        .await?;
    Ok(users)
}

/// Hashes `password` and stores it on the user, returning the updated row.
pub async fn set_user_password(
    pool: &SqlitePool,
    user_id: i64,
    password: &str,
) -> Result<User, AppError> {
    let pwd_hash = hash_password(password)?;
    let user = sqlx::query_as::<_, User>(
        r#"UPDATE "user" SET password_hash = $1 WHERE user_id = $2 RETURNING *"#,
    )
    .bind(pwd_hash)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    log::info!("Password set for {}", user);
    Ok(user)
}

/// Flags the user as deleted. The row, and with it the username and email,
/// stays in place.
pub async fn soft_delete_user(pool: &SqlitePool, user_id: i64) -> Result<(), AppError> {
    sqlx::query(r#"UPDATE "user" SET is_deleted = TRUE WHERE user_id = $1"#)
        .bind(user_id)
        .execute(pool)
        .await?;
    log::info!("User with id {} marked deleted", user_id);
    Ok(())
}

pub async fn create_directory(
    pool: &SqlitePool,
    new_directory: NewDirectory,
) -> Result<Directory, AppError> {
    let directory = sqlx::query_as::<_, Directory>(
        "INSERT INTO directories (financial_year, category, description, filepath, dated, is_deleted, user_id) \
         VALUES ($1, $2, $3, $4, $5, FALSE, $6) RETURNING *",
    )
    .bind(new_directory.financial_year)
    .bind(new_directory.category)
    .bind(new_directory.description)
    .bind(new_directory.filepath)
    .bind(now_timestamp())
    .bind(new_directory.user_id)
    .fetch_one(pool)
    .await?;
    log::info!("{} created", directory);
    Ok(directory)
}

pub async fn get_directory_by_id(
    pool: &SqlitePool,
    directories_id: i64,
) -> Result<Option<Directory>, AppError> {
    let directory =
        sqlx::query_as::<_, Directory>("SELECT * FROM directories WHERE directories_id = $1")
            .bind(directories_id)
            .fetch_optional(pool)
            .await?;
    Ok(directory)
}

pub async fn get_all_directories(pool: &SqlitePool) -> Result<Vec<Directory>, AppError> {
    let directories =
        sqlx::query_as::<_, Directory>("SELECT * FROM directories ORDER BY directories_id")
            .fetch_all(pool)
            .await?;
    Ok(directories)
}

/// The directories owned by a user, oldest first. Queried on demand rather
/// than carried on `User`.
pub async fn directories_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Directory>, AppError> {
    let directories = sqlx::query_as::<_, Directory>(
        "SELECT * FROM directories WHERE user_id = $1 ORDER BY dated, directories_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(directories)
}

pub async fn directory_author(pool: &SqlitePool, directory: &Directory) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE user_id = $1"#)
        .bind(directory.user_id)
        .fetch_one(pool)
        .await?;
    Ok(user)
}

pub async fn soft_delete_directory(pool: &SqlitePool, directories_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE directories SET is_deleted = TRUE WHERE directories_id = $1")
        .bind(directories_id)
        .execute(pool)
        .await?;
    log::info!("Directory with id {} marked deleted", directories_id);
    Ok(())
}
