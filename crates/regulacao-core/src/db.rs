// crates/regulacao-core/src/db.rs

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::error::{EtlError, Result};

pub type DbPool = Pool<Postgres>;

/// Establish a new Postgres connection pool using sensible defaults for the
/// ETL and dashboard services.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Resolve the connection string from the environment.
///
/// Accepts `SUPABASE_DB_URL` with `DATABASE_URL` as fallback, matching the
/// two alias names the deployment scripts have historically used.
pub fn database_url_from_env() -> Result<String> {
    std::env::var("SUPABASE_DB_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(|url| normalize_scheme(&url))
        .map_err(|_| {
            EtlError::Config("SUPABASE_DB_URL (or DATABASE_URL) must be set".to_string())
        })
}

/// Supabase hands out URLs with a bare `postgres://` scheme; rewrite it to
/// the canonical `postgresql://` the driver expects.
pub fn normalize_scheme(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{rest}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_scheme;

    #[test]
    fn rewrites_bare_postgres_scheme() {
        assert_eq!(
            normalize_scheme("postgres://user:pw@host:6543/db"),
            "postgresql://user:pw@host:6543/db"
        );
    }

    #[test]
    fn leaves_canonical_scheme_alone() {
        let url = "postgresql://user:pw@host:5432/db?sslmode=require";
        assert_eq!(normalize_scheme(url), url);
    }
}
