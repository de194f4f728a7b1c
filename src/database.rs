use anyhow::{Context, Result};
use diesel::{prelude, r2d2};

pub type PgPool = r2d2::Pool<r2d2::ConnectionManager<prelude::PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<r2d2::ConnectionManager<prelude::PgConnection>>;

/// Builds the pool. Blocks until the first connections are established.
pub fn create_pool(database_url: &str) -> Result<PgPool> {
    let manager = r2d2::ConnectionManager::<prelude::PgConnection>::new(database_url);

    r2d2::Pool::builder()
        .max_size(10)
        .build(manager)
        .context("Failed to create database pool")
}
