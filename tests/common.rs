#![allow(dead_code)]

use anyhow::Result;
use diesel::connection::SimpleConnection;
use purge::database;
use testcontainers_modules::{
    minio, postgres,
    testcontainers::{runners::AsyncRunner, ContainerAsync},
};

pub const OWNED_TABLES: [&str; 3] = ["trades", "custom_currency_pairs", "profiles"];

pub async fn initialize_s3() -> Result<(ContainerAsync<minio::MinIO>, aws_sdk_s3::Client)> {
    let container = minio::MinIO::default().start().await?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(9000).await?;

    let endpoint = format!("http://{host}:{port}");
    let client = purge::s3::create_client(&endpoint, "minioadmin", "minioadmin", "us-east-1").await;

    Ok((container, client))
}

pub async fn initialize_pg() -> Result<(ContainerAsync<postgres::Postgres>, database::PgPool)> {
    let container = postgres::Postgres::default().start().await?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;

    let conn_str = format!("postgres://postgres:postgres@{host}:{port}/postgres");
    let pool = tokio::task::spawn_blocking(move || database::create_pool(&conn_str)).await??;
    let schema_pool = pool.clone();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = schema_pool.get()?;
        for table in OWNED_TABLES {
            conn.batch_execute(&format!(
                "CREATE TABLE {table} (id SERIAL PRIMARY KEY, user_id UUID NOT NULL)"
            ))?;
        }
        Ok(())
    })
    .await??;

    Ok((container, pool))
}

pub async fn put_object(client: &aws_sdk_s3::Client, bucket: &str, key: &str) -> Result<()> {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(aws_smithy_types::byte_stream::ByteStream::from_static(
            b"to be deleted",
        ))
        .send()
        .await?;
    Ok(())
}

pub async fn count_objects(client: &aws_sdk_s3::Client, bucket: &str, prefix: &str) -> Result<usize> {
    Ok(purge::utils::s3_utils::list_keys_with_prefix(client, bucket, prefix)
        .await?
        .len())
}

pub async fn insert_rows(pool: &database::PgPool, table: &str, owner: uuid::Uuid, n: usize) -> Result<()> {
    let pool = pool.clone();
    let table = table.to_string();
    tokio::task::spawn_blocking(move || -> Result<()> {
        use diesel::RunQueryDsl;

        let mut conn = pool.get()?;
        for _ in 0..n {
            diesel::sql_query(format!("INSERT INTO {table} (user_id) VALUES ($1)"))
                .bind::<diesel::sql_types::Uuid, _>(owner)
                .execute(&mut conn)?;
        }
        Ok(())
    })
    .await?
}

#[derive(diesel::QueryableByName)]
struct RowCount {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    count: i64,
}

pub async fn count_rows(pool: &database::PgPool, table: &str, owner: uuid::Uuid) -> Result<i64> {
    let pool = pool.clone();
    let table = table.to_string();
    tokio::task::spawn_blocking(move || -> Result<i64> {
        use diesel::RunQueryDsl;

        let mut conn = pool.get()?;
        let row: RowCount =
            diesel::sql_query(format!("SELECT COUNT(*) AS count FROM {table} WHERE user_id = $1"))
                .bind::<diesel::sql_types::Uuid, _>(owner)
                .get_result(&mut conn)?;
        Ok(row.count)
    })
    .await?
}
