use anyhow::{Context, Result};
use aws_sdk_s3::{
    types::{Delete, ObjectIdentifier},
    Client,
};

/// Upper bound S3 puts on a single DeleteObjects call.
pub const MAX_KEYS_PER_DELETE: usize = 1000;

pub async fn list_keys_with_prefix(
    s3_client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let page = s3_client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation_token.take())
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to list objects under '{}' in bucket '{}'",
                    prefix, bucket
                )
            })?;

        keys.extend(
            page.contents()
                .iter()
                .filter_map(|obj| obj.key())
                .map(str::to_string),
        );

        match page.next_continuation_token() {
            Some(token) if page.is_truncated().unwrap_or(false) => {
                continuation_token = Some(token.to_string());
            }
            _ => break,
        }
    }

    Ok(keys)
}

pub async fn delete_keys(s3_client: &Client, bucket: &str, keys: &[String]) -> Result<()> {
    for chunk in keys.chunks(MAX_KEYS_PER_DELETE) {
        let objects = chunk
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to build object identifiers")?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .context("Failed to build delete request")?;

        let output = s3_client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .with_context(|| format!("Failed to delete objects from bucket '{}'", bucket))?;

        if let Some(first) = output.errors().first() {
            anyhow::bail!(
                "S3 refused to delete {} object(s) from bucket '{}', first: {} ({})",
                output.errors().len(),
                bucket,
                first.key().unwrap_or("<unknown key>"),
                first.message().unwrap_or("no message"),
            );
        }
    }

    Ok(())
}
