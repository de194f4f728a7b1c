use regex::Regex;
use std::sync::LazyLock;

/// Lowercase S3-style bucket name.
pub static BUCKET_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").unwrap());

/// Unquoted Postgres identifier, capped at the default NAMEDATALEN.
pub static SQL_IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").unwrap());
