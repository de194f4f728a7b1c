use aws_config::{meta::region::RegionProviderChain, BehaviorVersion};
use aws_sdk_s3::{
    config::{Credentials, Region},
    Client,
};

pub async fn create_client(
    s3_url: &str,
    s3_access_key: &str,
    s3_secret_key: &str,
    s3_region: &str,
) -> Client {
    let region_provider =
        RegionProviderChain::first_try(Region::new(s3_region.to_string())).or_default_provider();
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let s3_config = aws_sdk_s3::config::Builder::from(&config)
        .endpoint_url(s3_url)
        .credentials_provider(Credentials::new(
            s3_access_key,
            s3_secret_key,
            None,
            None,
            "purge",
        ))
        .force_path_style(true)
        .build();

    Client::from_conf(s3_config)
}
