use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use thiserror::Error;
use url::Url;
use ws_broadcast_core::dispatch::DEFAULT_MAX_IN_FLIGHT;
use ws_broadcast_core::store::DEFAULT_PAGE_SIZE;

pub const TABLE_NAME_KEY: &str = "AWS_TABLE_NAME";
pub const QUEUE_URL_KEY: &str = "AWS_SQS_URL";
pub const WEBSOCKET_URL_KEY: &str = "AWS_WEBSOCKET_URL";
pub const REGION_KEY: &str = "AWS_REGION";
pub const PAGE_SIZE_KEY: &str = "BROADCAST_PAGE_SIZE";
pub const MAX_IN_FLIGHT_KEY: &str = "BROADCAST_MAX_IN_FLIGHT";

pub const DEFAULT_TABLE_NAME: &str = "websocket-connections";
pub const DEFAULT_QUEUE_URL: &str =
    "https://sqs.us-east-1.amazonaws.com/000000000000/websocket-broadcast-queue";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),

    #[error("{key} is not a valid URL: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{key} has no host: {value}")]
    MissingHost { key: &'static str, value: String },

    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    pub table_name: String,
    pub queue_url: String,
    pub websocket_url: Option<String>,
    pub region: Option<String>,
    pub page_size: u32,
    pub max_in_flight: usize,
}

impl BroadcastConfig {
    /// Reads the process environment, after loading `.env` when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            table_name: value(TABLE_NAME_KEY).unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            queue_url: value(QUEUE_URL_KEY).unwrap_or_else(|| DEFAULT_QUEUE_URL.to_string()),
            websocket_url: value(WEBSOCKET_URL_KEY),
            region: value(REGION_KEY),
            page_size: parse_positive(PAGE_SIZE_KEY, value(PAGE_SIZE_KEY), DEFAULT_PAGE_SIZE)?,
            max_in_flight: parse_positive(
                MAX_IN_FLIGHT_KEY,
                value(MAX_IN_FLIGHT_KEY),
                DEFAULT_MAX_IN_FLIGHT,
            )?,
        })
    }

    /// Shared SDK configuration. An explicit `AWS_REGION` wins, then the
    /// SDK's default provider chain, then [`DEFAULT_REGION`].
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let region = RegionProviderChain::first_try(self.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));
        aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await
    }

    /// Gateway endpoint for the management API: the WebSocket URL with its
    /// scheme replaced by `https` and any trailing slash dropped.
    pub fn gateway_endpoint(&self) -> Result<String, ConfigError> {
        let raw = self
            .websocket_url
            .as_deref()
            .ok_or(ConfigError::Missing(WEBSOCKET_URL_KEY))?;
        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            key: WEBSOCKET_URL_KEY,
            source,
        })?;
        let host = url.host_str().ok_or_else(|| ConfigError::MissingHost {
            key: WEBSOCKET_URL_KEY,
            value: raw.to_string(),
        })?;

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let path = url.path().trim_end_matches('/');
        Ok(format!("https://{authority}{path}"))
    }
}

fn parse_positive<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}
