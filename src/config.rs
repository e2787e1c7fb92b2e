use std::env;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;
use url::Url;

pub const DEFAULT_INDEX: &str = "search-360ace";
pub const DEFAULT_API_VERSION: &str = "2024-02-01";
pub const DEFAULT_COST_PER_1K: f64 = 0.002;
pub const DEFAULT_MIN_MATCH_PERCENT: u8 = 70;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("either ELASTICSEARCH_URL or CLOUD_ID must be set")]
    NoSearchEndpoint,

    #[error("invalid CLOUD_ID: {0}")]
    InvalidCloudId(String),

    #[error("invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("invalid number in {var}: '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Credential that must never show up in logs.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct ElasticConfig {
    pub base_url: String,
    pub api_key: Secret,
    pub index: String,
    pub min_match_percent: u8,
}

#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub endpoint: String,
    pub api_key: Secret,
    pub deployment: String,
    pub api_version: String,
}

/// Per-1000-token prices used for the cost estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_1k: DEFAULT_COST_PER_1K,
            output_per_1k: DEFAULT_COST_PER_1K,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub elastic: ElasticConfig,
    pub azure: AzureConfig,
    pub pricing: Pricing,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let base_url = match (get("ELASTICSEARCH_URL"), get("CLOUD_ID")) {
            (Some(url), _) => validate_url("ELASTICSEARCH_URL", &url)?,
            (None, Some(cloud_id)) => decode_cloud_id(&cloud_id)?,
            (None, None) => return Err(ConfigError::NoSearchEndpoint),
        };

        let min_match_percent = match get("KEYWORD_MIN_MATCH") {
            Some(v) => v
                .trim_end_matches('%')
                .parse::<u8>()
                .ok()
                .filter(|p| (1..=100).contains(p))
                .ok_or(ConfigError::InvalidNumber {
                    var: "KEYWORD_MIN_MATCH",
                    value: v,
                })?,
            None => DEFAULT_MIN_MATCH_PERCENT,
        };

        let elastic = ElasticConfig {
            base_url,
            api_key: Secret::new(require("ES_API_KEY")?),
            index: get("SEARCH_INDEX").unwrap_or_else(|| DEFAULT_INDEX.to_string()),
            min_match_percent,
        };

        let azure = AzureConfig {
            endpoint: validate_url("AZURE_OPENAI_ENDPOINT", &require("AZURE_OPENAI_ENDPOINT")?)?,
            api_key: Secret::new(require("AZURE_OPENAI_API_KEY")?),
            deployment: require("AZURE_OPENAI_DEPLOYMENT_NAME")?,
            api_version: get("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        };

        let pricing = Pricing {
            input_per_1k: parse_rate(&get, "OPENAI_INPUT_COST_PER_1K")?,
            output_per_1k: parse_rate(&get, "OPENAI_OUTPUT_COST_PER_1K")?,
        };

        debug!(
            endpoint = %elastic.base_url,
            index = %elastic.index,
            deployment = %azure.deployment,
            "configuration loaded"
        );
        Ok(Self {
            elastic,
            azure,
            pricing,
        })
    }
}

fn parse_rate(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<f64, ConfigError> {
    match get(var) {
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite() && *r >= 0.0)
            .ok_or(ConfigError::InvalidNumber { var, value: v }),
        None => Ok(DEFAULT_COST_PER_1K),
    }
}

fn validate_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { var, source })?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Resolves an Elastic Cloud id (`name:base64(host$es_uuid$kibana_uuid)`)
/// to the Elasticsearch HTTPS endpoint.
pub fn decode_cloud_id(cloud_id: &str) -> Result<String, ConfigError> {
    let encoded = cloud_id
        .split_once(':')
        .map_or(cloud_id, |(_, rest)| rest);
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ConfigError::InvalidCloudId(e.to_string()))?;
    let decoded =
        String::from_utf8(bytes).map_err(|e| ConfigError::InvalidCloudId(e.to_string()))?;

    let mut parts = decoded.split('$');
    let host = parts.next().filter(|h| !h.is_empty());
    let es_uuid = parts.next().filter(|u| !u.is_empty());
    let (Some(host), Some(es_uuid)) = (host, es_uuid) else {
        return Err(ConfigError::InvalidCloudId(
            "expected host$es_uuid$kibana_uuid".to_string(),
        ));
    };

    let url = match host.split_once(':') {
        Some((domain, port)) => format!("https://{es_uuid}.{domain}:{port}"),
        None => format!("https://{es_uuid}.{host}"),
    };
    validate_url("CLOUD_ID", &url)
}
