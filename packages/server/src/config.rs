//! Server configuration from environment variables.

use std::time::Duration;

use fakesense_pipeline::PipelineConfig;
use fakesense_server_models::DEFAULT_LIST_LIMIT;

/// Runtime settings for the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Stage delays (`FAKESENSE_*_DELAY_MS`).
    pub pipeline: PipelineConfig,
    /// Fixed seed for pipeline and scanner randomness
    /// (`FAKESENSE_RANDOM_SEED`). `None` seeds from OS entropy.
    pub random_seed: Option<u64>,
    /// Cases returned by the list endpoint when no limit is given
    /// (`FAKESENSE_DEFAULT_LIST_LIMIT`).
    pub default_list_limit: usize,
    /// Prefix of generated report links (`FAKESENSE_EXPORT_BASE_URL`).
    pub export_base_url: String,
}

/// Default prefix of generated report links.
pub const DEFAULT_EXPORT_BASE_URL: &str = "https://fakesense.vercel.app/api/export";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            pipeline: PipelineConfig::default(),
            random_seed: None,
            default_list_limit: DEFAULT_LIST_LIMIT,
            export_base_url: DEFAULT_EXPORT_BASE_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment. Unset or
    /// unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable by name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |name: &str, default: Duration| {
            parse_var::<u64>(name, lookup(name)).map_or(default, Duration::from_millis)
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_var("PORT", lookup("PORT")).unwrap_or(defaults.port),
            pipeline: PipelineConfig {
                intake_delay: millis(
                    "FAKESENSE_INTAKE_DELAY_MS",
                    defaults.pipeline.intake_delay,
                ),
                analysis_delay: millis(
                    "FAKESENSE_ANALYSIS_DELAY_MS",
                    defaults.pipeline.analysis_delay,
                ),
                decoy_start_delay: millis(
                    "FAKESENSE_DECOY_START_DELAY_MS",
                    defaults.pipeline.decoy_start_delay,
                ),
                decoy_delay: millis("FAKESENSE_DECOY_DELAY_MS", defaults.pipeline.decoy_delay),
            },
            random_seed: parse_var("FAKESENSE_RANDOM_SEED", lookup("FAKESENSE_RANDOM_SEED")),
            default_list_limit: parse_var(
                "FAKESENSE_DEFAULT_LIST_LIMIT",
                lookup("FAKESENSE_DEFAULT_LIST_LIMIT"),
            )
            .unwrap_or(defaults.default_list_limit),
            export_base_url: lookup("FAKESENSE_EXPORT_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.export_base_url),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        log::warn!("Ignoring invalid value for {name}: {value:?}");
    }
    parsed
}
