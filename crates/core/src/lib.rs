pub mod domain;
pub mod error;
pub mod ingest;
pub mod pricing;
pub mod scanner;

pub use error::{ArbitrageError, Result};

pub mod config {
    use crate::pricing::fees::{DEFAULT_BASE_FULFILLMENT_FEE, DEFAULT_PER_POUND_RATE};
    use crate::pricing::filter::{DEFAULT_MAX_PRICE, DEFAULT_MIN_ROI};
    use anyhow::Context;
    use std::str::FromStr;

    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_HTTP_RETRIES: u32 = 3;

    /// Timeout and attempt budget for one HTTP collaborator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HttpTuning {
        pub timeout_secs: u64,
        /// Total attempts, always >= 1.
        pub retries: u32,
    }

    impl Default for HttpTuning {
        fn default() -> Self {
            Self {
                timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
                retries: DEFAULT_HTTP_RETRIES,
            }
        }
    }

    impl HttpTuning {
        /// Reads `{prefix}_TIMEOUT_SECS` and `{prefix}_RETRIES`.
        fn from_env(prefix: &str) -> anyhow::Result<Self> {
            let timeout_key = format!("{prefix}_TIMEOUT_SECS");
            let retries_key = format!("{prefix}_RETRIES");
            Self::parse(
                &timeout_key,
                non_empty_var(&timeout_key).as_deref(),
                &retries_key,
                non_empty_var(&retries_key).as_deref(),
            )
        }

        fn parse(
            timeout_key: &str,
            timeout: Option<&str>,
            retries_key: &str,
            retries: Option<&str>,
        ) -> anyhow::Result<Self> {
            let defaults = Self::default();
            let timeout_secs =
                parse_value::<u64>(timeout_key, timeout)?.unwrap_or(defaults.timeout_secs);
            let retries = parse_value::<u32>(retries_key, retries)?.unwrap_or(defaults.retries);
            anyhow::ensure!(timeout_secs > 0, "{timeout_key} must be > 0");
            anyhow::ensure!(retries > 0, "{retries_key} must be > 0");
            Ok(Self {
                timeout_secs,
                retries,
            })
        }
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub base_fulfillment_fee: f64,
        pub per_pound_rate: f64,
        pub default_min_roi: f64,
        pub default_max_price: f64,
        pub catalog_base_url: Option<String>,
        pub catalog_api_key: Option<String>,
        pub catalog_http: HttpTuning,
        pub page_extractor_base_url: Option<String>,
        pub page_extractor_api_key: Option<String>,
        pub page_extractor_http: HttpTuning,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                base_fulfillment_fee: env_f64("FBA_BASE_FULFILLMENT_FEE")?
                    .unwrap_or(DEFAULT_BASE_FULFILLMENT_FEE),
                per_pound_rate: env_f64("FBA_PER_POUND_RATE")?.unwrap_or(DEFAULT_PER_POUND_RATE),
                default_min_roi: env_f64("DEFAULT_MIN_ROI")?.unwrap_or(DEFAULT_MIN_ROI),
                default_max_price: env_f64("DEFAULT_MAX_PRICE")?.unwrap_or(DEFAULT_MAX_PRICE),
                catalog_base_url: non_empty_var("CATALOG_BASE_URL"),
                catalog_api_key: non_empty_var("CATALOG_API_KEY"),
                catalog_http: HttpTuning::from_env("CATALOG")?,
                page_extractor_base_url: non_empty_var("PAGE_EXTRACTOR_BASE_URL"),
                page_extractor_api_key: non_empty_var("PAGE_EXTRACTOR_API_KEY"),
                page_extractor_http: HttpTuning::from_env("PAGE_EXTRACTOR")?,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_catalog_base_url(&self) -> anyhow::Result<&str> {
            self.catalog_base_url
                .as_deref()
                .context("CATALOG_BASE_URL is required")
        }

        pub fn require_page_extractor_base_url(&self) -> anyhow::Result<&str> {
            self.page_extractor_base_url
                .as_deref()
                .context("PAGE_EXTRACTOR_BASE_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    // Unset falls back to the default; a malformed value fails startup.
    fn parse_value<T>(key: &str, raw: Option<&str>) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let Some(raw) = raw else {
            return Ok(None);
        };
        let value = raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} is malformed (got {raw:?})"))?;
        Ok(Some(value))
    }

    fn env_f64(key: &str) -> anyhow::Result<Option<f64>> {
        let value = parse_value::<f64>(key, non_empty_var(key).as_deref())?;
        if let Some(v) = value {
            anyhow::ensure!(v.is_finite(), "{key} must be finite (got {v})");
        }
        Ok(value)
    }

}
