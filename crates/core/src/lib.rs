pub mod domain;
pub mod ingest;
pub mod model;
pub mod predict;
pub mod service;
pub mod signals;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub quote_base_url: Option<String>,
        pub model_dir: Option<String>,
        pub model_serving_url: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                quote_base_url: non_empty_var("QUOTE_BASE_URL"),
                model_dir: non_empty_var("MODEL_DIR"),
                model_serving_url: non_empty_var("MODEL_SERVING_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_model_dir(&self) -> anyhow::Result<&str> {
            self.model_dir.as_deref().context("MODEL_DIR is required")
        }

        pub fn require_model_serving_url(&self) -> anyhow::Result<&str> {
            self.model_serving_url
                .as_deref()
                .context("MODEL_SERVING_URL is required")
        }

        /// The model path is enabled only when both its settings are present.
        pub fn model_configured(&self) -> bool {
            self.model_dir.is_some() && self.model_serving_url.is_some()
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
