use crate::application::metrics_assembler::DEFAULT_NAMESPACE_LABEL;
use crate::domain::query::DEFAULT_RAW_AGGREGATOR;
use serde::Deserialize;

const CONFIG_FILE: &str = "config/dashboards";
const ENV_PREFIX: &str = "DASHBOARDS";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub prometheus: PrometheusSettings,
    #[serde(default)]
    pub templates: TemplatesSettings,
    #[serde(default)]
    pub dashboards: DashboardsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrometheusSettings {
    pub url: String,
    /// Per-request timeout for backend calls
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for PrometheusSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9090".to_string(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplatesSettings {
    pub directory: String,
}

impl Default for TemplatesSettings {
    fn default() -> Self {
        Self {
            directory: "templates".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardsSettings {
    /// Scope holding default templates, overridable per namespace
    #[serde(default)]
    pub global_namespace: Option<String>,
    #[serde(default = "default_namespace_label")]
    pub namespace_label: String,
    #[serde(default = "default_raw_data_aggregator")]
    pub raw_data_aggregator: String,
}

impl Default for DashboardsSettings {
    fn default() -> Self {
        Self {
            global_namespace: None,
            namespace_label: default_namespace_label(),
            raw_data_aggregator: default_raw_data_aggregator(),
        }
    }
}

fn default_namespace_label() -> String {
    DEFAULT_NAMESPACE_LABEL.to_string()
}

fn default_raw_data_aggregator() -> String {
    DEFAULT_RAW_AGGREGATOR.to_string()
}

/// Loads `config/dashboards.{toml,yaml,json}` when present, then `DASHBOARDS__*` env vars
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    build_config(config::File::with_name(CONFIG_FILE).required(false))
}

fn build_config<S>(file: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
