#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::adapters::brasil_api::DEFAULT_BRASIL_API_URL;
use crate::adapters::via_cep::DEFAULT_VIA_CEP_URL;
use crate::utils::error::{CepError, Result};
use crate::utils::validation::{validate_range, validate_url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const MAX_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    BrasilApi,
    ViaCep,
}

impl SourceKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            SourceKind::BrasilApi => DEFAULT_BRASIL_API_URL,
            SourceKind::ViaCep => DEFAULT_VIA_CEP_URL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub base_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SourceSettings {
    pub fn defaults() -> Vec<SourceSettings> {
        [SourceKind::BrasilApi, SourceKind::ViaCep]
            .into_iter()
            .map(|kind| SourceSettings {
                kind,
                base_url: kind.default_base_url().to_string(),
                enabled: true,
            })
            .collect()
    }
}

/// CLI 與 TOML 共用的檢查
pub(crate) fn validate_common(
    listen_addr: &str,
    deadline: Duration,
    sources: &[SourceSettings],
) -> Result<()> {
    crate::utils::validation::validate_non_empty_string("listen_addr", listen_addr)?;
    validate_range("timeout_ms", deadline.as_millis() as u64, 1, MAX_TIMEOUT_MS)?;

    let enabled: Vec<&SourceSettings> = sources.iter().filter(|s| s.enabled).collect();
    if enabled.is_empty() {
        return Err(CepError::ConfigValidationError {
            field: "sources".to_string(),
            message: "at least one lookup source must be enabled".to_string(),
        });
    }
    for source in enabled {
        validate_url(&format!("sources.{:?}.base_url", source.kind), &source.base_url)?;
    }

    Ok(())
}
