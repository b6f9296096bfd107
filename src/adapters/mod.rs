// Adapters layer: concrete implementations for external systems (lookup services, inbound http)

pub mod brasil_api;
pub mod http_server;
pub mod via_cep;

use crate::config::{SourceKind, SourceSettings};
use crate::core::LookupSource;
use crate::utils::error::{CepError, LookupError, Result};
use reqwest::Client;
use std::sync::Arc;
use url::Url;

pub use brasil_api::BrasilApiSource;
pub use via_cep::ViaCepSource;

/// 依設定建立啟用中的來源，順序與設定相同
pub fn build_sources(settings: &[SourceSettings], client: &Client) -> Result<Vec<Arc<dyn LookupSource>>> {
    let mut sources: Vec<Arc<dyn LookupSource>> = Vec::new();

    for setting in settings.iter().filter(|s| s.enabled) {
        let source: Arc<dyn LookupSource> = match setting.kind {
            SourceKind::BrasilApi => Arc::new(BrasilApiSource::new(client.clone(), &setting.base_url)?),
            SourceKind::ViaCep => Arc::new(ViaCepSource::new(client.clone(), &setting.base_url)?),
        };
        tracing::debug!("Configured source {} at {}", source.name(), setting.base_url);
        sources.push(source);
    }

    Ok(sources)
}

pub(crate) fn ensure_hierarchical(field: &str, url: &Url) -> Result<()> {
    if url.cannot_be_a_base() {
        return Err(CepError::InvalidConfigValueError {
            field: field.to_string(),
            value: url.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// 發出 GET 並讀完 body；非 2xx 視為傳輸錯誤
pub(crate) async fn get_body(client: &Client, url: Url) -> std::result::Result<Vec<u8>, LookupError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    tracing::debug!("Lookup response status: {}", status);

    if !status.is_success() {
        return Err(LookupError::Transport(format!("unexpected status {}", status)));
    }

    Ok(response.bytes().await?.to_vec())
}
