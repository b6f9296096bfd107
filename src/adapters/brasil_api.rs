use crate::core::LookupSource;
use crate::domain::model::{AddressPayload, BrasilApiAddress, LookupOutcome, PostalCode};
use crate::utils::error::{CepError, LookupError, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

pub const DEFAULT_BRASIL_API_URL: &str = "https://brasilapi.com.br";

pub struct BrasilApiSource {
    client: Client,
    base_url: Url,
}

impl BrasilApiSource {
    pub const NAME: &'static str = "BrasilAPI";

    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| CepError::InvalidConfigValueError {
            field: "brasil_api.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        super::ensure_hierarchical("brasil_api.base_url", &base_url)?;
        Ok(Self { client, base_url })
    }

    /// `{base}/api/cep/v1/{code}`
    pub fn endpoint(&self, code: &PostalCode) -> Url {
        super::join_segments(&self.base_url, &["api", "cep", "v1", code.as_str()])
    }

    async fn fetch(&self, code: &PostalCode) -> std::result::Result<BrasilApiAddress, LookupError> {
        let url = self.endpoint(code);
        tracing::debug!("Making BrasilAPI request to: {}", url);

        let body = super::get_body(&self.client, url).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl LookupSource for BrasilApiSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn resolve(&self, code: &PostalCode) -> LookupOutcome {
        match self.fetch(code).await {
            Ok(address) => LookupOutcome::success(Self::NAME, AddressPayload::BrasilApi(address)),
            Err(e) => LookupOutcome::failure(Self::NAME, e),
        }
    }
}
