use crate::core::LookupSource;
use crate::domain::model::{AddressPayload, LookupOutcome, PostalCode, ViaCepAddress};
use crate::utils::error::{CepError, LookupError, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

pub const DEFAULT_VIA_CEP_URL: &str = "http://viacep.com.br";

pub struct ViaCepSource {
    client: Client,
    base_url: Url,
}

impl ViaCepSource {
    pub const NAME: &'static str = "ViaCEP";

    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| CepError::InvalidConfigValueError {
            field: "via_cep.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        super::ensure_hierarchical("via_cep.base_url", &base_url)?;
        Ok(Self { client, base_url })
    }

    /// `{base}/ws/{code}/json/`
    pub fn endpoint(&self, code: &PostalCode) -> Url {
        super::join_segments(&self.base_url, &["ws", code.as_str(), "json", ""])
    }

    async fn fetch(&self, code: &PostalCode) -> std::result::Result<ViaCepAddress, LookupError> {
        let url = self.endpoint(code);
        tracing::debug!("Making ViaCEP request to: {}", url);

        let body = super::get_body(&self.client, url).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;

        // 查無此 CEP 時 ViaCEP 仍回 200，內容為 {"erro": true}
        if is_erro_flag(value.get("erro")) {
            return Err(LookupError::Decode(format!(
                "ViaCEP reported unknown postal code {}",
                code
            )));
        }

        Ok(serde_json::from_value(value)?)
    }
}

fn is_erro_flag(flag: Option<&serde_json::Value>) -> bool {
    match flag {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s == "true",
        _ => false,
    }
}

#[async_trait]
impl LookupSource for ViaCepSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn resolve(&self, code: &PostalCode) -> LookupOutcome {
        match self.fetch(code).await {
            Ok(address) => LookupOutcome::success(Self::NAME, AddressPayload::ViaCep(address)),
            Err(e) => LookupOutcome::failure(Self::NAME, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_resolve_success() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/ws/01001000/json/");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "cep": "01001-000",
                    "logradouro": "Praça da Sé",
                    "complemento": "lado ímpar",
                    "bairro": "Sé",
                    "localidade": "São Paulo",
                    "uf": "SP",
                    "ibge": "3550308"
                }));
        });

        let source = ViaCepSource::new(Client::new(), &server.base_url()).unwrap();
        let outcome = source.resolve(&PostalCode::new("01001000")).await;

        api_mock.assert();
        assert_eq!(outcome.source, "ViaCEP");
        let payload = outcome.result.unwrap();
        assert_eq!(payload.postal_code(), "01001-000");
        assert_eq!(payload.neighborhood(), "Sé");
        assert_eq!(payload.region(), "SP");
    }

    #[tokio::test]
    async fn test_erro_body_is_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ws/99999999/json/");
            then.status(200).json_body(serde_json::json!({"erro": "true"}));
        });

        let source = ViaCepSource::new(Client::new(), &server.base_url()).unwrap();
        let outcome = source.resolve(&PostalCode::new("99999999")).await;

        assert!(matches!(outcome.result, Err(LookupError::Decode(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ws/01001000/json/");
            then.status(200).body("<html>maintenance</html>");
        });

        let source = ViaCepSource::new(Client::new(), &server.base_url()).unwrap();
        let outcome = source.resolve(&PostalCode::new("01001000")).await;

        assert_eq!(outcome.source, "ViaCEP");
        assert!(matches!(outcome.result, Err(LookupError::Decode(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        // 綁定後立即釋放，確保該埠沒有人在聽
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = ViaCepSource::new(Client::new(), &format!("http://{}", addr)).unwrap();
        let outcome = source.resolve(&PostalCode::new("01001000")).await;

        assert!(matches!(outcome.result, Err(LookupError::Transport(_))));
    }

    #[test]
    fn test_endpoint_has_trailing_slash() {
        let source = ViaCepSource::new(Client::new(), DEFAULT_VIA_CEP_URL).unwrap();
        let url = source.endpoint(&PostalCode::new("01001000"));
        assert_eq!(url.as_str(), "http://viacep.com.br/ws/01001000/json/");
    }
}
