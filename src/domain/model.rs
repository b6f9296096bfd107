use crate::utils::error::LookupError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 呼叫端傳入的郵遞區號 (CEP)，核心不做格式驗證
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// BrasilAPI `/api/cep/v1/{cep}` 回傳格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrasilApiAddress {
    pub cep: String,
    pub state: String,
    pub city: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub service: String,
}

/// ViaCEP `/ws/{cep}/json/` 回傳格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViaCepAddress {
    pub cep: String,
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub complemento: String,
    #[serde(default)]
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
}

/// 每個來源保留自己的原生格式，不做合併
#[derive(Debug, Clone, PartialEq)]
pub enum AddressPayload {
    BrasilApi(BrasilApiAddress),
    ViaCep(ViaCepAddress),
}

impl AddressPayload {
    pub fn postal_code(&self) -> &str {
        match self {
            AddressPayload::BrasilApi(a) => &a.cep,
            AddressPayload::ViaCep(a) => &a.cep,
        }
    }

    pub fn street(&self) -> &str {
        match self {
            AddressPayload::BrasilApi(a) => &a.street,
            AddressPayload::ViaCep(a) => &a.logradouro,
        }
    }

    pub fn neighborhood(&self) -> &str {
        match self {
            AddressPayload::BrasilApi(a) => &a.neighborhood,
            AddressPayload::ViaCep(a) => &a.bairro,
        }
    }

    pub fn city(&self) -> &str {
        match self {
            AddressPayload::BrasilApi(a) => &a.city,
            AddressPayload::ViaCep(a) => &a.localidade,
        }
    }

    pub fn region(&self) -> &str {
        match self {
            AddressPayload::BrasilApi(a) => &a.state,
            AddressPayload::ViaCep(a) => &a.uf,
        }
    }
}

/// 一個來源對一次查詢產生的唯一結果
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub source: String,
    pub result: std::result::Result<AddressPayload, LookupError>,
}

impl LookupOutcome {
    pub fn success(source: impl Into<String>, payload: AddressPayload) -> Self {
        Self {
            source: source.into(),
            result: Ok(payload),
        }
    }

    pub fn failure(source: impl Into<String>, error: LookupError) -> Self {
        Self {
            source: source.into(),
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Winner {
    pub source: String,
    pub payload: AddressPayload,
}

impl Winner {
    pub fn to_view(&self) -> AddressView {
        AddressView {
            source: self.source.clone(),
            postal_code: self.payload.postal_code().to_string(),
            street: self.payload.street().to_string(),
            neighborhood: self.payload.neighborhood().to_string(),
            city: self.payload.city().to_string(),
            state: self.payload.region().to_string(),
        }
    }

    pub fn render_text(&self) -> String {
        format!(
            "Fastest source: {}\n\nPostal code: {}\nStreet: {}\nNeighborhood: {}\nCity: {}\nState: {}\n",
            self.source,
            self.payload.postal_code(),
            self.payload.street(),
            self.payload.neighborhood(),
            self.payload.city(),
            self.payload.region(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source: String,
    pub error: LookupError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// 一場競賽的終態，每場只會產生一個
#[derive(Debug, Clone, PartialEq)]
pub enum RaceResult {
    Won(Winner),
    AllFailed(Vec<SourceFailure>),
    /// `FailFast` 下第一個到達的結果是失敗，其他來源可能仍在執行
    FirstFailed(SourceFailure),
    TimedOut { failures: Vec<SourceFailure> },
}

impl RaceResult {
    pub fn winner(&self) -> Option<&Winner> {
        match self {
            RaceResult::Won(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RaceResult::TimedOut { .. })
    }
}

/// 第一個到達的結果是失敗時，競賽該怎麼處理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum RacePolicy {
    /// 記錄失敗並繼續等待其他來源，直到成功、全部失敗或逾時
    #[default]
    WaitForSuccess,
    /// 第一個結果即為終局
    FailFast,
}

impl fmt::Display for RacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RacePolicy::WaitForSuccess => f.write_str("wait-for-success"),
            RacePolicy::FailFast => f.write_str("fail-fast"),
        }
    }
}

/// JSON 回應用的扁平地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressView {
    pub source: String,
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}
