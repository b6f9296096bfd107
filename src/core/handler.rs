use crate::adapters::build_sources;
use crate::core::race::RaceCoordinator;
use crate::core::ConfigProvider;
use crate::domain::model::{PostalCode, RaceResult, Winner};
use crate::utils::error::{CepError, Result};
use reqwest::Client;

/// 對外邊界：取出郵遞區號、發起競賽、把結果轉成呼叫端看得懂的錯誤或地址
pub struct RequestHandler {
    coordinator: RaceCoordinator,
}

impl RequestHandler {
    pub fn new(coordinator: RaceCoordinator) -> Self {
        Self { coordinator }
    }

    /// 依設定建立 HTTP client、來源與協調器
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cep-race/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let sources = build_sources(&config.sources(), &client)?;

        let coordinator =
            RaceCoordinator::new(sources, config.deadline()).with_policy(config.race_policy());
        Ok(Self::new(coordinator))
    }

    pub fn coordinator(&self) -> &RaceCoordinator {
        &self.coordinator
    }

    /// 缺少或空白的郵遞區號會在競賽開始前直接拒絕
    pub fn extract_postal_code(raw: Option<&str>) -> Result<PostalCode> {
        match raw.map(str::trim) {
            Some(code) if !code.is_empty() => Ok(PostalCode::new(code)),
            _ => Err(CepError::MissingPostalCode),
        }
    }

    pub async fn handle(&self, raw: Option<&str>) -> Result<Winner> {
        let code = Self::extract_postal_code(raw)?;
        self.lookup(&code).await
    }

    pub async fn lookup(&self, code: &PostalCode) -> Result<Winner> {
        match self.coordinator.race(code).await {
            RaceResult::Won(winner) => Ok(winner),
            RaceResult::TimedOut { .. } => Err(CepError::Timeout {
                deadline_ms: self.coordinator.deadline().as_millis() as u64,
            }),
            RaceResult::AllFailed(failures) => Err(CepError::Unresolved { failures }),
            RaceResult::FirstFailed(failure) => Err(CepError::FirstResponseFailed { failure }),
        }
    }
}
