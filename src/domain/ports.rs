use crate::config::SourceSettings;
use crate::domain::model::{LookupOutcome, PostalCode, RacePolicy};
use async_trait::async_trait;
use std::time::Duration;

/// 外部地址查詢服務。每次 `resolve` 只發一個請求並回傳一個結果，
/// 失敗以 `LookupOutcome::failure` 表示，不會 panic。
#[async_trait]
pub trait LookupSource: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self, code: &PostalCode) -> LookupOutcome;
}

pub trait ConfigProvider: Send + Sync {
    fn listen_addr(&self) -> &str;
    fn deadline(&self) -> Duration;
    fn race_policy(&self) -> RacePolicy;
    fn sources(&self) -> Vec<SourceSettings>;
}
