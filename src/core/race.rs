use crate::core::LookupSource;
use crate::domain::model::{PostalCode, RacePolicy, RaceResult, SourceFailure, Winner};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// 同時啟動所有來源，取第一個成功的結果，並以單一期限保護整場競賽
pub struct RaceCoordinator {
    sources: Vec<Arc<dyn LookupSource>>,
    deadline: Duration,
    policy: RacePolicy,
}

impl RaceCoordinator {
    pub fn new(sources: Vec<Arc<dyn LookupSource>>, deadline: Duration) -> Self {
        Self {
            sources,
            deadline,
            policy: RacePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RacePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn policy(&self) -> RacePolicy {
        self.policy
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn race(&self, code: &PostalCode) -> RaceResult {
        // 容量等於來源數，每個來源只送一次，送出永遠不會阻塞
        let (tx, mut rx) = mpsc::channel(self.sources.len().max(1));

        for source in &self.sources {
            let source = Arc::clone(source);
            let tx = tx.clone();
            let code = code.clone();
            tracing::debug!("Launching lookup on {} for {}", source.name(), code);

            // JoinHandle 直接丟棄：逾時後的任務只會被忽略，不會被中止
            tokio::spawn(async move {
                let outcome = source.resolve(&code).await;
                let _ = tx.send(outcome).await;
            });
        }
        // 只剩來源持有 sender，channel 關閉代表所有來源都回報了
        drop(tx);

        let deadline = tokio::time::sleep(self.deadline);
        tokio::pin!(deadline);

        let mut failures = Vec::new();
        loop {
            tokio::select! {
                received = rx.recv() => {
                    let Some(outcome) = received else {
                        tracing::warn!("All {} source(s) failed for {}", failures.len(), code);
                        return RaceResult::AllFailed(failures);
                    };

                    match outcome.result {
                        Ok(payload) => {
                            tracing::info!("🏁 {} answered first for {}", outcome.source, code);
                            return RaceResult::Won(Winner {
                                source: outcome.source,
                                payload,
                            });
                        }
                        Err(error) => {
                            tracing::warn!("Lookup on {} failed: {}", outcome.source, error);
                            let failure = SourceFailure {
                                source: outcome.source,
                                error,
                            };
                            if self.policy == RacePolicy::FailFast {
                                return RaceResult::FirstFailed(failure);
                            }
                            failures.push(failure);
                        }
                    }
                }
                _ = &mut deadline => {
                    tracing::warn!(
                        "⏰ Race for {} timed out after {:?} ({} failure(s) so far)",
                        code,
                        self.deadline,
                        failures.len()
                    );
                    return RaceResult::TimedOut { failures };
                }
            }
        }
    }
}
