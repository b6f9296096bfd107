use crate::adapters::brasil_api::DEFAULT_BRASIL_API_URL;
use crate::adapters::via_cep::DEFAULT_VIA_CEP_URL;
use crate::config::{SourceKind, SourceSettings};
use crate::core::ConfigProvider;
use crate::domain::model::RacePolicy;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "cep-race")]
#[command(about = "Resolve a Brazilian postal code by racing BrasilAPI against ViaCEP")]
pub struct CliConfig {
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    #[arg(long, default_value = "1000", help = "Deadline for the whole race, in milliseconds")]
    pub timeout_ms: u64,

    #[arg(long, value_enum, default_value_t = RacePolicy::WaitForSuccess)]
    pub policy: RacePolicy,

    #[arg(long, default_value = DEFAULT_BRASIL_API_URL)]
    pub brasil_api_url: String,

    #[arg(long, default_value = DEFAULT_VIA_CEP_URL)]
    pub via_cep_url: String,

    #[arg(long, help = "Look up a single postal code and print it instead of serving")]
    pub cep: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    fn deadline(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn race_policy(&self) -> RacePolicy {
        self.policy
    }

    fn sources(&self) -> Vec<SourceSettings> {
        vec![
            SourceSettings {
                kind: SourceKind::BrasilApi,
                base_url: self.brasil_api_url.clone(),
                enabled: true,
            },
            SourceSettings {
                kind: SourceKind::ViaCep,
                base_url: self.via_cep_url.clone(),
                enabled: true,
            },
        ]
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        super::validate_common(&self.listen_addr, self.deadline(), &self.sources())
    }
}
