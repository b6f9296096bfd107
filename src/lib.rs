pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::TomlConfig;
pub use core::{handler::RequestHandler, race::RaceCoordinator};
pub use domain::model::{AddressPayload, LookupOutcome, PostalCode, RacePolicy, RaceResult, Winner};
pub use utils::error::{CepError, LookupError, Result};
