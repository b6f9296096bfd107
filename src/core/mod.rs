pub mod handler;
pub mod race;

pub use crate::domain::model::{LookupOutcome, PostalCode, RaceResult};
pub use crate::domain::ports::{ConfigProvider, LookupSource};
pub use crate::utils::error::Result;
