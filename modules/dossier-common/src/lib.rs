pub mod config;
pub mod error;
pub mod profile;
pub mod types;
pub mod urls;

pub use config::Config;
pub use error::DossierError;
pub use types::*;
