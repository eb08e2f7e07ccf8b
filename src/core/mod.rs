pub mod config;
pub mod config_loader;
pub mod error;
pub mod traits;

pub use config::PublisherConfig;
pub use config_loader::{ConfigLoadOptions, ConfigLoader};
pub use error::*;
pub use traits::*;
