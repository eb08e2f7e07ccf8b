pub mod channel_validator;
pub mod sdk_version;

pub use channel_validator::{is_valid_release_channel, validate_release_channel};
pub use sdk_version::sdk_label;
