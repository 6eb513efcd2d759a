pub mod errors;
pub mod id;

pub use errors::{BridgeError, ConfigError, DecodeError};
pub use id::{new_id, RequestId, RequestIdAllocator, SessionId};

pub type Result<T> = std::result::Result<T, BridgeError>;
