pub mod ids;
pub mod types;
pub mod wire;

pub use ids::MessageIdGenerator;
pub use types::{ChatMessage, FALLBACK_REPLY, PROCESSING_ACK, Sender, iso_timestamp};
