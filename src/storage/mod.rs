pub mod pending;

pub use pending::{PendingRequest, PendingStatus, PendingStore, StoreError};
