//! Terminal chat client speaking the relay's submit-then-poll protocol.

mod relay_client;
mod session;
mod terminal;

pub use relay_client::{ClientError, PendingReply, PollPolicy, RelayClient};
pub use session::ChatSession;
pub use terminal::run_terminal_chat;
