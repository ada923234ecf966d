//! # MedAudit Chat
//!
//! Per-request technical discussion channel.
//!
//! A message is appended to the local log optimistically (with a `temp-`
//! placeholder id) before publication; the server echo replaces the
//! placeholder in place, and a failed publication rolls it back. The bus is
//! an in-process tokio broadcast fan-out keyed by request id; a durable
//! transport implements the same [`MessageChannel`] trait.

pub mod bus;
pub mod log;
pub mod message;
pub mod session;

pub use bus::{BroadcastBus, MessageChannel};
pub use log::ChatLog;
pub use message::{ChatMessage, ChatError};
pub use session::ChatService;
