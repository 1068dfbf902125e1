//! Adapter implementations for registry ports.

mod dialog;
mod loopback;
mod memory;

pub use dialog::DialogTrustPrompter;
pub use loopback::{InitializeReply, LoopbackDelegate, LoopbackTransport};
pub use memory::{InMemoryTrustNonceBearer, RecordingNotificationService, StaticTrustPrompter};
