//! Spool Core
//!
//! This crate contains the protocol-agnostic building blocks shared by every
//! Scalable Protocols socket:
//! - Multipart refcounted messages (`message`)
//! - The transport pipe contract and in-process pipes (`pipe`, `inproc`)
//! - One-shot close broadcast (`signal`)
//! - Bounded drop-oldest queue with atomic resize (`queue`)
//! - Socket contract, identities and options (`protocol`, `identity`, `options`)
//! - Topic prefix filtering (`subscription`)
//! - Lifecycle events (`monitor`)
//! - Error types (`error`)

#![deny(unsafe_code)]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
pub mod error;
pub mod identity;
pub mod inproc;
pub mod message;
pub mod monitor;
pub mod options;
pub mod pipe;
pub mod protocol;
pub mod queue;
pub mod signal;
pub mod subscription;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::error::{Result, SpoolError};
    pub use crate::identity::{Info, ProtocolId};
    pub use crate::inproc::{pipe_pair, InprocPipe};
    pub use crate::message::Message;
    pub use crate::monitor::{SocketEvent, SocketMonitor};
    pub use crate::options::{OptionValue, SocketOptions};
    pub use crate::pipe::{Pipe, PipeId};
    pub use crate::protocol::{Context, Protocol};
    pub use crate::queue::{Enqueued, MsgQueue};
    pub use crate::signal::CloseSignal;
    pub use crate::subscription::SubscriptionSet;
}
