//! Socket configuration options
//!
//! Two surfaces share the same knobs:
//! - [`SocketOptions`], a typed builder used when a socket is constructed;
//! - the string-keyed `set_option` / `get_option` calls on a live socket,
//!   which carry an [`OptionValue`].

use bytes::Bytes;
use std::time::Duration;

/// `raw` (bool, read-only): whether the socket is a raw protocol variant.
pub const OPTION_RAW: &str = "raw";

/// `recv-deadline` (duration): how long `recv_msg` waits. Zero waits forever.
pub const OPTION_RECV_DEADLINE: &str = "recv-deadline";

/// `read-qlen` (non-negative int): receive queue capacity.
pub const OPTION_READ_QLEN: &str = "read-qlen";

/// `write-qlen` (non-negative int): per-pipe send queue capacity.
pub const OPTION_WRITE_QLEN: &str = "write-qlen";

/// `subscribe` (bytes or string): add a topic prefix on a cooked subscriber.
pub const OPTION_SUBSCRIBE: &str = "subscribe";

/// `unsubscribe` (bytes or string): remove a topic prefix.
pub const OPTION_UNSUBSCRIBE: &str = "unsubscribe";

/// Default receive queue length.
pub const DEFAULT_READ_QLEN: usize = 128;

/// Default per-pipe send queue length.
pub const DEFAULT_WRITE_QLEN: usize = 128;

/// Dynamically typed option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Boolean flag
    Bool(bool),
    /// Signed integer (lengths are validated as non-negative)
    Int(i64),
    /// Time span
    Duration(Duration),
    /// Binary value
    Bytes(Bytes),
    /// Text value
    Str(String),
}

impl OptionValue {
    /// The value as a bool, if it is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as a duration, if it is one.
    #[must_use]
    pub const fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// The value as a queue length: a non-negative integer.
    #[must_use]
    pub fn as_len(&self) -> Option<usize> {
        match self {
            Self::Int(n) => usize::try_from(*n).ok(),
            _ => None,
        }
    }

    /// The value as raw bytes; strings are accepted as their UTF-8 encoding.
    #[must_use]
    pub fn as_bytes(&self) -> Option<Bytes> {
        match self {
            Self::Bytes(b) => Some(b.clone()),
            Self::Str(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for OptionValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<Duration> for OptionValue {
    fn from(v: Duration) -> Self {
        Self::Duration(v)
    }
}

impl From<Bytes> for OptionValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

/// Initial socket configuration.
///
/// # Examples
///
/// ```
/// use spool_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_recv_deadline(Duration::from_secs(5))
///     .with_read_qlen(16);
/// assert_eq!(opts.read_qlen, 16);
/// ```
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Receive deadline
    ///
    /// - `None`: Block indefinitely (default)
    /// - `Some(duration)`: Fail with `RecvTimeout` after duration
    pub recv_deadline: Option<Duration>,

    /// Receive queue length
    ///
    /// Messages beyond this evict the oldest queued message.
    /// - Default: 128 messages
    pub read_qlen: usize,

    /// Per-pipe send queue length (fan-out protocols)
    ///
    /// A copy that does not fit is dropped rather than blocking the sender.
    /// - Default: 128 messages
    pub write_qlen: usize,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            recv_deadline: None,
            read_qlen: DEFAULT_READ_QLEN,
            write_qlen: DEFAULT_WRITE_QLEN,
        }
    }
}

impl SocketOptions {
    /// Create new socket options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set receive deadline. `Duration::ZERO` means no deadline.
    #[must_use]
    pub fn with_recv_deadline(mut self, deadline: Duration) -> Self {
        self.recv_deadline = (!deadline.is_zero()).then_some(deadline);
        self
    }

    /// Set receive queue length.
    #[must_use]
    pub fn with_read_qlen(mut self, len: usize) -> Self {
        self.read_qlen = len;
        self
    }

    /// Set per-pipe send queue length.
    #[must_use]
    pub fn with_write_qlen(mut self, len: usize) -> Self {
        self.write_qlen = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = SocketOptions::default();
        assert!(opts.recv_deadline.is_none());
        assert_eq!(opts.read_qlen, 128);
        assert_eq!(opts.write_qlen, 128);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = SocketOptions::new()
            .with_recv_deadline(Duration::from_secs(5))
            .with_read_qlen(2)
            .with_write_qlen(4);

        assert_eq!(opts.recv_deadline, Some(Duration::from_secs(5)));
        assert_eq!(opts.read_qlen, 2);
        assert_eq!(opts.write_qlen, 4);
    }

    #[test]
    fn test_zero_deadline_means_none() {
        let opts = SocketOptions::new().with_recv_deadline(Duration::ZERO);
        assert!(opts.recv_deadline.is_none());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(OptionValue::Bool(true).as_bool(), Some(true));
        assert_eq!(OptionValue::Int(3).as_bool(), None);

        assert_eq!(OptionValue::Int(3).as_len(), Some(3));
        assert_eq!(OptionValue::Int(0).as_len(), Some(0));
        assert_eq!(OptionValue::Int(-1).as_len(), None);
        assert_eq!(OptionValue::Bool(false).as_len(), None);

        let d = Duration::from_millis(10);
        assert_eq!(OptionValue::Duration(d).as_duration(), Some(d));
        assert_eq!(OptionValue::Int(10).as_duration(), None);

        assert_eq!(
            OptionValue::from("topic").as_bytes(),
            Some(Bytes::from_static(b"topic"))
        );
        assert_eq!(OptionValue::Int(1).as_bytes(), None);
    }
}
