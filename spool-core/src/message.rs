//! Multipart messages moved between pipes and sockets.
//!
//! A [`Message`] is a list of reference-counted `Bytes` frames. Cloning a
//! message only bumps refcounts, which is how fan-out protocols duplicate a
//! payload for several pipes. Releasing a message is dropping it.

use crate::pipe::PipeId;
use bytes::Bytes;
use smallvec::SmallVec;
use std::io;

/// A multipart message with ergonomic frame construction.
///
/// # Examples
///
/// ```
/// use spool_core::message::Message;
///
/// let msg = Message::new()
///     .push_str("topic")
///     .push(&b"data"[..]);
/// assert_eq!(msg.len(), 2);
/// assert_eq!(msg.topic(), b"topic");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    frames: SmallVec<[Bytes; 4]>,
    /// Pipe the message arrived on, set by the receiving socket.
    pipe: Option<PipeId>,
}

impl Message {
    /// Create a new empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a message from existing frames.
    #[must_use]
    pub fn from_frames(frames: Vec<Bytes>) -> Self {
        Self {
            frames: SmallVec::from_vec(frames),
            pipe: None,
        }
    }

    /// Append a frame. Anything convertible to `Bytes` works, and `Bytes`
    /// itself is moved in without copying.
    #[must_use]
    pub fn push(mut self, frame: impl Into<Bytes>) -> Self {
        self.frames.push(frame.into());
        self
    }

    /// Append a UTF-8 frame.
    #[must_use]
    pub fn push_str(mut self, s: &str) -> Self {
        self.frames.push(Bytes::copy_from_slice(s.as_bytes()));
        self
    }

    /// Append a zero-length frame (delimiter).
    #[must_use]
    pub fn push_empty(mut self) -> Self {
        self.frames.push(Bytes::new());
        self
    }

    /// Get the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the message has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total payload size across all frames.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.frames.iter().map(Bytes::len).sum()
    }

    /// Get a reference to the frames.
    #[must_use]
    pub fn frames(&self) -> &[Bytes] {
        &self.frames
    }

    /// The first frame, used as the topic by pub/sub filtering.
    ///
    /// Empty when the message has no frames.
    #[must_use]
    pub fn topic(&self) -> &[u8] {
        self.frames.first().map_or(&[][..], |f| f.as_ref())
    }

    /// Consume the message and return the frames.
    #[must_use]
    pub fn into_frames(self) -> Vec<Bytes> {
        self.frames.into_vec()
    }

    /// Pipe the message was received on, if any.
    #[must_use]
    pub const fn pipe(&self) -> Option<PipeId> {
        self.pipe
    }

    /// Record the pipe the message was received on.
    pub fn set_pipe(&mut self, pipe: PipeId) {
        self.pipe = Some(pipe);
    }

    /// Try to parse a frame as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame doesn't exist or isn't valid UTF-8.
    pub fn parse_frame_str(&self, index: usize) -> io::Result<&str> {
        let frame = self
            .frames
            .get(index)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Frame index out of bounds"))?;

        std::str::from_utf8(frame).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl From<Vec<Bytes>> for Message {
    fn from(frames: Vec<Bytes>) -> Self {
        Self::from_frames(frames)
    }
}

impl From<Bytes> for Message {
    fn from(body: Bytes) -> Self {
        Self::new().push(body)
    }
}

impl From<Message> for Vec<Bytes> {
    fn from(msg: Message) -> Self {
        msg.into_frames()
    }
}
