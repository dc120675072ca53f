//! Reflection error type.

use std::io;

use scripting_buffers::BufferError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReflectError>;

/// Errors surfaced by [`Runtime`](crate::Runtime) operations.
///
/// The three `*NotFound` variants mean the remote agent explicitly answered
/// "not found"; they are recoverable and never memoized. `Remote` carries a
/// generic error message sent back by the agent verbatim.
#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("class '{0}' not found")]
    ClassNotFound(String),
    #[error("field '{name}' not found in class '{class}'")]
    FieldNotFound { class: String, name: String },
    #[error("method '{name}' not found in class '{class}'")]
    MethodNotFound { class: String, name: String },
    #[error("remote error: {0}")]
    Remote(String),
    #[error("value {value} is not suitable for type {target}")]
    TypeMismatch { value: String, target: String },
    #[error("parameters count doesn't match, got {got}, expected {expected}")]
    ArgumentCount { expected: usize, got: usize },
    #[error("{0} values exceed the 255 entries a packet can carry")]
    TooManyArguments(usize),
    #[error("handle @{pointer:08X} belongs to another runtime")]
    ForeignHandle { pointer: i32 },
    #[error("can't wrap null object as {0}")]
    NullWrap(&'static str),
    #[error("expected {expected}, remote returned {got}")]
    UnexpectedValue { expected: &'static str, got: String },
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("frame of {0} bytes doesn't fit the packet buffers")]
    FrameTooLarge(usize),
    #[error("no target connected")]
    NotConnected,
    #[error("connection lost")]
    ConnectionLost(#[source] io::Error),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl ReflectError {
    /// True when the remote answered "not found" for a class or member.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReflectError::ClassNotFound(_)
                | ReflectError::FieldNotFound { .. }
                | ReflectError::MethodNotFound { .. }
        )
    }
}

impl From<io::Error> for ReflectError {
    fn from(err: io::Error) -> Self {
        ReflectError::ConnectionLost(err)
    }
}
