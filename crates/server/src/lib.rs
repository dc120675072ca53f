//! Host side of the scripting bridge.
//!
//! The in-target agent connects to a [`ScriptingServer`]; every reflection
//! operation then becomes one framed request/response exchange on that
//! connection.
//!
//! # Overview
//!
//! - [`packet`] - packet type codes and header layout
//! - [`PacketChannel`] - framing with partial reads and stray frame draining
//! - [`value`] - tagged value encoding
//! - [`RemoteRuntime`] - [`Runtime`](scripting_reflect::Runtime) over any
//!   blocking byte stream
//! - [`ScriptingServer`] - TCP listener owning the single connection
//! - [`ServerConfig`] - socket and buffer settings

mod channel;
mod config;
pub mod packet;
mod runtime;
mod server;
pub mod value;

pub use channel::{ExchangeState, PacketChannel};
pub use config::{ConfigError, ServerConfig};
pub use packet::PacketType;
pub use runtime::RemoteRuntime;
pub use server::{ConnectionState, ScriptingServer};
