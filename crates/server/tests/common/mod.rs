//! Scripted in-memory stream standing in for the agent's socket.

#![allow(dead_code)]

use std::io::{self, Read, Write};

use scripting_server::ServerConfig;

/// Replays canned response bytes in fixed-size chunks and records every
/// request byte written to it.
pub struct ScriptedStream {
    input: Vec<u8>,
    cursor: usize,
    chunk: usize,
    pub written: Vec<u8>,
    pub reads: usize,
}

impl ScriptedStream {
    pub fn new(input: Vec<u8>) -> Self {
        Self::chunked(input, usize::MAX)
    }

    pub fn chunked(input: Vec<u8>, chunk: usize) -> Self {
        Self {
            input,
            cursor: 0,
            chunk: chunk.max(1),
            written: Vec::new(),
            reads: 0,
        }
    }

    pub fn unread(&self) -> usize {
        self.input.len() - self.cursor
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let n = buf.len().min(self.chunk).min(self.unread());
        buf[..n].copy_from_slice(&self.input[self.cursor..self.cursor + n]);
        self.cursor += n;
        Ok(n)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds one frame: type, big-endian payload length, payload.
pub fn frame(packet: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![packet];
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// A `RESULT` frame carrying one `i32`.
pub fn result_i32(value: i32) -> Vec<u8> {
    frame(100, &value.to_be_bytes())
}

/// A `GENERIC_ERROR` frame.
pub fn generic_error(message: &str) -> Vec<u8> {
    frame(110, &string(message))
}

/// A `u16` length-prefixed UTF-8 string.
pub fn string(s: &str) -> Vec<u8> {
    let mut out = (s.len() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(s.as_bytes());
    out
}

pub fn concat(frames: &[Vec<u8>]) -> Vec<u8> {
    frames.concat()
}

pub fn config() -> ServerConfig {
    ServerConfig::default()
}
