//! Length-prefixed packet framing over one byte stream.

use std::io::{self, Read, Write};

use scripting_buffers::ByteBuffer;
use scripting_reflect::{ReflectError, Result};
use tracing::{debug, trace, warn};

use crate::packet::{PacketType, HEADER_LEN, MAX_PAYLOAD_LEN};
use crate::ServerConfig;

/// Where the channel stands within one request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sending,
    Awaiting,
    Delivered,
    /// An unexpected frame was dropped; waiting resumes.
    DrainedRetry,
    Failed,
}

/// Frames requests and responses over a blocking stream.
///
/// One request is in flight at a time. Both buffers are allocated once and
/// reused for every exchange. A socket read may carry several frames, or
/// only part of one; bytes past the frame being handled stay buffered for
/// the next call.
pub struct PacketChannel<S> {
    stream: S,
    tx: ByteBuffer,
    rx: ByteBuffer,
    read_chunk: usize,
    /// Bytes held in `rx`, counted from its start.
    buffered: usize,
    /// Length of the frame handed out by the last `recv`.
    delivered: usize,
    /// Bytes of an oversized frame still to be discarded.
    skip: usize,
    state: ExchangeState,
}

impl<S: Read + Write> PacketChannel<S> {
    pub fn new(stream: S, config: &ServerConfig) -> Self {
        Self::with_capacities(stream, config.tx_capacity, config.rx_capacity, config.read_chunk)
    }

    pub fn with_capacities(
        stream: S,
        tx_capacity: usize,
        rx_capacity: usize,
        read_chunk: usize,
    ) -> Self {
        let mut rx = ByteBuffer::new(rx_capacity.max(HEADER_LEN));
        rx.clear();
        Self {
            stream,
            tx: ByteBuffer::new(tx_capacity.max(HEADER_LEN)),
            rx,
            read_chunk: read_chunk.max(1),
            buffered: 0,
            delivered: 0,
            skip: 0,
            state: ExchangeState::Idle,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Starts a new request and returns the buffer to write its payload to.
    pub fn begin(&mut self) -> Result<&mut ByteBuffer> {
        self.tx.clear();
        self.tx.ensure_len(HEADER_LEN, None)?;
        Ok(&mut self.tx)
    }

    /// Patches the header of the pending request and writes it out.
    pub fn send(&mut self, packet: PacketType) -> Result<()> {
        let len = self.tx.pos();
        let payload_len = len.saturating_sub(HEADER_LEN);
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(ReflectError::FrameTooLarge(len));
        }
        self.tx.put_u8_at(0, packet as u8)?;
        self.tx.put_u16_at(1, payload_len as u16)?;

        self.transition(ExchangeState::Sending);
        let written = self
            .stream
            .write_all(self.tx.filled())
            .and_then(|()| self.stream.flush());
        if let Err(err) = written {
            self.fail();
            return Err(ReflectError::ConnectionLost(err));
        }
        debug!(packet = ?packet, payload_len, "sent packet");
        Ok(())
    }

    /// Blocks until a frame of type `expected` arrives and returns its payload.
    ///
    /// A generic error frame aborts the wait with its message. Frames of any
    /// other type are logged and dropped. A frame that doesn't fit `rx` is
    /// discarded as it streams in; it fails the wait with `FrameTooLarge` only
    /// when it was the expected or an error frame.
    pub fn recv(&mut self, expected: PacketType) -> Result<&mut ByteBuffer> {
        if self.delivered > 0 {
            let delivered = std::mem::take(&mut self.delivered);
            self.compact(delivered)?;
        }
        self.transition(ExchangeState::Awaiting);
        match self.await_frame(expected) {
            Ok(()) => {
                self.transition(ExchangeState::Delivered);
                self.transition(ExchangeState::Idle);
                Ok(&mut self.rx)
            }
            Err(err) => {
                self.fail();
                Err(err)
            }
        }
    }

    /// Sends the pending request and waits for its response.
    pub fn exchange(
        &mut self,
        request: PacketType,
        response: PacketType,
    ) -> Result<&mut ByteBuffer> {
        self.send(request)?;
        self.recv(response)
    }

    fn await_frame(&mut self, expected: PacketType) -> Result<()> {
        let mut frame_len = None;
        loop {
            if self.skip > 0 {
                if self.buffered == 0 {
                    self.fill()?;
                }
                let dropped = self.skip.min(self.buffered);
                self.compact(dropped)?;
                self.skip -= dropped;
                continue;
            }

            if frame_len.is_none() && self.buffered >= HEADER_LEN {
                let total = self.rx.get_u16_at(1)? as usize + HEADER_LEN;
                if total > self.rx.capacity() {
                    let packet = self.rx.get_u8_at(0)?;
                    self.skip = total;
                    if packet == expected as u8 || packet == PacketType::GenericError as u8 {
                        return Err(ReflectError::FrameTooLarge(total));
                    }
                    warn!(
                        expected = ?expected,
                        got = ?PacketType::try_from(packet),
                        len = total,
                        "oversized packet of unexpected type, dropping it"
                    );
                    self.transition(ExchangeState::DrainedRetry);
                    self.transition(ExchangeState::Awaiting);
                    continue;
                }
                frame_len = Some(total);
            }

            if let Some(total) = frame_len.filter(|&total| self.buffered >= total) {
                let packet = self.rx.get_u8_at(0)?;
                if packet == expected as u8 {
                    self.rx.set_window(HEADER_LEN, total)?;
                    self.delivered = total;
                    debug!(packet = ?expected, payload_len = total - HEADER_LEN, "received packet");
                    return Ok(());
                }
                if packet == PacketType::GenericError as u8 {
                    self.rx.set_window(HEADER_LEN, total)?;
                    self.delivered = total;
                    let message = self.rx.get_string()?;
                    debug!(%message, "received generic error");
                    return Err(ReflectError::Remote(message));
                }
                warn!(
                    expected = ?expected,
                    got = ?PacketType::try_from(packet),
                    len = total,
                    "invalid received packet type, dropping it"
                );
                self.transition(ExchangeState::DrainedRetry);
                self.compact(total)?;
                frame_len = None;
                self.transition(ExchangeState::Awaiting);
                continue;
            }

            self.fill()?;
        }
    }

    /// Performs one socket read into the free tail of `rx`.
    fn fill(&mut self) -> Result<()> {
        let want = self.read_chunk.min(self.rx.remaining());
        let read = loop {
            match self.stream.read(&mut self.rx.spare_mut()[..want]) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(ReflectError::ConnectionLost(err)),
            }
        };
        if read == 0 {
            return Err(ReflectError::ConnectionLost(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "target closed the connection",
            )));
        }
        self.rx.advance(read)?;
        self.buffered += read;
        trace!(read, buffered = self.buffered, "socket read");
        Ok(())
    }

    /// Drops the first `count` buffered bytes and reopens `rx` for reading.
    fn compact(&mut self, count: usize) -> Result<()> {
        self.rx.clear();
        self.rx.set_pos(self.buffered)?;
        self.rx.lshift(count);
        self.buffered = self.rx.pos();
        Ok(())
    }

    fn fail(&mut self) {
        self.transition(ExchangeState::Failed);
        self.transition(ExchangeState::Idle);
    }

    fn transition(&mut self, next: ExchangeState) {
        trace!(from = ?self.state, to = ?next, "exchange state");
        self.state = next;
    }
}
