//! Framing tests for the packet channel: partial reads, trailing bytes,
//! stray frame draining and error frames.

mod common;

use std::io;

use common::{concat, frame, generic_error, result_i32, ScriptedStream};
use proptest::prelude::*;
use scripting_buffers::ByteBuffer;
use scripting_reflect::ReflectError;
use scripting_server::{ExchangeState, PacketChannel, PacketType, ServerConfig};

fn channel(stream: ScriptedStream) -> PacketChannel<ScriptedStream> {
    PacketChannel::new(stream, &ServerConfig::default())
}

fn payload(buf: &ByteBuffer) -> Vec<u8> {
    buf.as_slice().to_vec()
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

#[test]
fn send_patches_header() {
    let mut ch = channel(ScriptedStream::new(Vec::new()));
    ch.begin().unwrap().put_i32(5).unwrap();
    ch.send(PacketType::ObjectGetClass).unwrap();
    assert_eq!(ch.get_ref().written, [30, 0x00, 0x04, 0, 0, 0, 5]);
}

#[test]
fn begin_discards_previous_request() {
    let mut ch = channel(ScriptedStream::new(Vec::new()));
    ch.begin().unwrap().put_i32(1).unwrap();
    ch.begin().unwrap().put_u8(9).unwrap();
    ch.send(PacketType::GetClass).unwrap();
    assert_eq!(ch.get_ref().written, [1, 0x00, 0x01, 9]);
}

#[test]
fn oversized_request_is_not_sent() {
    let stream = ScriptedStream::new(Vec::new());
    let mut ch = PacketChannel::with_capacities(stream, 70_000, 64, 256);
    ch.begin().unwrap().put_bytes(&vec![0u8; 65_536]).unwrap();
    match ch.send(PacketType::MethodInvoke) {
        Err(ReflectError::FrameTooLarge(len)) => assert_eq!(len, 65_539),
        other => panic!("unexpected {other:?}"),
    }
    assert!(ch.get_ref().written.is_empty());
}

// ---------------------------------------------------------------------------
// Receiving
// ---------------------------------------------------------------------------

#[test]
fn recv_exposes_payload_window() {
    let mut ch = channel(ScriptedStream::new(result_i32(0x0102_0304)));
    let buf = ch.recv(PacketType::Result).unwrap();
    assert_eq!(buf.pos(), 3);
    assert_eq!(buf.limit(), 7);
    assert_eq!(buf.get_i32().unwrap(), 0x0102_0304);
    assert_eq!(ch.state(), ExchangeState::Idle);
}

#[test]
fn empty_payload_frame() {
    let mut ch = channel(ScriptedStream::new(frame(100, &[])));
    let buf = ch.recv(PacketType::Result).unwrap();
    assert_eq!(buf.remaining(), 0);
}

#[test]
fn trailing_frame_survives_to_next_recv() {
    let input = concat(&[result_i32(1), result_i32(2)]);
    let mut ch = channel(ScriptedStream::new(input));

    assert_eq!(ch.recv(PacketType::Result).unwrap().get_i32().unwrap(), 1);
    assert_eq!(ch.get_ref().reads, 1);
    assert_eq!(ch.recv(PacketType::Result).unwrap().get_i32().unwrap(), 2);
    assert_eq!(ch.get_ref().reads, 1);
}

#[test]
fn stray_frame_is_drained() {
    let stray = frame(101, &[0xFF, 0xFF, 0xFF, 0xFF]);
    let input = concat(&[stray, result_i32(7)]);
    let mut ch = channel(ScriptedStream::chunked(input, 3));

    assert_eq!(ch.recv(PacketType::Result).unwrap().get_i32().unwrap(), 7);
    assert_eq!(ch.get_ref().unread(), 0);
}

#[test]
fn unknown_type_code_is_drained() {
    let input = concat(&[frame(0xEE, b"junk"), frame(102, &[1])]);
    let mut ch = channel(ScriptedStream::new(input));
    assert_eq!(ch.recv(PacketType::ResultByte).unwrap().get_u8().unwrap(), 1);
}

#[test]
fn generic_error_surfaces_message() {
    let input = concat(&[generic_error("boom"), result_i32(3)]);
    let mut ch = channel(ScriptedStream::new(input));

    match ch.recv(PacketType::Result) {
        Err(ReflectError::Remote(message)) => assert_eq!(message, "boom"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(ch.state(), ExchangeState::Idle);
    // The channel stays usable after an error frame.
    assert_eq!(ch.recv(PacketType::Result).unwrap().get_i32().unwrap(), 3);
}

#[test]
fn eof_is_connection_lost() {
    let mut ch = channel(ScriptedStream::new(Vec::new()));
    match ch.recv(PacketType::Result) {
        Err(ReflectError::ConnectionLost(err)) => {
            assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof)
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn eof_inside_frame_is_connection_lost() {
    let mut truncated = result_i32(9);
    truncated.pop();
    let mut ch = channel(ScriptedStream::chunked(truncated, 2));
    assert!(matches!(
        ch.recv(PacketType::Result),
        Err(ReflectError::ConnectionLost(_))
    ));
}

#[test]
fn expected_frame_larger_than_rx_is_rejected_then_skipped() {
    let input = concat(&[frame(100, &[0u8; 10]), result_i32(4)]);
    let stream = ScriptedStream::chunked(input, 3);
    let mut ch = PacketChannel::with_capacities(stream, 64, 8, 256);
    match ch.recv(PacketType::Result) {
        Err(ReflectError::FrameTooLarge(total)) => assert_eq!(total, 13),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(ch.state(), ExchangeState::Idle);
    assert_eq!(ch.recv(PacketType::Result).unwrap().get_i32().unwrap(), 4);
    assert_eq!(ch.get_ref().unread(), 0);
}

#[test]
fn oversized_stray_frame_is_drained() {
    let config = ServerConfig::from_json_str(r#"{ "rx_capacity": 64 }"#).unwrap();
    let input = concat(&[frame(101, &[0xAB; 100]), result_i32(7)]);
    let mut ch = PacketChannel::new(ScriptedStream::new(input), &config);
    assert_eq!(ch.recv(PacketType::Result).unwrap().get_i32().unwrap(), 7);
    assert_eq!(ch.get_ref().unread(), 0);
}

#[test]
fn oversized_error_frame_fails_once() {
    let message = "x".repeat(40);
    let input = concat(&[generic_error(&message), result_i32(5)]);
    let mut ch = PacketChannel::with_capacities(ScriptedStream::chunked(input, 7), 64, 16, 256);
    assert!(matches!(
        ch.recv(PacketType::Result),
        Err(ReflectError::FrameTooLarge(45))
    ));
    assert_eq!(ch.recv(PacketType::Result).unwrap().get_i32().unwrap(), 5);
}

#[test]
fn read_size_is_capped_by_read_chunk() {
    let input = frame(100, &[7u8; 40]);
    let stream = ScriptedStream::new(input);
    let mut ch = PacketChannel::with_capacities(stream, 64, 128, 8);
    let buf = ch.recv(PacketType::Result).unwrap();
    assert_eq!(payload(buf), vec![7u8; 40]);
    assert_eq!(ch.get_ref().reads, 6);
}

#[test]
fn largest_legal_frame_fits_default_buffers() {
    let body = vec![0xA5u8; u16::MAX as usize];
    let mut ch = channel(ScriptedStream::new(frame(100, &body)));
    let buf = ch.recv(PacketType::Result).unwrap();
    assert_eq!(buf.remaining(), body.len());
}

// ---------------------------------------------------------------------------
// Chunking robustness
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn any_chunking_delivers_same_frames(
        first in proptest::collection::vec(any::<u8>(), 0..64),
        second in proptest::collection::vec(any::<u8>(), 0..64),
        stray in proptest::collection::vec(any::<u8>(), 0..16),
        chunk in 1usize..24,
    ) {
        let input = concat(&[
            frame(100, &first),
            frame(101, &stray),
            frame(100, &second),
        ]);
        let mut ch = channel(ScriptedStream::chunked(input, chunk));
        prop_assert_eq!(payload(ch.recv(PacketType::Result).unwrap()), first);
        prop_assert_eq!(payload(ch.recv(PacketType::Result).unwrap()), second);
        prop_assert_eq!(ch.get_ref().unread(), 0);
    }
}
