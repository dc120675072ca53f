//! Packet catalog shared with the in-target agent.
//!
//! Every packet is a 3-byte header (`type:u8`, `length:u16` big-endian,
//! payload length only) followed by the payload. The type codes are fixed by
//! the agent and must not change.

/// Size of the packet header.
pub const HEADER_LEN: usize = 3;

/// Largest payload the `u16` length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Largest complete frame, header included.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

/// Packet type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// `name:string` → `Result(index:i32)`.
    GetClass = 1,
    /// `owner:i32, name:string, field_type:i32` → `Result(index:i32)`.
    GetField = 2,
    /// `owner:i32, name:string, count:u8, params:i32[]` → `Result(index:i32)`.
    /// The empty name selects a constructor.
    GetMethod = 3,
    /// `field:i32, owner:i32` → `Result(value)`.
    FieldGet = 10,
    /// `field:i32, owner:i32, value` → `Result` (empty ack).
    FieldSet = 11,
    /// `exec:i32, owner:i32, count:u8, args[]` → `Result(value)`.
    MethodInvoke = 20,
    /// `obj:i32` → `ResultClass(index:i32, name:string)`.
    ObjectGetClass = 30,
    /// `cls:i32, obj:i32` → `ResultByte(0 | 1)`.
    ObjectIsInstance = 31,
    Result = 100,
    ResultClass = 101,
    ResultByte = 102,
    /// `message:string`, may answer any request.
    GenericError = 110,
}

impl TryFrom<u8> for PacketType {
    type Error = u8;
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            1 => Ok(Self::GetClass),
            2 => Ok(Self::GetField),
            3 => Ok(Self::GetMethod),
            10 => Ok(Self::FieldGet),
            11 => Ok(Self::FieldSet),
            20 => Ok(Self::MethodInvoke),
            30 => Ok(Self::ObjectGetClass),
            31 => Ok(Self::ObjectIsInstance),
            100 => Ok(Self::Result),
            101 => Ok(Self::ResultClass),
            102 => Ok(Self::ResultByte),
            110 => Ok(Self::GenericError),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for ty in [
            PacketType::GetClass,
            PacketType::GetField,
            PacketType::GetMethod,
            PacketType::FieldGet,
            PacketType::FieldSet,
            PacketType::MethodInvoke,
            PacketType::ObjectGetClass,
            PacketType::ObjectIsInstance,
            PacketType::Result,
            PacketType::ResultClass,
            PacketType::ResultByte,
            PacketType::GenericError,
        ] {
            assert_eq!(PacketType::try_from(ty as u8), Ok(ty));
        }
        assert_eq!(PacketType::try_from(40), Err(40));
    }
}
