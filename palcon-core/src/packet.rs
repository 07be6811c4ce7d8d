//! RCON packet layout and the pure encode/decode functions.
//!
//! ```text
//!  0        4            8            12           12+n   12+n+2
//!  ┌────────┬────────────┬────────────┬────────────┬──────┐
//!  │  size  │ request_id │    type    │    body    │ 0 0  │
//!  └────────┴────────────┴────────────┴────────────┴──────┘
//! ```
//!
//! All integers are 32-bit signed little-endian. `size` counts every byte
//! after itself: id, type, body and the two null terminators.

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::RconError;
use crate::latin1;

/// Bytes taken by `request_id` and `type`.
pub const HEADER_SIZE: usize = 8;

/// Bytes taken by the two null terminators.
pub const TERMINATOR_SIZE: usize = 2;

/// Smallest legal value of the `size` field (empty body).
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + TERMINATOR_SIZE;

/// Largest body accepted when encoding a request.
pub const MAX_BODY_SIZE: usize = 4096;

/// Largest `size` field accepted when decoding. Responses may be larger
/// than requests, so this is more lenient than [`MAX_BODY_SIZE`].
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Request id the server puts in an AUTH_RESPONSE to reject a password.
pub const AUTH_FAILED_ID: i32 = -1;

// ── PacketType ───────────────────────────────────────────────────

/// The raw `type` field of a packet.
///
/// Kept as the wire integer because AUTH_RESPONSE and EXEC_COMMAND share
/// the value 2; only the direction of travel tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketType(pub i32);

impl PacketType {
    /// Client → server login request.
    pub const AUTH: Self = Self(3);
    /// Server → client login verdict.
    pub const AUTH_RESPONSE: Self = Self(2);
    /// Client → server command.
    pub const EXEC_COMMAND: Self = Self(2);
    /// Server → client command output.
    pub const RESPONSE_VALUE: Self = Self(0);

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            3 => write!(f, "AUTH"),
            2 => write!(f, "AUTH_RESPONSE|EXEC_COMMAND"),
            0 => write!(f, "RESPONSE_VALUE"),
            other => write!(f, "UNKNOWN({other})"),
        }
    }
}

// ── Packet ───────────────────────────────────────────────────────

/// One framed RCON message.
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    request_id: i32,
    packet_type: PacketType,
    body: Vec<u8>,
}

impl Packet {
    pub fn new(packet_type: PacketType, request_id: i32, body: Vec<u8>) -> Self {
        Self {
            request_id,
            packet_type,
            body,
        }
    }

    /// Build an AUTH packet carrying `password`.
    pub fn auth(request_id: i32, password: &str) -> Result<Self, RconError> {
        Ok(Self::new(PacketType::AUTH, request_id, latin1::encode(password)?))
    }

    /// Build an EXEC_COMMAND packet carrying the full command line.
    pub fn command(request_id: i32, command_line: &str) -> Result<Self, RconError> {
        Ok(Self::new(
            PacketType::EXEC_COMMAND,
            request_id,
            latin1::encode(command_line)?,
        ))
    }

    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body decoded as ISO-8859-1.
    pub fn body_text(&self) -> String {
        latin1::decode(&self.body)
    }

    /// Value of the `size` field for this packet.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len() + TERMINATOR_SIZE
    }

    /// Serialize into a complete frame.
    pub fn encode(&self) -> Result<Vec<u8>, RconError> {
        let mut buf = BytesMut::with_capacity(4 + self.wire_size());
        self.encode_into(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Append the frame to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<(), RconError> {
        if self.body.len() > MAX_BODY_SIZE {
            return Err(RconError::PayloadTooLarge {
                size: self.body.len(),
                max: MAX_BODY_SIZE,
            });
        }
        let size = self.wire_size();
        dst.reserve(4 + size);
        // Bounded by MAX_BODY_SIZE, so the cast cannot truncate.
        dst.put_i32_le(size as i32);
        dst.put_i32_le(self.request_id);
        dst.put_i32_le(self.packet_type.raw());
        dst.put_slice(&self.body);
        dst.put_bytes(0, TERMINATOR_SIZE);
        Ok(())
    }

    /// Parse one complete frame, including its size prefix.
    ///
    /// `frame` must hold exactly one packet; a short frame means the
    /// stream ended before the declared size was satisfied.
    pub fn decode(frame: &[u8]) -> Result<Self, RconError> {
        let mut buf = frame;
        if buf.len() < 4 {
            return Err(RconError::MalformedPacket(format!(
                "truncated size prefix: {} bytes",
                buf.len()
            )));
        }
        let size = read_size(buf.get_i32_le())?;
        if buf.len() < size {
            return Err(RconError::MalformedPacket(format!(
                "stream closed after {} of {size} declared bytes",
                buf.len()
            )));
        }
        if buf.len() > size {
            return Err(RconError::MalformedPacket(format!(
                "{} trailing bytes after packet",
                buf.len() - size
            )));
        }
        Self::decode_body(&buf[..size])
    }

    /// Parse the `size` bytes that follow the size prefix.
    pub(crate) fn decode_body(mut buf: &[u8]) -> Result<Self, RconError> {
        let request_id = buf.get_i32_le();
        let packet_type = PacketType(buf.get_i32_le());
        let body_len = buf.len() - TERMINATOR_SIZE;
        if buf[body_len..] != [0, 0] {
            return Err(RconError::MalformedPacket(
                "missing null terminators".into(),
            ));
        }
        Ok(Self {
            request_id,
            packet_type,
            body: buf[..body_len].to_vec(),
        })
    }
}

/// Validate a raw `size` field and return it as a length.
pub(crate) fn read_size(raw: i32) -> Result<usize, RconError> {
    let size = usize::try_from(raw)
        .map_err(|_| RconError::MalformedPacket(format!("negative packet size {raw}")))?;
    if size < MIN_PACKET_SIZE {
        return Err(RconError::MalformedPacket(format!(
            "packet size {size} below minimum {MIN_PACKET_SIZE}"
        )));
    }
    if size > MAX_FRAME_SIZE {
        return Err(RconError::MalformedPacket(format!(
            "packet size {size} exceeds maximum {MAX_FRAME_SIZE}"
        )));
    }
    Ok(size)
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Packet");
        s.field("request_id", &self.request_id)
            .field("type", &self.packet_type);
        // Never print the password of an AUTH packet.
        if self.packet_type == PacketType::AUTH {
            s.field("body", &"<redacted>");
        } else {
            s.field("body", &self.body_text());
        }
        s.finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout_is_exact() {
        let bytes = Packet::command(7, "Info").unwrap().encode().unwrap();
        assert_eq!(
            bytes,
            vec![
                14, 0, 0, 0, // size = 4 + 4 + 4 + 2
                7, 0, 0, 0, // request id
                2, 0, 0, 0, // EXEC_COMMAND
                b'I', b'n', b'f', b'o', 0, 0,
            ]
        );
    }

    #[test]
    fn size_field_counts_remaining_bytes() {
        let bytes = Packet::command(1, "ShowPlayers").unwrap().encode().unwrap();
        let size = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(size as usize, bytes.len() - 4);
    }

    #[test]
    fn decode_negative_request_id() {
        let pkt = Packet::new(PacketType::AUTH_RESPONSE, AUTH_FAILED_ID, Vec::new());
        let decoded = Packet::decode(&pkt.encode().unwrap()).unwrap();
        assert_eq!(decoded.request_id(), -1);
        assert!(decoded.body().is_empty());
    }

    #[test]
    fn decode_truncated_frame_is_malformed() {
        let bytes = Packet::command(1, "Save").unwrap().encode().unwrap();
        let err = Packet::decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, RconError::MalformedPacket(_)));
    }

    #[test]
    fn decode_rejects_bad_size() {
        let mut bytes = Packet::command(1, "Save").unwrap().encode().unwrap();
        bytes[0..4].copy_from_slice(&(-5i32).to_le_bytes());
        assert!(matches!(
            Packet::decode(&bytes),
            Err(RconError::MalformedPacket(_))
        ));

        bytes[0..4].copy_from_slice(&3i32.to_le_bytes());
        assert!(matches!(
            Packet::decode(&bytes),
            Err(RconError::MalformedPacket(_))
        ));
    }

    #[test]
    fn decode_rejects_missing_terminators() {
        let mut bytes = Packet::command(1, "Save").unwrap().encode().unwrap();
        let last = bytes.len() - 1;
        bytes[last] = b'!';
        assert!(matches!(
            Packet::decode(&bytes),
            Err(RconError::MalformedPacket(_))
        ));
    }

    #[test]
    fn encode_rejects_oversized_body() {
        let pkt = Packet::new(PacketType::EXEC_COMMAND, 1, vec![b'a'; MAX_BODY_SIZE + 1]);
        assert!(matches!(
            pkt.encode(),
            Err(RconError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn body_is_latin1() {
        let pkt = Packet::command(3, "Broadcast hi\u{00A0}there").unwrap();
        assert_eq!(pkt.body()[12], 0xA0);
        assert_eq!(pkt.body_text(), "Broadcast hi\u{00A0}there");
    }

    #[test]
    fn debug_redacts_auth_body() {
        let pkt = Packet::auth(1, "hunter2").unwrap();
        let text = format!("{pkt:?}");
        assert!(!text.contains("hunter2"));
        assert!(text.contains("redacted"));
    }
}
