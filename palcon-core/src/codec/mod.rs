use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::RconError;
use crate::packet::{self, Packet};

/// Frames [`Packet`]s over a byte stream for `tokio_util::codec::Framed`.
///
/// Only the framing lives here; the layout is owned by [`Packet`] so it
/// can be tested without any I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct RconCodec;

impl Decoder for RconCodec {
    type Item = Packet;
    type Error = RconError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }
        let raw = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let size = packet::read_size(raw)?;

        if src.len() < 4 + size {
            src.reserve(4 + size - src.len());
            return Ok(None);
        }

        src.advance(4);
        let frame = src.split_to(size);
        Packet::decode_body(&frame).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(packet) => Ok(Some(packet)),
            None if src.is_empty() => Ok(None),
            None => Err(RconError::MalformedPacket(format!(
                "stream closed with {} bytes of an incomplete packet",
                src.len()
            ))),
        }
    }
}

impl Encoder<Packet> for RconCodec {
    type Error = RconError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode_into(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketType;

    fn frame(pkt: &Packet) -> BytesMut {
        BytesMut::from(pkt.encode().unwrap().as_slice())
    }

    #[test]
    fn waits_for_complete_frame() {
        let pkt = Packet::new(PacketType::RESPONSE_VALUE, 4, b"hello".to_vec());
        let full = frame(&pkt);
        let mut codec = RconCodec;

        let mut partial = BytesMut::from(&full[..2]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        let mut partial = BytesMut::from(&full[..full.len() - 1]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        let mut whole = full.clone();
        assert_eq!(codec.decode(&mut whole).unwrap(), Some(pkt));
        assert!(whole.is_empty());
    }

    #[test]
    fn decodes_back_to_back_frames() {
        let a = Packet::new(PacketType::RESPONSE_VALUE, 1, Vec::new());
        let b = Packet::new(PacketType::AUTH_RESPONSE, 1, Vec::new());
        let mut buf = frame(&a);
        buf.extend_from_slice(&frame(&b));

        let mut codec = RconCodec;
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(a));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(b));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn eof_mid_frame_is_malformed() {
        let pkt = Packet::new(PacketType::RESPONSE_VALUE, 9, b"partial".to_vec());
        let full = frame(&pkt);
        let mut buf = BytesMut::from(&full[..8]);
        let err = RconCodec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, RconError::MalformedPacket(_)));
    }

    #[test]
    fn eof_on_clean_boundary_is_none() {
        let mut buf = BytesMut::new();
        assert!(RconCodec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn rejects_oversized_declared_size() {
        let mut buf = BytesMut::from(&(i32::MAX).to_le_bytes()[..]);
        assert!(matches!(
            RconCodec.decode(&mut buf),
            Err(RconError::MalformedPacket(_))
        ));
    }

    #[test]
    fn encoder_matches_packet_encode() {
        let pkt = Packet::command(2, "KickPlayer 123").unwrap();
        let mut dst = BytesMut::new();
        RconCodec.encode(pkt.clone(), &mut dst).unwrap();
        assert_eq!(&dst[..], pkt.encode().unwrap().as_slice());
    }
}
