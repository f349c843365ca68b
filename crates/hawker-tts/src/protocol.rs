//! The provider's binary WebSocket framing.
//!
//! Request frame:
//!
//! | Bytes | Content |
//! |---|---|
//! | 0..4 | Fixed header `11 10 11 00` (version 1, head size 4, full request, JSON, gzip) |
//! | 4..8 | Payload length, u32 big-endian |
//! | 8..  | Gzipped JSON payload |
//!
//! Server frames are at least 8 bytes. Byte 1's high nibble is the
//! message type (`0xb` audio chunk, `0xf` error); byte 2's low nibble
//! flags gzip compression; bytes 4..8 hold a signed big-endian sequence
//! number for audio chunks — a negative sequence marks the final chunk.
//! Audio payload starts at byte 8.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Fixed request header: version=1, head_size=4, full_request, json, gzip.
pub const REQUEST_HEADER: [u8; 4] = [0x11, 0x10, 0x11, 0x00];

/// Gzip magic bytes, scanned for inside compressed error payloads.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Assemble a full request frame around an already-gzipped payload.
pub fn encode_request_frame(compressed_payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(8 + compressed_payload.len());
    frame.extend_from_slice(&REQUEST_HEADER);
    frame.extend_from_slice(&(compressed_payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(compressed_payload);
    frame
}

pub fn gzip_compress(input: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(input)?;
    encoder.finish()
}

pub fn gzip_decompress(input: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(input);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// A decoded server frame.
#[derive(Debug, PartialEq, Eq)]
pub enum ServerFrame<'a> {
    /// An audio chunk; `sequence < 0` means the stream is complete.
    Audio { sequence: i32, data: &'a [u8] },
    /// A provider error with its decoded message text.
    Error { message: String },
    /// Too short or an unknown type — skipped.
    Ignored,
}

/// Decode one incoming frame.
pub fn parse_server_frame(frame: &[u8]) -> ServerFrame<'_> {
    if frame.len() < 8 {
        return ServerFrame::Ignored;
    }

    let message_type = frame[1] >> 4;
    let compressed = (frame[2] & 0x0f) == 1;

    match message_type {
        0x0b => {
            let sequence = i32::from_be_bytes([frame[4], frame[5], frame[6], frame[7]]);
            ServerFrame::Audio {
                sequence,
                data: &frame[8..],
            }
        }
        0x0f => {
            let payload = &frame[8..];
            let message = decode_error_payload(payload, compressed);
            ServerFrame::Error { message }
        }
        _ => ServerFrame::Ignored,
    }
}

/// Error payloads arrive with leading binary fields before the gzip
/// stream; locate the magic and decompress from there. Anything
/// undecodable is surfaced as hex so logs stay useful.
fn decode_error_payload(payload: &[u8], compressed: bool) -> String {
    if compressed {
        if let Some(start) = payload
            .windows(GZIP_MAGIC.len())
            .position(|w| w == GZIP_MAGIC)
        {
            if let Ok(decoded) = gzip_decompress(&payload[start..]) {
                return String::from_utf8_lossy(&decoded).into_owned();
            }
        }
    }
    format!("undecodable error payload: {}", hex_dump(payload))
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_frame_layout() {
        let payload = gzip_compress(b"{\"hello\":1}").unwrap();
        let frame = encode_request_frame(&payload);

        assert_eq!(&frame[..4], &[0x11, 0x10, 0x11, 0x00]);
        let len = u32::from_be_bytes([frame[4], frame[5], frame[6], frame[7]]);
        assert_eq!(len as usize, payload.len());
        assert_eq!(&frame[8..], &payload[..]);
    }

    #[test]
    fn audio_frames_carry_sequence_and_payload() {
        // type 0xb in byte 1's high nibble, sequence 2, 3 payload bytes
        let mut frame = vec![0x11, 0xb0, 0x00, 0x00];
        frame.extend_from_slice(&2i32.to_be_bytes());
        frame.extend_from_slice(&[0xaa, 0xbb, 0xcc]);

        match parse_server_frame(&frame) {
            ServerFrame::Audio { sequence, data } => {
                assert_eq!(sequence, 2);
                assert_eq!(data, &[0xaa, 0xbb, 0xcc]);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn negative_sequence_marks_the_final_chunk() {
        let mut frame = vec![0x11, 0xb0, 0x00, 0x00];
        frame.extend_from_slice(&(-1i32).to_be_bytes());
        frame.extend_from_slice(&[0x01]);

        match parse_server_frame(&frame) {
            ServerFrame::Audio { sequence, .. } => assert!(sequence < 0),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn error_frames_scan_for_the_gzip_magic() {
        let compressed = gzip_compress("配额已用完".as_bytes()).unwrap();
        // Leading binary junk before the gzip stream, as the provider sends.
        let mut payload = vec![0x00, 0x00, 0x12, 0x34];
        payload.extend_from_slice(&compressed);

        let mut frame = vec![0x11, 0xf0, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        frame.extend_from_slice(&payload);

        match parse_server_frame(&frame) {
            ServerFrame::Error { message } => assert_eq!(message, "配额已用完"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn uncompressed_error_payload_degrades_to_hex() {
        let frame = vec![0x11, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xde, 0xad];
        match parse_server_frame(&frame) {
            ServerFrame::Error { message } => assert!(message.contains("DEAD")),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn short_and_unknown_frames_are_ignored() {
        assert_eq!(parse_server_frame(&[0x11, 0xb0, 0x00]), ServerFrame::Ignored);
        let frame = vec![0x11, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(parse_server_frame(&frame), ServerFrame::Ignored);
    }

    #[test]
    fn gzip_roundtrip_preserves_content() {
        let compressed = gzip_compress("叫卖文案".as_bytes()).unwrap();
        assert_eq!(gzip_decompress(&compressed).unwrap(), "叫卖文案".as_bytes());
    }
}
