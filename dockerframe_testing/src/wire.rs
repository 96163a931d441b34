//! Raw wire bytes for the Docker stream formats.
//!
//! Fixtures are built byte by byte rather than with the crate's encoder so
//! they can also describe input the encoder would refuse.

use dockerframe::StreamType;

/// One multiplex frame: 8-byte header followed by `payload`.
///
/// # Panics
///
/// Panics if `payload` is longer than `u32::MAX` bytes.
#[must_use]
pub fn multiplexed_frame(stream: StreamType, payload: &[u8]) -> Vec<u8> {
    let len = u32::try_from(payload.len()).expect("payload fits a u32 length");
    let mut wire = vec![stream.as_u8(), 0, 0, 0];
    wire.extend_from_slice(&len.to_be_bytes());
    wire.extend_from_slice(payload);
    wire
}

/// Concatenated multiplex frames.
#[must_use]
pub fn multiplexed_wire(frames: &[(StreamType, &[u8])]) -> Vec<u8> {
    frames
        .iter()
        .flat_map(|(stream, payload)| multiplexed_frame(*stream, payload))
        .collect()
}

/// One unmasked websocket frame using the shortest length encoding.
///
/// `first` is the complete first header byte: FIN, RSV bits and opcode.
#[must_use]
pub fn websocket_frame(first: u8, payload: &[u8]) -> Vec<u8> {
    let mut wire = vec![first];
    push_length(&mut wire, 0, payload.len());
    wire.extend_from_slice(payload);
    wire
}

/// One websocket frame masked with `key`.
#[must_use]
pub fn masked_websocket_frame(first: u8, payload: &[u8], key: [u8; 4]) -> Vec<u8> {
    let mut wire = vec![first];
    push_length(&mut wire, 0x80, payload.len());
    wire.extend_from_slice(&key);
    wire.extend(
        payload
            .iter()
            .zip(key.iter().cycle())
            .map(|(byte, mask)| byte ^ mask),
    );
    wire
}

fn push_length(wire: &mut Vec<u8>, mask_bit: u8, len: usize) {
    match (u8::try_from(len), u16::try_from(len)) {
        (Ok(short), _) if short <= 125 => wire.push(mask_bit | short),
        (_, Ok(medium)) => {
            wire.push(mask_bit | 126);
            wire.extend_from_slice(&medium.to_be_bytes());
        }
        _ => {
            wire.push(mask_bit | 127);
            wire.extend_from_slice(&(len as u64).to_be_bytes());
        }
    }
}

/// JSON texts joined by `separator`.
#[must_use]
pub fn json_stream(values: &[&str], separator: &str) -> Vec<u8> { values.join(separator).into_bytes() }
