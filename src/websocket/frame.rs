//! RFC 6455 frame header parsing.
//!
//! ```text
//!  0               1               2               3
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| payload len |  extended payload length      |
//! |I|S|S|S|  (4)  |A|     (7)     |        (16 or 64 bits)        |
//! |N|V|V|V|       |S|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     masking key (32 bits, present when MASK is set)           |
//! +---------------------------------------------------------------+
//! ```

use crate::{
    byte_order::{read_network_u16, read_network_u64},
    codec::FramingError,
};

const FIN: u8 = 0x80;
const MASK: u8 = 0x80;
const LENGTH_16: u8 = 126;
const LENGTH_64: u8 = 127;
const MAX_CONTROL_PAYLOAD: u64 = 125;

/// Websocket frame opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Continuation of a fragmented message.
    Continuation = 0x0,
    /// UTF-8 text data.
    Text = 0x1,
    /// Binary data.
    Binary = 0x2,
    /// Connection close.
    Close = 0x8,
    /// Ping.
    Ping = 0x9,
    /// Pong.
    Pong = 0xa,
}

impl Opcode {
    /// Return the opcode nibble.
    #[must_use]
    pub fn as_u8(self) -> u8 { self as u8 }

    /// Returns true for close, ping and pong.
    #[must_use]
    pub fn is_control(self) -> bool { self.as_u8() & 0x8 != 0 }
}

impl TryFrom<u8> for Opcode {
    type Error = FramingError;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        match opcode {
            0x0 => Ok(Self::Continuation),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xa => Ok(Self::Pong),
            opcode => Err(FramingError::ReservedOpcode { opcode }),
        }
    }
}

/// Parsed websocket frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Final fragment of a message.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: Opcode,
    /// Masking key, when the MASK bit is set.
    pub mask: Option<[u8; 4]>,
    /// Payload length in bytes.
    pub payload_len: usize,
    /// Header length in bytes, including extended length and masking key.
    pub header_len: usize,
}

impl FrameHeader {
    /// Parse a header from the start of `src`.
    ///
    /// Returns `Ok(None)` while the header is incomplete. Payloads above
    /// `max_payload` are rejected as soon as the length is known.
    ///
    /// # Errors
    ///
    /// Returns a [`FramingError`] for reserved bits or opcodes, inconsistent
    /// extended lengths and invalid control frames.
    pub fn parse(src: &[u8], max_payload: usize) -> Result<Option<Self>, FramingError> {
        let &[first, second, ..] = src else {
            return Ok(None);
        };

        let bits = (first >> 4) & 0b0111;
        if bits != 0 {
            return Err(FramingError::ReservedBits { bits });
        }
        let opcode = Opcode::try_from(first & 0x0f)?;
        let fin = first & FIN != 0;

        let (length, mut header_len) = match second & !MASK {
            LENGTH_16 => {
                let Some(bytes) = src.get(2..4).and_then(|s| <[u8; 2]>::try_from(s).ok()) else {
                    return Ok(None);
                };
                let length = u64::from(read_network_u16(bytes));
                if length < u64::from(LENGTH_16) {
                    return Err(FramingError::NonMinimalLength { length, width: 2 });
                }
                (length, 4)
            }
            LENGTH_64 => {
                let Some(bytes) = src.get(2..10).and_then(|s| <[u8; 8]>::try_from(s).ok()) else {
                    return Ok(None);
                };
                let length = read_network_u64(bytes);
                if length >> 63 != 0 {
                    return Err(FramingError::LengthOverflow);
                }
                if length <= u64::from(u16::MAX) {
                    return Err(FramingError::NonMinimalLength { length, width: 8 });
                }
                (length, 10)
            }
            short => (u64::from(short), 2),
        };

        if opcode.is_control() {
            if !fin {
                return Err(FramingError::FragmentedControlFrame {
                    opcode: opcode.as_u8(),
                });
            }
            if length > MAX_CONTROL_PAYLOAD {
                return Err(FramingError::OversizedControlFrame { length });
            }
        }

        let payload_len = usize::try_from(length)
            .ok()
            .filter(|len| *len <= max_payload)
            .ok_or(FramingError::OversizedFrame {
                size: usize::try_from(length).unwrap_or(usize::MAX),
                max: max_payload,
            })?;

        let mask = if second & MASK == 0 {
            None
        } else {
            let Some(key) = src
                .get(header_len..header_len + 4)
                .and_then(|s| <[u8; 4]>::try_from(s).ok())
            else {
                return Ok(None);
            };
            header_len += 4;
            Some(key)
        };

        Ok(Some(Self {
            fin,
            opcode,
            mask,
            payload_len,
            header_len,
        }))
    }
}

/// Number of header bytes `src` needs, as far as can be told from what is
/// buffered.
pub(crate) fn required_header_len(src: &[u8]) -> usize {
    let Some(&second) = src.get(1) else {
        return 2;
    };
    let extended = match second & !MASK {
        LENGTH_16 => 2,
        LENGTH_64 => 8,
        _ => 0,
    };
    let mask = if second & MASK == 0 { 0 } else { 4 };
    2 + extended + mask
}

/// XOR `payload` with the four-byte masking key.
pub fn unmask(payload: &mut [u8], key: [u8; 4]) {
    for (byte, k) in payload.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}
