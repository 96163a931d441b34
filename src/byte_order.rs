//! Network byte-order helpers for the Docker and websocket wire formats.
//!
//! Both the attach multiplex header and the websocket extended length are
//! big-endian. Keeping the conversions here scopes the Clippy expectations to
//! the points where wire endianness is decided.

/// Parse the 16-bit websocket extended payload length.
///
/// # Examples
///
/// ```
/// use dockerframe::byte_order::read_network_u16;
///
/// assert_eq!(read_network_u16([0x01, 0x00]), 256);
/// ```
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u16::from_be_bytes(bytes)
}

/// Serialise a multiplex payload length in network byte order.
///
/// # Examples
///
/// ```
/// use dockerframe::byte_order::write_network_u32;
///
/// assert_eq!(write_network_u32(5), [0x00, 0x00, 0x00, 0x05]);
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse the payload length carried in bytes 4–7 of a multiplex header.
///
/// # Examples
///
/// ```
/// use dockerframe::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x00, 0x00, 0x01, 0x02]), 0x0102);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

/// Parse the 64-bit websocket extended payload length.
///
/// # Examples
///
/// ```
/// use dockerframe::byte_order::read_network_u64;
///
/// assert_eq!(read_network_u64([0, 0, 0, 0, 0, 1, 0, 0]), 0x1_0000);
/// ```
#[must_use]
pub fn read_network_u64(bytes: [u8; 8]) -> u64 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u64::from_be_bytes(bytes)
}
