//! Checksum and CRC primitives for derived header fields
//!
//! The Internet checksum (RFC 1071) backs the IPv4, ICMP, TCP, and UDP
//! derived fields; the IEEE 802.3 CRC-32 backs the Ethernet frame check
//! sequence.

use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

/// Calculate the Internet checksum (RFC 1071) over `data`
///
/// 16-bit big-endian words are summed with end-around carry and the
/// result is complemented. An odd trailing byte is padded with zero for
/// the sum only.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u16::from_be_bytes([word[0], word[1]]) as u32;
    }
    if let Some(&last) = words.remainder().first() {
        sum += (last as u32) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !sum as u16
}

/// Calculate the TCP/UDP checksum over the pseudo-header plus `segment`
///
/// The pseudo-header is source address, destination address, a zero byte,
/// the protocol number, and the 16-bit segment length (RFC 768/793).
/// `segment` is the transport header (checksum field zeroed) followed by
/// the payload.
pub fn pseudo_header_checksum(
    source: Ipv4Addr,
    destination: Ipv4Addr,
    protocol: u8,
    segment: &[u8],
) -> u16 {
    let mut buf = BytesMut::with_capacity(12 + segment.len());
    buf.put_slice(&source.octets());
    buf.put_slice(&destination.octets());
    buf.put_u8(0);
    buf.put_u8(protocol);
    buf.put_u16(segment.len() as u16);
    buf.put_slice(segment);
    internet_checksum(&buf)
}

/// Validate a region that includes its own checksum field
///
/// Summing a correct region yields zero (or the equivalent 0xFFFF in
/// one's complement).
pub fn validate_checksum(data: &[u8]) -> bool {
    let sum = internet_checksum(data);
    sum == 0 || sum == 0xFFFF
}

/// Calculate the IEEE 802.3 CRC-32 over `data`
///
/// Polynomial 0xEDB88320 (reflected), initial value 0xFFFFFFFF, final
/// XOR 0xFFFFFFFF.
pub fn crc32_ieee(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internet_checksum_empty() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
    }

    #[test]
    fn test_internet_checksum_known_words() {
        // 0x0001 + 0x0002 = 0x0003, complemented
        assert_eq!(internet_checksum(&[0x00, 0x01, 0x00, 0x02]), !0x0003u16);
    }

    #[test]
    fn test_internet_checksum_end_around_carry() {
        // 0xFFFF + 0x0001 wraps to 0x0001 with the carry folded back in
        assert_eq!(internet_checksum(&[0xFF, 0xFF, 0x00, 0x01]), !0x0001u16);
    }

    #[test]
    fn test_internet_checksum_odd_length_pads_zero() {
        assert_eq!(
            internet_checksum(&[0x12, 0x34, 0x56]),
            internet_checksum(&[0x12, 0x34, 0x56, 0x00])
        );
    }

    #[test]
    fn test_checksum_self_validates() {
        let data = [0x45, 0x00, 0x00, 0x3C, 0x1A, 0x2B];
        let sum = internet_checksum(&data);

        let mut with_sum = data.to_vec();
        with_sum.extend_from_slice(&sum.to_be_bytes());
        assert!(validate_checksum(&with_sum));
    }

    #[test]
    fn test_pseudo_header_checksum_udp_vector() {
        // 10.0.0.1 -> 10.0.0.2, ports 1024 -> 1025, payload "abcd"
        let segment = [
            0x04, 0x00, 0x04, 0x01, 0x00, 0x0C, 0x00, 0x00, b'a', b'b', b'c', b'd',
        ];
        let sum = pseudo_header_checksum(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            17,
            &segment,
        );
        assert_eq!(sum, 0x1F0C);
    }

    #[test]
    fn test_crc32_zero_frame_vector() {
        // 60-byte all-zero Ethernet body
        assert_eq!(crc32_ieee(&[0u8; 60]), 0x0412_8908);
    }

    #[test]
    fn test_crc32_residue_over_appended_fcs() {
        // Re-running the CRC over body + FCS (FCS transmitted LSB first)
        // leaves the fixed check remainder; its complement, bit-reversed,
        // is the 802.3 residue 0xC704DD7B.
        let body = [0u8; 60];
        let fcs = crc32_ieee(&body);
        let mut frame = body.to_vec();
        frame.extend_from_slice(&fcs.to_le_bytes());
        assert_eq!(crc32_ieee(&frame), 0x2144_DF1C);
    }
}
