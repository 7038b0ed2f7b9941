//! 802.11 data-frame header record
//!
//! Minimal three-address data header followed by the RFC 1042 LLC/SNAP
//! encapsulation that names the payload protocol, enough to stand in as
//! the wireless link-layer variant of a datagram. Carries no derived
//! fields, so the aggregator leaves it untouched.

use gramforge_core::{BitFieldGroup, BitReader, Field, GroupKind, MacAddr, Result};

use crate::ethernet::EtherType;

/// LLC/SNAP encapsulation header (8 bytes)
///
/// RFC 1042 form: SNAP service access points (0xAA/0xAA), unnumbered
/// information control (0x03), the all-zero encapsulation OUI, and the
/// EtherType of the carried protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlcSnap {
    /// Destination service access point (0xAA for SNAP)
    pub dsap: u8,
    /// Source service access point (0xAA for SNAP)
    pub ssap: u8,
    /// Control field (0x03, unnumbered information)
    pub control: u8,
    /// Organizationally unique identifier (all zero for RFC 1042)
    pub oui: [u8; 3],
    /// EtherType of the encapsulated protocol
    pub ethertype: EtherType,
}

impl LlcSnap {
    /// Encapsulation size on the wire
    pub const WIRE_SIZE: usize = 8;

    /// RFC 1042 encapsulation for the given protocol
    pub fn new(ethertype: EtherType) -> Self {
        LlcSnap {
            dsap: 0xAA,
            ssap: 0xAA,
            control: 0x03,
            oui: [0x00, 0x00, 0x00],
            ethertype,
        }
    }

    /// Read the encapsulation fields from `reader`
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let dsap = reader.get_uint(8)? as u8;
        let ssap = reader.get_uint(8)? as u8;
        let control = reader.get_uint(8)? as u8;
        let oui_word = reader.get_uint(24)? as u32;
        let oui = [
            (oui_word >> 16) as u8,
            (oui_word >> 8) as u8,
            oui_word as u8,
        ];
        let ethertype = EtherType::from_u16(reader.get_uint(16)? as u16);
        Ok(LlcSnap {
            dsap,
            ssap,
            control,
            oui,
            ethertype,
        })
    }

    /// Parse the 8-byte wire image
    pub fn from_net_bytes(data: &[u8]) -> Result<Self> {
        Self::read(&mut BitReader::new(data))
    }

    fn oui_u32(&self) -> u32 {
        (self.oui[0] as u32) << 16 | (self.oui[1] as u32) << 8 | self.oui[2] as u32
    }
}

impl BitFieldGroup for LlcSnap {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Basic
    }

    fn layer(&self) -> u8 {
        2
    }

    fn display_name(&self) -> &str {
        "LLC/SNAP"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::uint("dsap", self.dsap as u64, 8),
            Field::uint("ssap", self.ssap as u64, 8),
            Field::uint("control", self.control as u64, 8),
            Field::uint("oui", self.oui_u32() as u64, 24),
            Field::uint("ethertype", self.ethertype.to_u16() as u64, 16),
        ]
    }
}

/// 802.11 data-frame header with LLC/SNAP encapsulation (32 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiHeader {
    /// Frame control field (version, type, subtype, flags)
    pub frame_control: u16,
    /// Duration / ID
    pub duration: u16,
    /// Receiver address
    pub addr1: MacAddr,
    /// Transmitter address
    pub addr2: MacAddr,
    /// Filtering address (BSSID for infrastructure frames)
    pub addr3: MacAddr,
    /// Sequence and fragment numbers
    pub sequence_control: u16,
    /// LLC/SNAP encapsulation naming the payload protocol
    pub snap: LlcSnap,
}

impl WifiHeader {
    /// Header size on the wire, encapsulation included
    pub const WIRE_SIZE: usize = 32;

    /// Frame control value for a plain data frame
    pub const FC_DATA: u16 = 0x0800;

    /// Create a data-frame header carrying IPv4
    pub fn new(addr1: MacAddr, addr2: MacAddr, addr3: MacAddr) -> Self {
        WifiHeader {
            frame_control: Self::FC_DATA,
            duration: 0,
            addr1,
            addr2,
            addr3,
            sequence_control: 0,
            snap: LlcSnap::new(EtherType::Ipv4),
        }
    }

    /// Set the duration field
    pub fn with_duration(mut self, duration: u16) -> Self {
        self.duration = duration;
        self
    }

    /// Set the sequence control field
    pub fn with_sequence_control(mut self, sequence_control: u16) -> Self {
        self.sequence_control = sequence_control;
        self
    }

    /// Set the encapsulated protocol
    pub fn with_ethertype(mut self, ethertype: EtherType) -> Self {
        self.snap.ethertype = ethertype;
        self
    }

    /// Parse the 32-byte wire image
    pub fn from_net_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        Ok(WifiHeader {
            frame_control: reader.get_uint(16)? as u16,
            duration: reader.get_uint(16)? as u16,
            addr1: MacAddr::from_u64(reader.get_uint(48)?),
            addr2: MacAddr::from_u64(reader.get_uint(48)?),
            addr3: MacAddr::from_u64(reader.get_uint(48)?),
            sequence_control: reader.get_uint(16)? as u16,
            snap: LlcSnap::read(&mut reader)?,
        })
    }
}

impl BitFieldGroup for WifiHeader {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Header
    }

    fn layer(&self) -> u8 {
        2
    }

    fn display_name(&self) -> &str {
        "802.11 Data Header"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::uint("frame_control", self.frame_control as u64, 16),
            Field::uint("duration", self.duration as u64, 16),
            Field::uint("addr1", self.addr1.to_u64(), 48),
            Field::uint("addr2", self.addr2.to_u64(), 48),
            Field::uint("addr3", self.addr3.to_u64(), 48),
            Field::uint("sequence_control", self.sequence_control as u64, 16),
            Field::group("snap", &self.snap),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_defaults() {
        let snap = LlcSnap::new(EtherType::Ipv4);
        assert_eq!(snap.dsap, 0xAA);
        assert_eq!(snap.ssap, 0xAA);
        assert_eq!(snap.control, 0x03);
        assert_eq!(snap.oui, [0, 0, 0]);

        let wire = snap.as_net_bytes().unwrap();
        assert_eq!(wire, vec![0xAA, 0xAA, 0x03, 0x00, 0x00, 0x00, 0x08, 0x00]);
        assert_eq!(LlcSnap::from_net_bytes(&wire).unwrap(), snap);
    }

    #[test]
    fn test_header_width() {
        let header = WifiHeader::new(MacAddr::BROADCAST, MacAddr::ZERO, MacAddr::ZERO);
        assert_eq!(header.bit_width(), 256);
        assert_eq!(
            header.as_net_bytes().unwrap().len(),
            WifiHeader::WIRE_SIZE
        );
    }

    #[test]
    fn test_header_roundtrip() {
        let header = WifiHeader::new(
            MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            MacAddr([0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB]),
        )
        .with_duration(0x2F)
        .with_sequence_control(0x10)
        .with_ethertype(EtherType::Icmp);

        let wire = header.as_net_bytes().unwrap();
        let parsed = WifiHeader::from_net_bytes(&wire).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.snap.ethertype, EtherType::Icmp);
    }
}
