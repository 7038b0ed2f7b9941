//! TCP header record
//!
//! Optionless 20-byte header with the RFC 793 field layout and the
//! pseudo-header checksum derivation. TCP carries no length field; the
//! pseudo-header length is header plus payload.

use std::net::Ipv4Addr;

use gramforge_core::{BitFieldGroup, BitReader, Field, GroupKind, Port, Result};

use crate::checksum::pseudo_header_checksum;
use crate::ip::IpProtocol;

/// TCP control flags (6 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    /// URG - urgent pointer is significant
    pub urg: bool,
    /// ACK - acknowledgment number is significant
    pub ack: bool,
    /// PSH - push function
    pub psh: bool,
    /// RST - reset the connection
    pub rst: bool,
    /// SYN - synchronize sequence numbers
    pub syn: bool,
    /// FIN - no more data from sender
    pub fin: bool,
}

impl TcpFlags {
    /// No flags set
    pub const NONE: TcpFlags = TcpFlags {
        urg: false,
        ack: false,
        psh: false,
        rst: false,
        syn: false,
        fin: false,
    };

    /// SYN (connection initiation)
    pub const SYN: TcpFlags = TcpFlags {
        urg: false,
        ack: false,
        psh: false,
        rst: false,
        syn: true,
        fin: false,
    };

    /// SYN+ACK (connection acknowledgment)
    pub const SYN_ACK: TcpFlags = TcpFlags {
        urg: false,
        ack: true,
        psh: false,
        rst: false,
        syn: true,
        fin: false,
    };

    /// ACK
    pub const ACK: TcpFlags = TcpFlags {
        urg: false,
        ack: true,
        psh: false,
        rst: false,
        syn: false,
        fin: false,
    };

    /// RST (connection reset)
    pub const RST: TcpFlags = TcpFlags {
        urg: false,
        ack: false,
        psh: false,
        rst: true,
        syn: false,
        fin: false,
    };

    /// FIN+ACK (connection termination)
    pub const FIN_ACK: TcpFlags = TcpFlags {
        urg: false,
        ack: true,
        psh: false,
        rst: false,
        syn: false,
        fin: true,
    };

    /// Convert to the 6-bit wire value
    pub fn to_u8(self) -> u8 {
        (self.urg as u8) << 5
            | (self.ack as u8) << 4
            | (self.psh as u8) << 3
            | (self.rst as u8) << 2
            | (self.syn as u8) << 1
            | self.fin as u8
    }

    /// Convert from the 6-bit wire value
    pub fn from_u8(value: u8) -> Self {
        TcpFlags {
            urg: value & 0b10_0000 != 0,
            ack: value & 0b01_0000 != 0,
            psh: value & 0b00_1000 != 0,
            rst: value & 0b00_0100 != 0,
            syn: value & 0b00_0010 != 0,
            fin: value & 0b00_0001 != 0,
        }
    }
}

/// TCP header without options (20 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    /// Source port
    pub source_port: Port,
    /// Destination port
    pub destination_port: Port,
    /// Sequence number
    pub sequence: u32,
    /// Acknowledgment number
    pub acknowledgment: u32,
    /// Header length in 32-bit words (always 5 without options)
    pub data_offset: u8,
    /// Reserved bits (6 bits, must be 0)
    pub reserved: u8,
    /// Control flags
    pub flags: TcpFlags,
    /// Receive window size
    pub window: u16,
    /// Checksum over pseudo-header, header, and payload, derived
    pub checksum: u16,
    /// Urgent pointer
    pub urgent_pointer: u16,
}

impl TcpHeader {
    /// Header size on the wire
    pub const WIRE_SIZE: usize = 20;

    /// Create a header with common defaults (window 65535)
    pub fn new(source_port: Port, destination_port: Port, sequence: u32, flags: TcpFlags) -> Self {
        TcpHeader {
            source_port,
            destination_port,
            sequence,
            acknowledgment: 0,
            data_offset: 5,
            reserved: 0,
            flags,
            window: 65535,
            checksum: 0,
            urgent_pointer: 0,
        }
    }

    /// Set the acknowledgment number
    pub fn with_acknowledgment(mut self, acknowledgment: u32) -> Self {
        self.acknowledgment = acknowledgment;
        self
    }

    /// Set the window size
    pub fn with_window(mut self, window: u16) -> Self {
        self.window = window;
        self
    }

    /// Derive the checksum from `payload`
    ///
    /// Computed over the RFC 793 pseudo-header plus the header (checksum
    /// field zeroed) plus the payload. The pseudo-header length is header
    /// plus payload; TCP has no length field of its own.
    pub fn calc_checksum(
        &mut self,
        source: Ipv4Addr,
        destination: Ipv4Addr,
        payload: &[u8],
    ) -> Result<()> {
        self.checksum = 0;
        let mut segment = self.as_net_bytes()?;
        segment.extend_from_slice(payload);
        self.checksum =
            pseudo_header_checksum(source, destination, IpProtocol::Tcp.to_u8(), &segment);
        Ok(())
    }

    /// Check the stored checksum against `payload`
    pub fn verify_checksum(
        &self,
        source: Ipv4Addr,
        destination: Ipv4Addr,
        payload: &[u8],
    ) -> Result<bool> {
        let mut segment = self.as_net_bytes()?;
        segment.extend_from_slice(payload);
        let sum = pseudo_header_checksum(source, destination, IpProtocol::Tcp.to_u8(), &segment);
        Ok(sum == 0 || sum == 0xFFFF)
    }

    /// Parse the 20-byte wire image
    pub fn from_net_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        Ok(TcpHeader {
            source_port: Port(reader.get_uint(16)? as u16),
            destination_port: Port(reader.get_uint(16)? as u16),
            sequence: reader.get_uint(32)? as u32,
            acknowledgment: reader.get_uint(32)? as u32,
            data_offset: reader.get_uint(4)? as u8,
            reserved: reader.get_uint(6)? as u8,
            flags: TcpFlags::from_u8(reader.get_uint(6)? as u8),
            window: reader.get_uint(16)? as u16,
            checksum: reader.get_uint(16)? as u16,
            urgent_pointer: reader.get_uint(16)? as u16,
        })
    }
}

impl BitFieldGroup for TcpHeader {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Header
    }

    fn layer(&self) -> u8 {
        4
    }

    fn display_name(&self) -> &str {
        "TCP Header"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::uint("source_port", self.source_port.to_u16() as u64, 16),
            Field::uint("destination_port", self.destination_port.to_u16() as u64, 16),
            Field::uint("sequence", self.sequence as u64, 32),
            Field::uint("acknowledgment", self.acknowledgment as u64, 32),
            Field::uint("data_offset", self.data_offset as u64, 4),
            Field::uint("reserved", self.reserved as u64, 6),
            Field::uint("flags", self.flags.to_u8() as u64, 6),
            Field::uint("window", self.window as u64, 16),
            Field::uint("checksum", self.checksum as u64, 16),
            Field::uint("urgent_pointer", self.urgent_pointer as u64, 16),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_bits() {
        assert_eq!(TcpFlags::SYN.to_u8(), 0b00_0010);
        assert_eq!(TcpFlags::SYN_ACK.to_u8(), 0b01_0010);
        assert_eq!(TcpFlags::FIN_ACK.to_u8(), 0b01_0001);
        assert_eq!(TcpFlags::from_u8(0b00_0100), TcpFlags::RST);
    }

    #[test]
    fn test_header_width_and_offset_byte() {
        let header = TcpHeader::new(Port(54321), Port::HTTP, 1000, TcpFlags::SYN);
        assert_eq!(header.bit_width(), 160);

        let wire = header.as_net_bytes().unwrap();
        assert_eq!(wire.len(), TcpHeader::WIRE_SIZE);
        // Data offset 5 in the top nibble of byte 12
        assert_eq!(wire[12], 0x50);
        assert_eq!(wire[13], TcpFlags::SYN.to_u8());
    }

    #[test]
    fn test_checksum_roundtrip() {
        let src = Ipv4Addr::new(192, 168, 1, 1);
        let dst = Ipv4Addr::new(192, 168, 1, 2);
        let mut header = TcpHeader::new(Port(12345), Port::HTTP, 1000, TcpFlags::SYN);
        header.calc_checksum(src, dst, &[]).unwrap();

        assert_ne!(header.checksum, 0);
        assert!(header.verify_checksum(src, dst, &[]).unwrap());

        let wire = header.as_net_bytes().unwrap();
        let parsed = TcpHeader::from_net_bytes(&wire).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_builder_setters() {
        let header = TcpHeader::new(Port(1), Port(2), 7, TcpFlags::ACK)
            .with_acknowledgment(99)
            .with_window(1024);
        assert_eq!(header.acknowledgment, 99);
        assert_eq!(header.window, 1024);
        assert!(header.flags.ack);
    }
}
