//! Packet construction and parsing for gramforge
//!
//! This crate provides the concrete protocol records and the layered
//! datagram aggregator built on the `gramforge-core` bit-layout engine:
//!
//! - **Ethernet II** headers and the 32-bit frame check sequence
//! - **802.11** data-frame headers
//! - **IPv4** headers with automatic total length and header checksum
//! - **ICMP** headers with the plain RFC 792 checksum
//! - **UDP** and **TCP** headers with pseudo-header checksums
//! - [`Datagram`] - the cross-layer aggregator that pads, derives, and
//!   emits a complete frame as one 32-bit-aligned byte string
//!
//! # Quick Start
//!
//! ## Building a UDP probe
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use gramforge_core::{BitFieldGroup, Port};
//! use gramforge_packet::{Datagram, NetHeader, TransportHeader};
//!
//! let mut datagram = Datagram::init(3, &["ip", "udp"], b"probe".to_vec(), "eth").unwrap();
//! if let NetHeader::Ipv4(ip) = &mut datagram.net {
//!     ip.source = Ipv4Addr::new(10, 0, 0, 1);
//!     ip.destination = Ipv4Addr::new(10, 0, 0, 2);
//! }
//! if let Some(TransportHeader::Udp(udp)) = &mut datagram.transport {
//!     udp.source_port = Port(40000);
//!     udp.destination_port = Port(53);
//! }
//!
//! datagram.calc_from_payload().unwrap();
//! let wire = datagram.as_net_bytes().unwrap();
//! assert_eq!(wire.len() % 4, 0);
//! ```
//!
//! ## Working with a single header
//!
//! ```rust
//! use gramforge_core::{BitFieldGroup, MacAddr};
//! use gramforge_packet::{EtherType, EthernetHeader};
//!
//! let header = EthernetHeader::new(
//!     MacAddr::BROADCAST,
//!     MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
//!     EtherType::Ipv4,
//! );
//! let wire = header.as_net_bytes().unwrap();
//! assert_eq!(EthernetHeader::from_net_bytes(&wire).unwrap(), header);
//! ```

pub mod checksum;
pub mod datagram;
pub mod ethernet;
pub mod icmp;
pub mod ip;
pub mod tcp;
pub mod udp;
pub mod wifi;

// Re-export commonly used types
pub use checksum::{crc32_ieee, internet_checksum, pseudo_header_checksum, validate_checksum};
pub use datagram::{Datagram, LinkHeader, LinkTrailer, NetHeader, TransportHeader};
pub use ethernet::{EtherType, EthernetHeader, FcsTrailer};
pub use icmp::IcmpHeader;
pub use ip::{IpFlags, IpProtocol, Ipv4Header};
pub use tcp::{TcpFlags, TcpHeader};
pub use udp::UdpHeader;
pub use wifi::{LlcSnap, WifiHeader};
