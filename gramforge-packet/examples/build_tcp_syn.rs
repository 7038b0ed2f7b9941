//! Example: Building a TCP SYN datagram
//!
//! The kind of frame a port scanner sends: a SYN segment with no payload,
//! checksummed over the pseudo-header.

use std::net::Ipv4Addr;

use gramforge_core::{BitFieldGroup, Port};
use gramforge_packet::{Datagram, NetHeader, TcpFlags, TcpHeader, TransportHeader};

fn main() {
    let mut datagram =
        Datagram::init(3, &["ip", "tcp"], Vec::new(), "eth").expect("Failed to construct datagram");

    if let NetHeader::Ipv4(ip) = &mut datagram.net {
        ip.source = Ipv4Addr::new(192, 168, 1, 100);
        ip.destination = Ipv4Addr::new(192, 168, 1, 1);
    }
    datagram.transport = Some(TransportHeader::Tcp(
        TcpHeader::new(Port(54321), Port::HTTP, 0x1000, TcpFlags::SYN).with_window(1024),
    ));

    datagram
        .calc_from_payload()
        .expect("Failed to derive fields");
    let wire = datagram.as_net_bytes().expect("Failed to serialize");

    println!("TCP SYN built successfully!");
    println!("Total size: {} bytes", wire.len());
    println!("TCP flags byte: 0x{:02X}", wire[47]);
    println!(
        "TCP checksum: 0x{:04X}",
        u16::from_be_bytes([wire[50], wire[51]])
    );
}
