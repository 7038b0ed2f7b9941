//! Example: Building a UDP probe datagram
//!
//! Demonstrates the full datagram lifecycle: construct from layer tags,
//! fill in addresses, derive lengths and checksums, and emit the
//! 32-bit-aligned wire image.

use std::net::Ipv4Addr;

use gramforge_core::{BitFieldGroup, MacAddr, Port};
use gramforge_packet::{Datagram, LinkHeader, NetHeader, TransportHeader};

fn main() {
    let mut datagram = Datagram::init(3, &["ip", "udp"], b"Hello World!".to_vec(), "eth")
        .expect("Failed to construct datagram");

    if let LinkHeader::Ethernet(eth) = &mut datagram.link {
        eth.destination = MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        eth.source = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }
    if let NetHeader::Ipv4(ip) = &mut datagram.net {
        ip.source = Ipv4Addr::new(192, 168, 1, 100);
        ip.destination = Ipv4Addr::new(192, 168, 1, 1);
    }
    if let Some(TransportHeader::Udp(udp)) = &mut datagram.transport {
        udp.source_port = Port(54321);
        udp.destination_port = Port::DNS;
    }

    datagram
        .calc_from_payload()
        .expect("Failed to derive fields");
    let wire = datagram.as_net_bytes().expect("Failed to serialize");

    println!("UDP probe built successfully!");
    println!("Total size: {} bytes (32-bit aligned: {})", wire.len(), wire.len() % 4 == 0);
    println!("Ethernet header: {:02X?}", &wire[..14]);
    println!("IP total length: {}", u16::from_be_bytes([wire[16], wire[17]]));
    println!(
        "UDP ports: {} -> {}",
        u16::from_be_bytes([wire[34], wire[35]]),
        u16::from_be_bytes([wire[36], wire[37]])
    );

    let parsed = Datagram::parse(&wire).expect("Failed to re-parse");
    println!("Re-parsed payload: {:?}", String::from_utf8_lossy(&parsed.payload));
}
