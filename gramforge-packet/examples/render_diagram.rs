//! Example: Rendering an annotated bit diagram
//!
//! Prints the IETF-style diagram of a complete UDP datagram, with the
//! payload shown as a windowed hex dump.

use std::net::Ipv4Addr;

use gramforge_core::{Port, RenderOptions, Renderer};
use gramforge_packet::{Datagram, NetHeader, TransportHeader};

fn main() {
    let mut datagram = Datagram::init(3, &["ip", "udp"], b"Hello World!".to_vec(), "eth")
        .expect("Failed to construct datagram");

    if let NetHeader::Ipv4(ip) = &mut datagram.net {
        ip.source = Ipv4Addr::new(10, 0, 0, 1);
        ip.destination = Ipv4Addr::new(10, 0, 0, 2);
    }
    if let Some(TransportHeader::Udp(udp)) = &mut datagram.transport {
        udp.source_port = Port(1024);
        udp.destination_port = Port(1025);
    }
    datagram
        .calc_from_payload()
        .expect("Failed to derive fields");

    let renderer = Renderer::with_options(RenderOptions {
        neat_strings: true,
        ..Default::default()
    });
    print!("{}", renderer.render(&datagram));
}
