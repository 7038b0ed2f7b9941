//! Layered datagram aggregation
//!
//! A [`Datagram`] bundles a link header, a network header, an optional
//! transport header, the payload, and a link trailer, then computes every
//! derived field bottom-up: transport first, network second, trailer CRC
//! last, each step reading the wire image produced by the one below it.
//! The emitted image is always a whole number of 32-bit words; the
//! shortfall is zero-filled in the frame padding region, which the
//! network and transport length fields do not count.

use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;
use tracing::debug;

use gramforge_core::{BitFieldGroup, Error, Field, GroupKind, MacAddr, Port, Result};

use crate::ethernet::{EtherType, EthernetHeader, FcsTrailer};
use crate::icmp::IcmpHeader;
use crate::ip::{IpProtocol, Ipv4Header};
use crate::tcp::{TcpFlags, TcpHeader};
use crate::udp::UdpHeader;
use crate::wifi::WifiHeader;

/// Link-layer header variants
///
/// The discriminator never reaches the wire; only the active arm is
/// serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkHeader {
    /// Ethernet II
    Ethernet(EthernetHeader),
    /// 802.11 data frame
    Wifi(WifiHeader),
}

impl LinkHeader {
    /// Construct the variant named by `tag`, with neutral addresses and
    /// `ethertype` naming the network arm the frame will carry
    pub fn from_tag(tag: &str, ethertype: EtherType) -> Result<Self> {
        match tag {
            "eth" => Ok(LinkHeader::Ethernet(EthernetHeader::new(
                MacAddr::ZERO,
                MacAddr::ZERO,
                ethertype,
            ))),
            "wifi" => Ok(LinkHeader::Wifi(
                WifiHeader::new(MacAddr::ZERO, MacAddr::ZERO, MacAddr::ZERO)
                    .with_ethertype(ethertype),
            )),
            other => Err(Error::invalid_header(other)),
        }
    }

    /// The active arm as a bit-field record
    pub fn as_group(&self) -> &dyn BitFieldGroup {
        match self {
            LinkHeader::Ethernet(header) => header,
            LinkHeader::Wifi(header) => header,
        }
    }

    /// The EtherType of the carried network arm
    pub fn ether_type(&self) -> EtherType {
        match self {
            LinkHeader::Ethernet(header) => header.ethertype,
            LinkHeader::Wifi(header) => header.snap.ethertype,
        }
    }

    fn wire_len(&self) -> usize {
        self.as_group().bit_width() / 8
    }
}

/// Network-layer header variants
#[derive(Debug, Clone, PartialEq)]
pub enum NetHeader {
    /// IPv4
    Ipv4(Ipv4Header),
    /// ICMP carried directly above the link layer
    Icmp(IcmpHeader),
}

impl NetHeader {
    /// Construct the variant named by `tag` with neutral defaults
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "ip" => Ok(NetHeader::Ipv4(Ipv4Header::new(
                Ipv4Addr::UNSPECIFIED,
                Ipv4Addr::UNSPECIFIED,
                IpProtocol::Custom(0),
            ))),
            "icmp" => Ok(NetHeader::Icmp(IcmpHeader::echo_request(0, 0))),
            other => Err(Error::invalid_header(other)),
        }
    }

    /// The active arm as a bit-field record
    pub fn as_group(&self) -> &dyn BitFieldGroup {
        match self {
            NetHeader::Ipv4(header) => header,
            NetHeader::Icmp(header) => header,
        }
    }

    /// The EtherType a link header uses to name this arm
    pub fn ether_type(&self) -> EtherType {
        match self {
            NetHeader::Ipv4(_) => EtherType::Ipv4,
            NetHeader::Icmp(_) => EtherType::Icmp,
        }
    }

    fn wire_len(&self) -> usize {
        self.as_group().bit_width() / 8
    }
}

/// Transport-layer header variants
#[derive(Debug, Clone, PartialEq)]
pub enum TransportHeader {
    /// UDP
    Udp(UdpHeader),
    /// TCP
    Tcp(TcpHeader),
}

impl TransportHeader {
    /// Construct the variant named by `tag` with neutral defaults
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "udp" => Ok(TransportHeader::Udp(UdpHeader::new(Port(0), Port(0)))),
            "tcp" => Ok(TransportHeader::Tcp(TcpHeader::new(
                Port(0),
                Port(0),
                0,
                TcpFlags::NONE,
            ))),
            other => Err(Error::invalid_header(other)),
        }
    }

    /// The active arm as a bit-field record
    pub fn as_group(&self) -> &dyn BitFieldGroup {
        match self {
            TransportHeader::Udp(header) => header,
            TransportHeader::Tcp(header) => header,
        }
    }

    fn wire_len(&self) -> usize {
        self.as_group().bit_width() / 8
    }

    fn name(&self) -> &'static str {
        match self {
            TransportHeader::Udp(_) => "UDP header",
            TransportHeader::Tcp(_) => "TCP header",
        }
    }
}

/// Link-layer trailer variants
///
/// Both links close their frames with the same 32-bit FCS record.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTrailer {
    /// Ethernet FCS
    Ethernet(FcsTrailer),
    /// 802.11 FCS
    Wifi(FcsTrailer),
}

impl LinkTrailer {
    /// Construct the variant named by `tag`
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "eth" => Ok(LinkTrailer::Ethernet(FcsTrailer::new())),
            "wifi" => Ok(LinkTrailer::Wifi(FcsTrailer::new())),
            other => Err(Error::invalid_footer(other)),
        }
    }

    /// The active arm as a bit-field record
    pub fn as_group(&self) -> &dyn BitFieldGroup {
        match self {
            LinkTrailer::Ethernet(fcs) => fcs,
            LinkTrailer::Wifi(fcs) => fcs,
        }
    }

    fn fcs_mut(&mut self) -> &mut FcsTrailer {
        match self {
            LinkTrailer::Ethernet(fcs) => fcs,
            LinkTrailer::Wifi(fcs) => fcs,
        }
    }

    fn wire_len(&self) -> usize {
        self.as_group().bit_width() / 8
    }
}

/// A full layered datagram
///
/// Lifecycle: construct (directly or via [`Datagram::init`]), call
/// [`calc_from_payload`](Datagram::calc_from_payload) once to fill in the
/// derived fields, then emit with `as_net_bytes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Datagram {
    /// Link-layer header
    pub link: LinkHeader,
    /// Network-layer header
    pub net: NetHeader,
    /// Optional transport-layer header
    pub transport: Option<TransportHeader>,
    /// Application payload
    pub payload: Vec<u8>,
    /// Frame-level zero fill keeping the emitted image 32-bit aligned;
    /// not counted by the network and transport length fields
    pub padding: Vec<u8>,
    /// Link-layer trailer
    pub trailer: LinkTrailer,
}

impl Datagram {
    /// Build a datagram from layer tags
    ///
    /// `layer` names the outermost user-supplied layer (2, 3, or 4);
    /// `tags[0]` names that layer's variant and later tags descend the
    /// stack. Layers above the named one get neutral defaults: an
    /// Ethernet header with all-zero addresses, an IPv4 header with
    /// unspecified addresses. Unknown tags are rejected with
    /// [`Error::InvalidHeader`] / [`Error::InvalidFooter`].
    pub fn init(layer: u8, tags: &[&str], payload: Vec<u8>, footer_tag: &str) -> Result<Self> {
        let (link_tag, net, transport) = match layer {
            2 => {
                let net = NetHeader::from_tag(tag_at(tags, 1)?)?;
                let transport = tags.get(2).map(|t| TransportHeader::from_tag(t)).transpose()?;
                (tag_at(tags, 0)?, net, transport)
            }
            3 => {
                let net = NetHeader::from_tag(tag_at(tags, 0)?)?;
                let transport = tags.get(1).map(|t| TransportHeader::from_tag(t)).transpose()?;
                ("eth", net, transport)
            }
            4 => {
                let transport = TransportHeader::from_tag(tag_at(tags, 0)?)?;
                ("eth", NetHeader::from_tag("ip")?, Some(transport))
            }
            other => return Err(Error::invalid_header(format!("layer {other}"))),
        };
        // The link header's EtherType names the network arm it carries.
        let link = LinkHeader::from_tag(link_tag, net.ether_type())?;
        let trailer = LinkTrailer::from_tag(footer_tag)?;

        let mut datagram = Datagram {
            link,
            net,
            transport,
            payload,
            padding: Vec::new(),
            trailer,
        };
        // Keep the IPv4 protocol number in step with the transport arm.
        if let (NetHeader::Ipv4(ip), Some(transport)) = (&mut datagram.net, &datagram.transport) {
            ip.protocol = match transport {
                TransportHeader::Udp(_) => IpProtocol::Udp,
                TransportHeader::Tcp(_) => IpProtocol::Tcp,
            };
        }
        Ok(datagram)
    }

    /// Compute every derived field bottom-up
    ///
    /// Sizes the frame padding so the emitted image is a multiple of
    /// 32 bits, then derives transport length/checksum over the payload,
    /// network length/checksum over the transport wire plus payload, and
    /// finally the trailer CRC over everything preceding it. The order is
    /// strict: each step reads the wire image of the one below.
    ///
    /// # Errors
    ///
    /// [`Error::NoCalcMethod`] when a transport header is present but the
    /// network layer cannot supply the pseudo-header addresses.
    pub fn calc_from_payload(&mut self) -> Result<()> {
        self.size_padding();

        let transport_wire = match (&mut self.transport, &self.net) {
            (Some(TransportHeader::Udp(udp)), NetHeader::Ipv4(ip)) => {
                udp.calc_length_and_checksum(ip.source, ip.destination, &self.payload)?;
                Some(udp.as_net_bytes()?)
            }
            (Some(TransportHeader::Tcp(tcp)), NetHeader::Ipv4(ip)) => {
                tcp.calc_checksum(ip.source, ip.destination, &self.payload)?;
                Some(tcp.as_net_bytes()?)
            }
            // The pseudo-header needs IPv4 addresses.
            (Some(transport), NetHeader::Icmp(_)) => {
                return Err(Error::NoCalcMethod(transport.name()))
            }
            (None, _) => None,
        };

        let mut net_payload = BytesMut::new();
        if let Some(wire) = &transport_wire {
            net_payload.put_slice(wire);
        }
        net_payload.put_slice(&self.payload);

        let net_wire = match &mut self.net {
            NetHeader::Ipv4(ip) => {
                ip.calc_length_and_header_checksum(&net_payload)?;
                ip.as_net_bytes()?
            }
            NetHeader::Icmp(icmp) => {
                icmp.calc_checksum(&net_payload)?;
                icmp.as_net_bytes()?
            }
        };

        let link_wire = self.link.as_group().as_net_bytes()?;
        let mut frame = BytesMut::with_capacity(
            link_wire.len() + net_wire.len() + net_payload.len() + self.padding.len(),
        );
        frame.put_slice(&link_wire);
        frame.put_slice(&net_wire);
        frame.put_slice(&net_payload);
        frame.put_slice(&self.padding);
        self.trailer.fcs_mut().calc_crc(&frame);

        debug!(
            "Derived fields computed: {} header bytes, {} payload bytes, {} padding bytes",
            link_wire.len() + net_wire.len(),
            self.payload.len(),
            self.padding.len()
        );
        Ok(())
    }

    /// Parse an Ethernet-framed wire image produced by `as_net_bytes`
    ///
    /// Shorthand for [`parse_link`](Datagram::parse_link) with the `eth`
    /// tag.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_link("eth", data)
    }

    /// Parse a wire image produced by `as_net_bytes`, framed by the link
    /// variant named by `tag`
    ///
    /// The link header's EtherType selects the network arm and the IPv4
    /// protocol number the transport arm; an unsupported discriminator is
    /// reported as [`Error::UnknownVariantTag`]. Frame padding beyond the
    /// IPv4 total length is split off into `padding`; ICMP carries no
    /// length field, so in that arm any fill bytes stay with the payload.
    pub fn parse_link(tag: &str, data: &[u8]) -> Result<Self> {
        let (link, header_len) = match tag {
            "eth" => (
                LinkHeader::Ethernet(EthernetHeader::from_net_bytes(data)?),
                EthernetHeader::WIRE_SIZE,
            ),
            "wifi" => (
                LinkHeader::Wifi(WifiHeader::from_net_bytes(data)?),
                WifiHeader::WIRE_SIZE,
            ),
            other => return Err(Error::invalid_header(other)),
        };
        if data.len() < header_len + FcsTrailer::WIRE_SIZE {
            return Err(Error::insufficient(
                header_len + FcsTrailer::WIRE_SIZE,
                data.len(),
            ));
        }
        let trailer_start = data.len() - FcsTrailer::WIRE_SIZE;
        let body = &data[header_len..trailer_start];
        let fcs = FcsTrailer::from_net_bytes(&data[trailer_start..])?;
        let trailer = match &link {
            LinkHeader::Ethernet(_) => LinkTrailer::Ethernet(fcs),
            LinkHeader::Wifi(_) => LinkTrailer::Wifi(fcs),
        };

        let (net, transport, payload, padding) = parse_body(link.ether_type(), body)?;
        Ok(Datagram {
            link,
            net,
            transport,
            payload,
            padding,
            trailer,
        })
    }

    /// Total emitted size in bytes
    pub fn wire_len(&self) -> usize {
        self.link.wire_len()
            + self.net.wire_len()
            + self.transport.as_ref().map_or(0, |t| t.wire_len())
            + self.payload.len()
            + self.padding.len()
            + self.trailer.wire_len()
    }

    // Zero-fill the frame padding region so the emitted image is a whole
    // number of 32-bit words.
    fn size_padding(&mut self) {
        self.padding.clear();
        let rem = (self.wire_len()) % 4;
        if rem != 0 {
            self.padding.resize(4 - rem, 0);
        }
    }
}

impl BitFieldGroup for Datagram {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Frame
    }

    fn layer(&self) -> u8 {
        2
    }

    fn display_name(&self) -> &str {
        "Datagram"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::group("link", self.link.as_group()),
            Field::group("net", self.net.as_group()),
            Field::optional("transport", self.transport.as_ref().map(|t| t.as_group())),
            Field::bytes("payload", &self.payload),
            Field::bytes("padding", &self.padding),
            Field::group("trailer", self.trailer.as_group()),
        ]
    }
}

fn tag_at<'a>(tags: &[&'a str], index: usize) -> Result<&'a str> {
    tags.get(index)
        .copied()
        .ok_or_else(|| Error::invalid_header(format!("missing header tag {index}")))
}

// Dispatch the frame body on the link header's EtherType.
fn parse_body(
    ethertype: EtherType,
    body: &[u8],
) -> Result<(NetHeader, Option<TransportHeader>, Vec<u8>, Vec<u8>)> {
    match ethertype {
        EtherType::Ipv4 => {
            let ip = Ipv4Header::from_net_bytes(body)?;
            let packet_end = (ip.total_length as usize).clamp(Ipv4Header::WIRE_SIZE, body.len());
            let padding = body[packet_end..].to_vec();
            let inner = &body[Ipv4Header::WIRE_SIZE..packet_end];

            let (transport, payload) = match ip.protocol {
                IpProtocol::Udp => {
                    let udp = UdpHeader::from_net_bytes(inner)?;
                    (
                        Some(TransportHeader::Udp(udp)),
                        inner[UdpHeader::WIRE_SIZE..].to_vec(),
                    )
                }
                IpProtocol::Tcp => {
                    let tcp = TcpHeader::from_net_bytes(inner)?;
                    (
                        Some(TransportHeader::Tcp(tcp)),
                        inner[TcpHeader::WIRE_SIZE..].to_vec(),
                    )
                }
                _ => (None, inner.to_vec()),
            };
            Ok((NetHeader::Ipv4(ip), transport, payload, padding))
        }
        EtherType::Icmp => {
            let icmp = IcmpHeader::from_net_bytes(body)?;
            // No length field in ICMP, so frame fill bytes are
            // indistinguishable from payload and stay with it. Trailing
            // zeros leave the checksum undisturbed.
            let payload = body[IcmpHeader::WIRE_SIZE..].to_vec();
            Ok((NetHeader::Icmp(icmp), None, payload, Vec::new()))
        }
        other => Err(Error::UnknownVariantTag(format!("ethertype {other}"))),
    }
}
