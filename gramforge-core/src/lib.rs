//! gramforge core library
//!
//! Fundamental machinery for building, serializing, and parsing layered
//! network datagrams with bit-exact control over wire layout:
//!
//! - [`layout`] - the bit-field record engine behind every header type
//! - [`addr`] - MAC, IPv4, and port leaves with range/subnet expansion
//! - [`render`] - IETF-style annotated bit diagrams
//! - [`error`] - the shared error type
//!
//! Concrete protocol headers and the datagram aggregator live in the
//! `gramforge-packet` crate.

pub mod addr;
pub mod error;
pub mod layout;
pub mod render;

// Re-export commonly used types
pub use addr::{expand_ipv4, ipv4_from_net_bytes, parse_ipv4, parse_range, MacAddr, Port};
pub use error::{Error, Result};
pub use layout::{BitFieldGroup, BitReader, BitWriter, Field, FieldValue, GroupKind};
pub use render::{RenderOptions, Renderer};
