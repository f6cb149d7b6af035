//! Decoding of IEC 61850 GOOSE frames: the Ethernet/802.1Q envelope, the
//! fixed GOOSE header, and the BER-encoded APDU.

pub mod apdu;
pub mod ber;
pub mod ethernet;
pub mod header;

mod error;

#[cfg(any(test, feature = "test"))]
pub mod test_util;

pub use apdu::{ApduField, ApduValue, DecodedApdu, decode_apdu, format_timestamp};
pub use error::{DecodeError, FrameError};
pub use ethernet::{EthernetFrame, IpTransport, MacAddress};
pub use header::GooseHeader;
