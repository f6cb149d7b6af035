use std::fmt;

use goose_parser::{FrameError, IpTransport, MacAddress};
use snafu::{ResultExt, Snafu, ensure};

use crate::{
    frame::{PacketDirection, RawFrame},
    packet::GoosePacket,
};

#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
pub enum KeyError {
    #[snafu(display("GOOSE carried over {} is not supported", transport.name()))]
    UnsupportedTransport { transport: IpTransport },

    #[snafu(display("EtherType {ether_type:#06x} is not GOOSE"))]
    NotGoose { ether_type: u16 },

    #[snafu(display("Frame could not be parsed: {source}"))]
    Frame { source: FrameError },
}

impl KeyError {
    /// Short label used as a metric tag.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::UnsupportedTransport { .. } => "unsupported_transport",
            Self::NotGoose { .. } => "not_goose",
            Self::Frame { .. } => "frame_too_short",
        }
    }
}

/// Identity of a flow. Two packets belong to the same flow exactly when their
/// keys are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub source: MacAddress,
    pub destination: MacAddress,
    pub appid: u16,
    pub gocb_ref: String,
    pub st_num: i64,
}

impl FlowKey {
    pub fn build(frame: &RawFrame, direction: PacketDirection) -> Result<Self, KeyError> {
        Self::from_packet(&GoosePacket::parse(frame.clone()), direction)
    }

    /// Key an already parsed packet. `Reverse` swaps the link addresses so
    /// both directions of an exchange map to the same flow.
    pub fn from_packet(
        packet: &GoosePacket,
        direction: PacketDirection,
    ) -> Result<Self, KeyError> {
        let ethernet = packet.frame().ethernet().context(FrameSnafu)?;

        if let Some(transport @ (IpTransport::Tcp | IpTransport::Udp)) = ethernet.transport() {
            return UnsupportedTransportSnafu { transport }.fail();
        }
        ensure!(
            ethernet.is_goose(),
            NotGooseSnafu {
                ether_type: ethernet.ether_type
            }
        );

        let (source, destination) = match direction {
            PacketDirection::Forward => (ethernet.source, ethernet.destination),
            PacketDirection::Reverse => (ethernet.destination, ethernet.source),
        };
        let fields = packet.fields();

        Ok(Self {
            source,
            destination,
            appid: fields.appid,
            gocb_ref: fields.gocb_ref.clone(),
            st_num: fields.st_num,
        })
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} appid={:#06x} gocbRef={} stNum={}",
            self.source, self.destination, self.appid, self.gocb_ref, self.st_num
        )
    }
}
