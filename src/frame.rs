use bytes::Bytes;
use goose_parser::{EthernetFrame, FrameError, MacAddress};

/// A captured link-layer frame. `data` starts at the Ethernet destination
/// address; `timestamp` is the capture time in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFrame {
    data: Bytes,
    timestamp: f64,
}

impl RawFrame {
    pub fn new(data: impl Into<Bytes>, timestamp: f64) -> Self {
        Self {
            data: data.into(),
            timestamp,
        }
    }

    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    pub const fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn ethernet(&self) -> Result<EthernetFrame<'_>, FrameError> {
        EthernetFrame::parse(&self.data)
    }

    pub fn source(&self) -> Option<MacAddress> {
        self.ethernet().ok().map(|frame| frame.source)
    }

    pub fn destination(&self) -> Option<MacAddress> {
        self.ethernet().ok().map(|frame| frame.destination)
    }
}

/// Direction of a packet relative to the flow it belongs to, as assigned by
/// the capture session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketDirection {
    Forward,
    Reverse,
}

impl PacketDirection {
    pub const fn reverse(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}
