use goose_parser::GooseHeader;

use crate::{
    fields::{ApduStatus, ProtocolFields},
    frame::RawFrame,
};

/// A frame parsed once into everything flow aggregation reads from it.
#[derive(Clone, Debug, PartialEq)]
pub struct GoosePacket {
    frame: RawFrame,
    header: Option<GooseHeader>,
    fields: ProtocolFields,
    status: ApduStatus,
}

impl GoosePacket {
    /// Never fails: frames that cannot be parsed carry default fields and no
    /// header.
    pub fn parse(frame: RawFrame) -> Self {
        let (fields, header, status) = match frame.ethernet() {
            Ok(ethernet) => ProtocolFields::extract(&ethernet),
            Err(_) => (ProtocolFields::default(), None, ApduStatus::Absent),
        };

        Self {
            frame,
            header,
            fields,
            status,
        }
    }

    pub const fn frame(&self) -> &RawFrame {
        &self.frame
    }

    pub const fn timestamp(&self) -> f64 {
        self.frame.timestamp()
    }

    pub const fn header(&self) -> Option<&GooseHeader> {
        self.header.as_ref()
    }

    pub const fn fields(&self) -> &ProtocolFields {
        &self.fields
    }

    pub const fn status(&self) -> &ApduStatus {
        &self.status
    }

    /// Captured frame length in bytes.
    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// The GOOSE header's length field, or 0 without a header.
    pub fn payload_size(&self) -> usize {
        self.header
            .map_or(0, |header| usize::from(header.length))
    }

    pub fn header_size(&self) -> usize {
        self.len().saturating_sub(self.payload_size())
    }
}
