use bytes::Buf;
use snafu::ensure;

use crate::error::{FrameError, TooShortSnafu};

pub const GOOSE_HEADER_LEN: usize = 8;

/// Fixed GOOSE header preceding the APDU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GooseHeader {
    pub appid: u16,
    /// Octets from the start of the APPID to the end of the APDU.
    pub length: u16,
    pub reserved1: u16,
    pub reserved2: u16,
}

impl GooseHeader {
    /// Split an EtherType 0x88B8 payload into its header and APDU bytes.
    ///
    /// The APDU slice ends where `length` says it does, clamped to what was
    /// captured; a short capture surfaces later as an APDU decode error.
    pub fn parse(payload: &[u8]) -> Result<(Self, &[u8]), FrameError> {
        ensure!(
            payload.len() >= GOOSE_HEADER_LEN,
            TooShortSnafu {
                layer: "goose",
                length: payload.len(),
                needed: GOOSE_HEADER_LEN,
            }
        );

        let mut buf = payload;
        let header = Self {
            appid: buf.get_u16(),
            length: buf.get_u16(),
            reserved1: buf.get_u16(),
            reserved2: buf.get_u16(),
        };

        let end = usize::from(header.length).clamp(GOOSE_HEADER_LEN, payload.len());
        Ok((header, &payload[GOOSE_HEADER_LEN..end]))
    }

    /// Traffic class label carried in the first reserved word.
    pub const fn label(&self) -> u16 {
        self.reserved1
    }
}
