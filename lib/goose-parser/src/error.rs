use snafu::Snafu;

use crate::ber::Tag;

/// Reasons a GOOSE APDU failed to decode.
///
/// Offsets are relative to the start of the buffer handed to
/// [`decode_apdu`](crate::decode_apdu).
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    #[snafu(display(
        "Truncated input at offset {offset}: needed {needed} bytes, {remaining} remaining"
    ))]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[snafu(display("Unexpected tag {found} at offset {offset}, expected {expected}"))]
    UnexpectedTag {
        offset: usize,
        expected: Tag,
        found: Tag,
    },

    #[snafu(display("Indefinite length at offset {offset} is not supported"))]
    IndefiniteLength { offset: usize },

    #[snafu(display("Length at offset {offset} spans {octets} octets (max 4)"))]
    LengthOverflow { offset: usize, octets: usize },

    #[snafu(display("Tag number at offset {offset} does not fit in 28 bits"))]
    TagOverflow { offset: usize },

    #[snafu(display("Field {field} has invalid length {length}"))]
    InvalidLength { field: &'static str, length: usize },

    #[snafu(display("Field {field} is not a valid string"))]
    InvalidString { field: &'static str },

    #[snafu(display("Field {field} uses the wrong primitive/constructed form"))]
    WrongForm { field: &'static str },

    #[snafu(display("Field {field} appears out of schema order"))]
    OutOfOrder { field: &'static str },

    #[snafu(display("Field {field} holds a timestamp outside the representable range"))]
    InvalidTimestamp { field: &'static str },

    #[snafu(display("Data values nest deeper than {max} levels"))]
    NestingTooDeep { max: usize },
}

/// Reasons the link-layer or GOOSE header could not be read.
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FrameError {
    #[snafu(display("{layer} header needs {needed} bytes, frame has {length}"))]
    TooShort {
        layer: &'static str,
        length: usize,
        needed: usize,
    },
}
