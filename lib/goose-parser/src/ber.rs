//! Minimal BER tag-length-value reader.
//!
//! Only definite lengths are accepted. Tag numbers use the low-tag form or the
//! multi-octet high-tag form up to 28 bits.

use std::fmt;

use bytes::Buf;
use num_bigint::BigInt;
use snafu::ensure;

use crate::error::{
    DecodeError, IndefiniteLengthSnafu, InvalidLengthSnafu, LengthOverflowSnafu, TagOverflowSnafu,
    TruncatedSnafu,
};

const CONSTRUCTED_BIT: u8 = 0x20;
const HIGH_TAG_NUMBER: u8 = 0x1f;
const MAX_LENGTH_OCTETS: usize = 4;
const MAX_TAG_OCTETS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    Context,
    Private,
}

impl TagClass {
    const fn from_identifier(octet: u8) -> Self {
        match octet >> 6 {
            0 => Self::Universal,
            1 => Self::Application,
            2 => Self::Context,
            _ => Self::Private,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u32,
}

impl Tag {
    pub const fn application(number: u32, constructed: bool) -> Self {
        Self {
            class: TagClass::Application,
            constructed,
            number,
        }
    }

    pub const fn context(number: u32, constructed: bool) -> Self {
        Self {
            class: TagClass::Context,
            constructed,
            number,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            TagClass::Universal => "UNIVERSAL",
            TagClass::Application => "APPLICATION",
            TagClass::Context => "CONTEXT",
            TagClass::Private => "PRIVATE",
        };
        let form = if self.constructed {
            "constructed"
        } else {
            "primitive"
        };
        write!(f, "[{class} {}] {form}", self.number)
    }
}

/// One decoded tag-length-value element borrowing its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: Tag,
    /// Offset of the identifier octet.
    pub offset: usize,
    /// Offset of the first content octet.
    pub value_offset: usize,
    pub value: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// Reader over the contents of a constructed element.
    pub fn children(&self) -> BerReader<'a> {
        BerReader::with_offset(self.value, self.value_offset)
    }
}

#[derive(Clone, Debug)]
pub struct BerReader<'a> {
    input: &'a [u8],
    base: usize,
    position: usize,
}

impl<'a> BerReader<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self::with_offset(input, 0)
    }

    /// A reader whose reported offsets start at `base`.
    pub const fn with_offset(input: &'a [u8], base: usize) -> Self {
        Self {
            input,
            base,
            position: 0,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.position >= self.input.len()
    }

    pub const fn remaining(&self) -> usize {
        self.input.len().saturating_sub(self.position)
    }

    pub const fn offset(&self) -> usize {
        self.base + self.position
    }

    pub fn read_tlv(&mut self) -> Result<Tlv<'a>, DecodeError> {
        let offset = self.offset();
        let tag = self.read_tag()?;
        let length = self.read_length()?;
        let value_offset = self.offset();
        let value = self.take(length)?;
        Ok(Tlv {
            tag,
            offset,
            value_offset,
            value,
        })
    }

    fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        let offset = self.offset();
        let identifier = self.read_octet()?;
        let class = TagClass::from_identifier(identifier);
        let constructed = identifier & CONSTRUCTED_BIT != 0;

        let low = identifier & HIGH_TAG_NUMBER;
        if low != HIGH_TAG_NUMBER {
            return Ok(Tag {
                class,
                constructed,
                number: u32::from(low),
            });
        }

        let mut number = 0u32;
        for _ in 0..MAX_TAG_OCTETS {
            let octet = self.read_octet()?;
            number = (number << 7) | u32::from(octet & 0x7f);
            if octet & 0x80 == 0 {
                return Ok(Tag {
                    class,
                    constructed,
                    number,
                });
            }
        }
        TagOverflowSnafu { offset }.fail()
    }

    fn read_length(&mut self) -> Result<usize, DecodeError> {
        let offset = self.offset();
        let first = self.read_octet()?;
        if first & 0x80 == 0 {
            return Ok(usize::from(first));
        }

        let octets = usize::from(first & 0x7f);
        ensure!(octets != 0, IndefiniteLengthSnafu { offset });
        ensure!(
            octets <= MAX_LENGTH_OCTETS,
            LengthOverflowSnafu { offset, octets }
        );

        let mut length = 0usize;
        for octet in self.take(octets)? {
            length = (length << 8) | usize::from(*octet);
        }
        Ok(length)
    }

    fn read_octet(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        ensure!(
            needed <= remaining,
            TruncatedSnafu {
                offset: self.offset(),
                needed,
                remaining,
            }
        );
        let start = self.position;
        self.position += needed;
        Ok(&self.input[start..self.position])
    }
}

/// Two's-complement big-endian INTEGER contents.
pub fn integer(field: &'static str, value: &[u8]) -> Result<BigInt, DecodeError> {
    ensure!(
        !value.is_empty(),
        InvalidLengthSnafu {
            field,
            length: 0usize
        }
    );
    Ok(BigInt::from_signed_bytes_be(value))
}

/// BOOLEAN contents: exactly one octet, any non-zero value is true.
pub fn boolean(field: &'static str, value: &[u8]) -> Result<bool, DecodeError> {
    ensure!(
        value.len() == 1,
        InvalidLengthSnafu {
            field,
            length: value.len()
        }
    );
    Ok(value[0] != 0)
}

/// Seconds prefix of an IEC 61850 UtcTime: four big-endian octets of Unix
/// seconds followed by four octets of fraction and quality, which are dropped.
pub fn utc_seconds(field: &'static str, value: &[u8]) -> Result<u32, DecodeError> {
    ensure!(
        value.len() == 8,
        InvalidLengthSnafu {
            field,
            length: value.len()
        }
    );
    let mut value = value;
    Ok(value.get_u32())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_short_form_tlv() {
        let mut reader = BerReader::new(&[0x80, 0x03, b'a', b'b', b'c', 0xff]);
        let tlv = reader.read_tlv().unwrap();
        assert_eq!(tlv.tag, Tag::context(0, false));
        assert_eq!(tlv.value, b"abc");
        assert_eq!(tlv.value_offset, 2);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn reads_long_form_length() {
        let mut input = vec![0x61, 0x81, 0x80];
        input.extend(std::iter::repeat_n(0u8, 0x80));
        let tlv = BerReader::new(&input).read_tlv().unwrap();
        assert_eq!(tlv.tag, Tag::application(1, true));
        assert_eq!(tlv.value.len(), 0x80);
    }

    #[test]
    fn reads_high_tag_number() {
        let tlv = BerReader::new(&[0x9f, 0x81, 0x01, 0x01, 0x00])
            .read_tlv()
            .unwrap();
        assert_eq!(tlv.tag, Tag::context(129, false));
    }

    #[test]
    fn rejects_indefinite_length() {
        let error = BerReader::new(&[0x61, 0x80, 0x00, 0x00])
            .read_tlv()
            .unwrap_err();
        assert_eq!(error, DecodeError::IndefiniteLength { offset: 1 });
    }

    #[test]
    fn rejects_oversized_length() {
        let error = BerReader::new(&[0x61, 0x85, 1, 2, 3, 4, 5])
            .read_tlv()
            .unwrap_err();
        assert_eq!(
            error,
            DecodeError::LengthOverflow {
                offset: 1,
                octets: 5
            }
        );
    }

    #[test]
    fn rejects_value_past_end() {
        let error = BerReader::new(&[0x80, 0x05, b'a']).read_tlv().unwrap_err();
        assert_eq!(
            error,
            DecodeError::Truncated {
                offset: 2,
                needed: 5,
                remaining: 1
            }
        );
    }

    #[test]
    fn integers_are_signed() {
        assert_eq!(integer("x", &[0x01, 0x00]).unwrap(), BigInt::from(256));
        assert_eq!(integer("x", &[0xff]).unwrap(), BigInt::from(-1));
        assert_eq!(integer("x", &[0x00, 0xff]).unwrap(), BigInt::from(255));
        assert!(integer("x", &[]).is_err());
    }

    #[test]
    fn booleans_need_one_octet() {
        assert!(boolean("x", &[0x01]).unwrap());
        assert!(boolean("x", &[0xff]).unwrap());
        assert!(!boolean("x", &[0x00]).unwrap());
        assert!(boolean("x", &[0x00, 0x00]).is_err());
    }

    #[test]
    fn utc_time_keeps_seconds_only() {
        let seconds =
            utc_seconds("t", &[0x5f, 0x5e, 0x10, 0x00, 0xaa, 0xbb, 0xcc, 0x0a]).unwrap();
        assert_eq!(seconds, 0x5f5e_1000);
        assert!(utc_seconds("t", &[0x5f, 0x5e, 0x10, 0x00]).is_err());
    }
}
