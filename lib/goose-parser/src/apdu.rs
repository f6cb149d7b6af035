//! Decoder for the IEC 61850-8-1 `IECGoosePdu` structure.
//!
//! ```text
//! IECGoosePdu ::= [APPLICATION 1] IMPLICIT SEQUENCE {
//!     gocbRef           [0]  IMPLICIT VisibleString,
//!     timeAllowedtoLive [1]  IMPLICIT INTEGER,
//!     datSet            [2]  IMPLICIT VisibleString,
//!     goID              [3]  IMPLICIT VisibleString OPTIONAL,
//!     t                 [4]  IMPLICIT UtcTime,
//!     stNum             [5]  IMPLICIT INTEGER,
//!     sqNum             [6]  IMPLICIT INTEGER,
//!     test              [7]  IMPLICIT BOOLEAN DEFAULT FALSE,
//!     confRev           [8]  IMPLICIT INTEGER,
//!     ndsCom            [9]  IMPLICIT BOOLEAN DEFAULT FALSE,
//!     numDatSetEntries  [10] IMPLICIT INTEGER,
//!     allData           [11] IMPLICIT SEQUENCE OF Data,
//!     security          [12] ANY OPTIONAL
//! }
//! ```

use bytes::Bytes;
use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use indexmap::IndexMap;
use num_bigint::BigInt;
use snafu::{OptionExt, ensure};

use crate::ber::{self, BerReader, Tag, TagClass, Tlv};
use crate::error::{
    DecodeError, InvalidLengthSnafu, InvalidStringSnafu, InvalidTimestampSnafu,
    NestingTooDeepSnafu, OutOfOrderSnafu, UnexpectedTagSnafu, WrongFormSnafu,
};

/// Outer tag of a GOOSE APDU.
pub const GOOSE_PDU_TAG: Tag = Tag::application(1, true);

/// Deepest array/structure nesting accepted inside `allData`.
pub const MAX_DATA_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApduField {
    GoCbRef,
    TimeAllowedToLive,
    DatSet,
    GoId,
    T,
    StNum,
    SqNum,
    Test,
    ConfRev,
    NdsCom,
    NumDatSetEntries,
    AllData,
    Security,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    VisibleString,
    Integer,
    Boolean,
    UtcTime,
    OctetString,
    DataSequence,
}

impl ApduField {
    pub const ALL: [Self; 13] = [
        Self::GoCbRef,
        Self::TimeAllowedToLive,
        Self::DatSet,
        Self::GoId,
        Self::T,
        Self::StNum,
        Self::SqNum,
        Self::Test,
        Self::ConfRev,
        Self::NdsCom,
        Self::NumDatSetEntries,
        Self::AllData,
        Self::Security,
    ];

    pub const fn tag_number(self) -> u32 {
        self as u32
    }

    pub const fn from_tag_number(number: u32) -> Option<Self> {
        if (number as usize) < Self::ALL.len() {
            Some(Self::ALL[number as usize])
        } else {
            None
        }
    }

    /// Field name as written in the ASN.1 module.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GoCbRef => "gocbRef",
            Self::TimeAllowedToLive => "timeAllowedtoLive",
            Self::DatSet => "datSet",
            Self::GoId => "goID",
            Self::T => "t",
            Self::StNum => "stNum",
            Self::SqNum => "sqNum",
            Self::Test => "test",
            Self::ConfRev => "confRev",
            Self::NdsCom => "ndsCom",
            Self::NumDatSetEntries => "numDatSetEntries",
            Self::AllData => "allData",
            Self::Security => "security",
        }
    }

    const fn kind(self) -> FieldKind {
        match self {
            Self::GoCbRef | Self::DatSet | Self::GoId => FieldKind::VisibleString,
            Self::TimeAllowedToLive
            | Self::StNum
            | Self::SqNum
            | Self::ConfRev
            | Self::NumDatSetEntries => FieldKind::Integer,
            Self::Test | Self::NdsCom => FieldKind::Boolean,
            Self::T => FieldKind::UtcTime,
            Self::Security => FieldKind::OctetString,
            Self::AllData => FieldKind::DataSequence,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ApduValue {
    Text(String),
    Integer(BigInt),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Octets(Bytes),
    /// `(choice name, rendered value)` for each element of `allData`.
    DataList(Vec<(String, String)>),
}

/// Fields present in one APDU, in wire order. Fields missing from the
/// encoding are missing here too.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedApdu {
    fields: IndexMap<ApduField, ApduValue>,
}

impl DecodedApdu {
    pub fn get(&self, field: ApduField) -> Option<&ApduValue> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: ApduField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ApduField, &ApduValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    pub fn text(&self, field: ApduField) -> Option<&str> {
        match self.get(field)? {
            ApduValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn integer(&self, field: ApduField) -> Option<&BigInt> {
        match self.get(field)? {
            ApduValue::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn boolean(&self, field: ApduField) -> Option<bool> {
        match self.get(field)? {
            ApduValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn timestamp(&self, field: ApduField) -> Option<DateTime<Utc>> {
        match self.get(field)? {
            ApduValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&[(String, String)]> {
        match self.get(ApduField::AllData)? {
            ApduValue::DataList(values) => Some(values),
            _ => None,
        }
    }
}

/// Decode a GOOSE APDU. Bytes following the outer element are ignored since
/// Ethernet padding routinely trails the PDU.
pub fn decode_apdu(input: &[u8]) -> Result<DecodedApdu, DecodeError> {
    let outer = BerReader::new(input).read_tlv()?;
    ensure!(
        outer.tag == GOOSE_PDU_TAG,
        UnexpectedTagSnafu {
            offset: outer.offset,
            expected: GOOSE_PDU_TAG,
            found: outer.tag,
        }
    );

    let mut body = outer.children();
    let mut fields = IndexMap::new();
    let mut previous: Option<ApduField> = None;
    while !body.is_empty() {
        let tlv = body.read_tlv()?;
        if tlv.tag.class != TagClass::Context {
            continue;
        }
        let Some(field) = ApduField::from_tag_number(tlv.tag.number) else {
            continue;
        };
        ensure!(
            previous.is_none_or(|previous| previous < field),
            OutOfOrderSnafu {
                field: field.name()
            }
        );
        previous = Some(field);
        fields.insert(field, decode_field(field, &tlv)?);
    }

    Ok(DecodedApdu { fields })
}

fn decode_field(field: ApduField, tlv: &Tlv<'_>) -> Result<ApduValue, DecodeError> {
    let kind = field.kind();
    let name = field.name();
    ensure!(
        tlv.tag.constructed == (kind == FieldKind::DataSequence),
        WrongFormSnafu { field: name }
    );

    Ok(match kind {
        FieldKind::VisibleString => ApduValue::Text(visible_string(name, tlv.value)?),
        FieldKind::Integer => ApduValue::Integer(ber::integer(name, tlv.value)?),
        FieldKind::Boolean => ApduValue::Boolean(ber::boolean(name, tlv.value)?),
        FieldKind::UtcTime => ApduValue::Timestamp(utc_time(name, tlv.value)?),
        FieldKind::OctetString => ApduValue::Octets(Bytes::copy_from_slice(tlv.value)),
        FieldKind::DataSequence => {
            let mut values = Vec::new();
            let mut children = tlv.children();
            while !children.is_empty() {
                values.push(decode_data(&children.read_tlv()?, 1)?);
            }
            ApduValue::DataList(values)
        }
    })
}

fn visible_string(field: &'static str, value: &[u8]) -> Result<String, DecodeError> {
    ensure!(value.is_ascii(), InvalidStringSnafu { field });
    Ok(value.iter().map(|octet| char::from(*octet)).collect())
}

fn utc_time(field: &'static str, value: &[u8]) -> Result<DateTime<Utc>, DecodeError> {
    let seconds = ber::utc_seconds(field, value)?;
    DateTime::from_timestamp(i64::from(seconds), 0).context(InvalidTimestampSnafu { field })
}

/// Render one `Data` CHOICE element as `(choice name, value)`.
fn decode_data(tlv: &Tlv<'_>, depth: usize) -> Result<(String, String), DecodeError> {
    ensure!(
        depth <= MAX_DATA_DEPTH,
        NestingTooDeepSnafu {
            max: MAX_DATA_DEPTH
        }
    );

    let value = tlv.value;
    let (name, rendered) = match (tlv.tag.class, tlv.tag.number) {
        (TagClass::Context, number @ (1 | 2)) => {
            let name = if number == 1 { "array" } else { "structure" };
            ensure!(tlv.tag.constructed, WrongFormSnafu { field: name });
            let mut members = Vec::new();
            let mut children = tlv.children();
            while !children.is_empty() {
                members.push(decode_data(&children.read_tlv()?, depth + 1)?.1);
            }
            (name, format!("{{{}}}", members.join(", ")))
        }
        (TagClass::Context, 3) => ("boolean", ber::boolean("boolean", value)?.to_string()),
        (TagClass::Context, 4) => ("bit-string", bit_string("bit-string", value)?),
        (TagClass::Context, 5) => ("integer", ber::integer("integer", value)?.to_string()),
        (TagClass::Context, 6) => ("unsigned", ber::integer("unsigned", value)?.to_string()),
        (TagClass::Context, 7) => ("floating-point", floating_point(value)),
        (TagClass::Context, 8) => ("real", HEXLOWER.encode(value)),
        (TagClass::Context, 9) => ("octet-string", HEXLOWER.encode(value)),
        (TagClass::Context, 10) => ("visible-string", visible_string("visible-string", value)?),
        (TagClass::Context, 11) => (
            "generalized-time",
            visible_string("generalized-time", value)?,
        ),
        (TagClass::Context, 12) => ("binary-time", HEXLOWER.encode(value)),
        (TagClass::Context, 13) => ("bcd", ber::integer("bcd", value)?.to_string()),
        (TagClass::Context, 14) => ("booleanArray", bit_string("booleanArray", value)?),
        (TagClass::Context, 15) => ("objId", HEXLOWER.encode(value)),
        (TagClass::Context, 16) => (
            "mMSString",
            String::from_utf8(value.to_vec())
                .ok()
                .context(InvalidStringSnafu { field: "mMSString" })?,
        ),
        (TagClass::Context, 17) => (
            "utc-time",
            format_timestamp(&utc_time("utc-time", value)?),
        ),
        (_, number) => {
            return Ok((format!("tag-{number}"), HEXLOWER.encode(value)));
        }
    };
    Ok((name.to_owned(), rendered))
}

/// BIT STRING contents rendered as `0`/`1` characters. The first octet holds
/// the count of unused trailing bits.
fn bit_string(field: &'static str, value: &[u8]) -> Result<String, DecodeError> {
    let Some((&unused, bits)) = value.split_first() else {
        return InvalidLengthSnafu {
            field,
            length: 0usize,
        }
        .fail();
    };
    ensure!(
        unused < 8 && (!bits.is_empty() || unused == 0),
        InvalidLengthSnafu {
            field,
            length: value.len()
        }
    );

    let mut rendered: String = bits.iter().map(|octet| format!("{octet:08b}")).collect();
    rendered.truncate(rendered.len() - usize::from(unused));
    Ok(rendered)
}

/// MMS FloatingPoint: one exponent-width octet followed by an IEEE 754
/// single (width 8) or double (width 11). Other layouts render as hex.
fn floating_point(value: &[u8]) -> String {
    match value {
        [8, rest @ ..] if rest.len() == 4 => {
            f32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]).to_string()
        }
        [11, rest @ ..] if rest.len() == 8 => {
            let mut octets = [0u8; 8];
            octets.copy_from_slice(rest);
            f64::from_be_bytes(octets).to_string()
        }
        _ => HEXLOWER.encode(value),
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::test_util::{PduBuilder, sample_pdu};

    #[test]
    fn decodes_well_formed_pdu() {
        let decoded = decode_apdu(&sample_pdu()).unwrap();

        assert_eq!(decoded.text(ApduField::GoCbRef), Some("IED1LD0/LLN0$GO$gcb01"));
        assert_eq!(
            decoded.integer(ApduField::TimeAllowedToLive),
            Some(&BigInt::from(2000))
        );
        assert_eq!(decoded.text(ApduField::DatSet), Some("IED1LD0/LLN0$DataSet1"));
        assert_eq!(decoded.text(ApduField::GoId), Some("IED1_GOOSE1"));
        assert_eq!(
            decoded
                .timestamp(ApduField::T)
                .map(|t| format_timestamp(&t)),
            Some("2020-09-13 12:26:40".to_owned())
        );
        assert_eq!(decoded.integer(ApduField::StNum), Some(&BigInt::from(7)));
        assert_eq!(decoded.integer(ApduField::SqNum), Some(&BigInt::from(300)));
        assert_eq!(decoded.boolean(ApduField::Test), Some(false));
        assert_eq!(decoded.integer(ApduField::ConfRev), Some(&BigInt::from(1)));
        assert_eq!(decoded.boolean(ApduField::NdsCom), Some(true));
        assert_eq!(
            decoded.integer(ApduField::NumDatSetEntries),
            Some(&BigInt::from(2))
        );
        assert_eq!(
            decoded.data().unwrap().to_vec(),
            vec![
                ("boolean".to_owned(), "true".to_owned()),
                ("bit-string".to_owned(), "0000000000000".to_owned()),
            ]
        );
        assert!(!decoded.contains(ApduField::Security));
        assert_eq!(decoded.len(), 12);
    }

    #[test]
    fn absent_fields_are_omitted() {
        let pdu = PduBuilder::new()
            .text(ApduField::GoCbRef, "cb")
            .integer(ApduField::StNum, &[0x01])
            .finish();
        let decoded = decode_apdu(&pdu).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(!decoded.contains(ApduField::GoId));
        assert_eq!(decoded.data(), None);
    }

    #[test]
    fn security_is_kept_as_octets() {
        let pdu = PduBuilder::new()
            .integer(ApduField::SqNum, &[0x05])
            .raw(0x8c, &[0xde, 0xad])
            .finish();
        let decoded = decode_apdu(&pdu).unwrap();
        assert_eq!(
            decoded.get(ApduField::Security),
            Some(&ApduValue::Octets(Bytes::from_static(&[0xde, 0xad])))
        );
    }

    #[test]
    fn skips_unknown_tags() {
        let pdu = PduBuilder::new()
            .bytes(&[0x9f, 0x20, 0x00])
            .integer(ApduField::StNum, &[0x03])
            .raw(0x41, &[0x01])
            .raw(0x8e, &[0x01, 0x02])
            .finish();

        let decoded = decode_apdu(&pdu).unwrap();
        assert_eq!(decoded.integer(ApduField::StNum), Some(&BigInt::from(3)));
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn ignores_trailing_padding() {
        let mut pdu = sample_pdu();
        pdu.extend_from_slice(&[0u8; 12]);
        assert!(decode_apdu(&pdu).is_ok());
    }

    #[test]
    fn rejects_wrong_outer_tag() {
        let mut pdu = sample_pdu();
        pdu[0] = 0x60;
        assert!(matches!(
            decode_apdu(&pdu),
            Err(DecodeError::UnexpectedTag { offset: 0, .. })
        ));
    }

    #[test]
    fn rejects_out_of_order_fields() {
        let pdu = PduBuilder::new()
            .integer(ApduField::SqNum, &[0x01])
            .integer(ApduField::StNum, &[0x01])
            .finish();
        assert_eq!(
            decode_apdu(&pdu),
            Err(DecodeError::OutOfOrder { field: "stNum" })
        );
    }

    #[test]
    fn rejects_duplicate_fields() {
        let pdu = PduBuilder::new()
            .integer(ApduField::StNum, &[0x01])
            .integer(ApduField::StNum, &[0x02])
            .finish();
        assert!(matches!(
            decode_apdu(&pdu),
            Err(DecodeError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn rejects_short_utc_time() {
        let pdu = PduBuilder::new().raw(0x84, &[0, 0, 0, 1]).finish();
        assert_eq!(
            decode_apdu(&pdu),
            Err(DecodeError::InvalidLength {
                field: "t",
                length: 4
            })
        );
    }

    #[test]
    fn rejects_constructed_scalar() {
        let pdu = PduBuilder::new().raw(0xa5, &[]).finish();
        assert_eq!(
            decode_apdu(&pdu),
            Err(DecodeError::WrongForm { field: "stNum" })
        );
    }

    #[test]
    fn rejects_non_ascii_visible_string() {
        let pdu = PduBuilder::new().raw(0x80, &[0xc3, 0xa9]).finish();
        assert_eq!(
            decode_apdu(&pdu),
            Err(DecodeError::InvalidString { field: "gocbRef" })
        );
    }

    #[test]
    fn keeps_vendor_value_quality_pairs_flat() {
        let data = [
            0x85, 0x01, 0x2a, // integer 42
            0x84, 0x03, 0x03, 0x00, 0x00, // quality bits
            0x87, 0x05, 0x08, 0x3f, 0xc0, 0x00, 0x00, // float 1.5
            0x84, 0x03, 0x03, 0x00, 0x00,
        ];
        let pdu = PduBuilder::new().raw(0xab, &data).finish();
        let decoded = decode_apdu(&pdu).unwrap();
        assert_eq!(
            decoded.data().unwrap().to_vec(),
            vec![
                ("integer".to_owned(), "42".to_owned()),
                ("bit-string".to_owned(), "0000000000000".to_owned()),
                ("floating-point".to_owned(), "1.5".to_owned()),
                ("bit-string".to_owned(), "0000000000000".to_owned()),
            ]
        );
    }

    #[test]
    fn renders_nested_structures() {
        let data = [
            0xa2, 0x06, // structure
            0x83, 0x01, 0x00, // boolean false
            0x86, 0x01, 0x09, // unsigned 9
            0x8a, 0x02, b'o', b'k', // visible-string
        ];
        let pdu = PduBuilder::new().raw(0xab, &data).finish();
        let decoded = decode_apdu(&pdu).unwrap();
        assert_eq!(
            decoded.data().unwrap().to_vec(),
            vec![
                ("structure".to_owned(), "{false, 9}".to_owned()),
                ("visible-string".to_owned(), "ok".to_owned()),
            ]
        );
    }

    #[test]
    fn rejects_runaway_nesting() {
        let mut data = vec![0x83, 0x01, 0x01];
        for _ in 0..=MAX_DATA_DEPTH {
            let mut wrapped = vec![0xa1, data.len() as u8];
            wrapped.extend_from_slice(&data);
            data = wrapped;
        }
        let pdu = PduBuilder::new().raw(0xab, &data).finish();
        assert_eq!(
            decode_apdu(&pdu),
            Err(DecodeError::NestingTooDeep {
                max: MAX_DATA_DEPTH
            })
        );
    }

    #[test]
    fn every_truncation_is_malformed() {
        let pdu = sample_pdu();
        for length in 0..pdu.len() {
            assert!(
                decode_apdu(&pdu[..length]).is_err(),
                "prefix of {length} bytes decoded"
            );
        }
    }

    proptest! {
        #[test]
        fn garbage_never_panics(input in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = decode_apdu(&input);
        }

        #[test]
        fn corrupted_pdu_never_panics(index in 0usize..64, octet in any::<u8>()) {
            let mut pdu = sample_pdu();
            let index = index % pdu.len();
            pdu[index] = octet;
            let _ = decode_apdu(&pdu);
        }
    }
}
