//! Projection of decoded GOOSE data onto the fields consumed by flow
//! aggregation.

use chrono::{DateTime, Utc};
use goose_parser::{
    ApduField, DecodeError, DecodedApdu, EthernetFrame, GooseHeader, decode_apdu,
};
use serde::Serialize;

use crate::internal_events::{GooseApduMalformed, GooseFieldConversionError};

/// Why a frame did or did not yield APDU data.
#[derive(Clone, Debug, PartialEq)]
pub enum ApduStatus {
    Decoded,
    /// No GOOSE header or no APDU bytes to decode.
    Absent,
    Malformed(DecodeError),
}

impl ApduStatus {
    pub const fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded)
    }
}

/// Protocol fields of one frame. `Default` is the value used for anything the
/// frame did not carry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProtocolFields {
    pub appid: u16,
    pub label: u16,
    pub gocb_ref: String,
    pub time_allowed_to_live: i64,
    pub dat_set: String,
    pub go_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub st_num: i64,
    pub sq_num: i64,
    pub test: bool,
    pub conf_rev: i64,
    pub nds_com: bool,
    pub num_dat_set_entries: i64,
    pub all_data: Vec<(String, String)>,
}

impl ProtocolFields {
    /// Extract everything available from a link-layer frame. APPID and label
    /// survive an undecodable APDU since they live in the fixed header.
    pub fn extract(ethernet: &EthernetFrame<'_>) -> (Self, Option<GooseHeader>, ApduStatus) {
        if !ethernet.is_goose() {
            return (Self::default(), None, ApduStatus::Absent);
        }
        let Ok((header, apdu)) = GooseHeader::parse(ethernet.payload) else {
            return (Self::default(), None, ApduStatus::Absent);
        };
        if apdu.is_empty() {
            return (Self::project(Some(&header), None), Some(header), ApduStatus::Absent);
        }

        match decode_apdu(apdu) {
            Ok(decoded) => (
                Self::project(Some(&header), Some(&decoded)),
                Some(header),
                ApduStatus::Decoded,
            ),
            Err(error) => {
                emit!(GooseApduMalformed { error: &error });
                (
                    Self::project(Some(&header), None),
                    Some(header),
                    ApduStatus::Malformed(error),
                )
            }
        }
    }

    /// Overlay whatever is present onto the defaults.
    pub fn project(header: Option<&GooseHeader>, apdu: Option<&DecodedApdu>) -> Self {
        let mut fields = Self::default();
        if let Some(header) = header {
            fields.appid = header.appid;
            fields.label = header.label();
        }
        if let Some(apdu) = apdu {
            fields.apply(apdu);
        }
        fields
    }

    fn apply(&mut self, apdu: &DecodedApdu) {
        let text = |field| apdu.text(field).map(str::to_owned);

        if let Some(value) = text(ApduField::GoCbRef) {
            self.gocb_ref = value;
        }
        if let Some(value) = text(ApduField::DatSet) {
            self.dat_set = value;
        }
        if let Some(value) = text(ApduField::GoId) {
            self.go_id = value;
        }
        self.timestamp = apdu.timestamp(ApduField::T);

        for (field, slot) in [
            (ApduField::TimeAllowedToLive, &mut self.time_allowed_to_live),
            (ApduField::StNum, &mut self.st_num),
            (ApduField::SqNum, &mut self.sq_num),
            (ApduField::ConfRev, &mut self.conf_rev),
            (ApduField::NumDatSetEntries, &mut self.num_dat_set_entries),
        ] {
            if let Some(value) = integer(apdu, field) {
                *slot = value;
            }
        }

        if let Some(value) = apdu.boolean(ApduField::Test) {
            self.test = value;
        }
        if let Some(value) = apdu.boolean(ApduField::NdsCom) {
            self.nds_com = value;
        }
        if let Some(values) = apdu.data() {
            self.all_data = values.to_vec();
        }
    }
}

fn integer(apdu: &DecodedApdu, field: ApduField) -> Option<i64> {
    let value = apdu.integer(field)?;
    match i64::try_from(value) {
        Ok(value) => Some(value),
        Err(_) => {
            emit!(GooseFieldConversionError {
                field: field.name(),
                value: &value.to_string(),
            });
            None
        }
    }
}

/// APPID straight from the fixed GOOSE header.
pub fn application_id(ethernet: &EthernetFrame<'_>) -> Option<u16> {
    goose_header(ethernet).map(|header| header.appid)
}

/// Reserved label straight from the fixed GOOSE header.
pub fn reserved_label(ethernet: &EthernetFrame<'_>) -> Option<u16> {
    goose_header(ethernet).map(|header| header.label())
}

fn goose_header(ethernet: &EthernetFrame<'_>) -> Option<GooseHeader> {
    if !ethernet.is_goose() {
        return None;
    }
    GooseHeader::parse(ethernet.payload)
        .ok()
        .map(|(header, _)| header)
}

/// Join vendor `value, quality` entries pairwise as `"value: quality"`. An
/// odd trailing entry is dropped.
pub fn pair_values(data: &[(String, String)]) -> Vec<String> {
    data.chunks_exact(2)
        .map(|pair| format!("{}: {}", pair[0].1, pair[1].1))
        .collect()
}

#[cfg(test)]
mod tests {
    use goose_parser::test_util::{FrameBuilder, PduBuilder};

    use super::*;

    fn extract(frame: &[u8]) -> (ProtocolFields, Option<GooseHeader>, ApduStatus) {
        ProtocolFields::extract(&EthernetFrame::parse(frame).unwrap())
    }

    #[test]
    fn projects_decoded_apdu() {
        let frame = FrameBuilder::new().appid(0x3001).reserved1(2).build();
        let (fields, header, status) = extract(&frame);

        assert_eq!(status, ApduStatus::Decoded);
        assert_eq!(header.map(|header| header.appid), Some(0x3001));
        assert_eq!(fields.appid, 0x3001);
        assert_eq!(fields.label, 2);
        assert_eq!(fields.gocb_ref, "IED1LD0/LLN0$GO$gcb01");
        assert_eq!(fields.time_allowed_to_live, 2000);
        assert_eq!(fields.dat_set, "IED1LD0/LLN0$DataSet1");
        assert_eq!(fields.go_id, "IED1_GOOSE1");
        assert_eq!(
            fields.timestamp.map(|t| t.timestamp()),
            Some(1_600_000_000)
        );
        assert_eq!(fields.st_num, 7);
        assert_eq!(fields.sq_num, 300);
        assert!(!fields.test);
        assert_eq!(fields.conf_rev, 1);
        assert!(fields.nds_com);
        assert_eq!(fields.num_dat_set_entries, 2);
        assert_eq!(fields.all_data.len(), 2);
    }

    #[test]
    fn malformed_apdu_keeps_header_fields() {
        let frame = FrameBuilder::new()
            .appid(0x0102)
            .reserved1(3)
            .apdu(&[0x61, 0x7f, 0x80])
            .build();
        let (fields, _, status) = extract(&frame);

        assert!(matches!(status, ApduStatus::Malformed(DecodeError::Truncated { .. })));
        similar_asserts::assert_eq!(
            fields,
            ProtocolFields {
                appid: 0x0102,
                label: 3,
                ..ProtocolFields::default()
            }
        );
    }

    #[test]
    fn empty_apdu_is_absent() {
        let frame = FrameBuilder::new().apdu(&[]).reserved1(1).build();
        let (fields, header, status) = extract(&frame);
        assert_eq!(status, ApduStatus::Absent);
        assert!(header.is_some());
        assert_eq!(fields.label, 1);
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let apdu = PduBuilder::new()
            .text(ApduField::GoCbRef, "cb")
            .int(ApduField::SqNum, 9)
            .finish();
        let frame = FrameBuilder::new().apdu(&apdu).build();
        let (fields, _, status) = extract(&frame);

        assert!(status.is_decoded());
        assert_eq!(fields.gocb_ref, "cb");
        assert_eq!(fields.sq_num, 9);
        assert_eq!(fields.st_num, 0);
        assert_eq!(fields.go_id, "");
        assert!(fields.all_data.is_empty());
    }

    #[test]
    fn oversized_integer_keeps_default() {
        let apdu = PduBuilder::new()
            .integer(ApduField::StNum, &[0x01, 0, 0, 0, 0, 0, 0, 0, 0])
            .int(ApduField::SqNum, 4)
            .finish();
        let frame = FrameBuilder::new().apdu(&apdu).build();
        let (fields, _, status) = extract(&frame);

        assert!(status.is_decoded());
        assert_eq!(fields.st_num, 0);
        assert_eq!(fields.sq_num, 4);
    }

    #[test]
    fn header_accessors_ignore_apdu() {
        let frame = FrameBuilder::new()
            .appid(0x0042)
            .reserved1(5)
            .apdu(&[0xde, 0xad])
            .build();
        let ethernet = EthernetFrame::parse(&frame).unwrap();
        assert_eq!(application_id(&ethernet), Some(0x0042));
        assert_eq!(reserved_label(&ethernet), Some(5));
    }

    #[test]
    fn pairs_values_with_quality() {
        let data = vec![
            ("integer".to_owned(), "42".to_owned()),
            ("bit-string".to_owned(), "0000".to_owned()),
            ("boolean".to_owned(), "true".to_owned()),
            ("bit-string".to_owned(), "0100".to_owned()),
            ("integer".to_owned(), "1".to_owned()),
        ];
        assert_eq!(pair_values(&data), vec!["42: 0000", "true: 0100"]);
    }
}
