//! Builders for hand-assembled GOOSE frames used by tests and benches.

use crate::apdu::ApduField;
use crate::ethernet::ETHERTYPE_GOOSE;
use crate::header::GOOSE_HEADER_LEN;

pub const DEFAULT_DESTINATION: [u8; 6] = [0x01, 0x0c, 0xcd, 0x01, 0x00, 0x01];
pub const DEFAULT_SOURCE: [u8; 6] = [0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e];

const ETHERTYPE_VLAN: u16 = 0x8100;
const ETHERTYPE_SERVICE_VLAN: u16 = 0x88a8;

pub fn encode_length(length: usize, out: &mut Vec<u8>) {
    if length < 0x80 {
        out.push(length as u8);
    } else {
        let octets: Vec<u8> = length
            .to_be_bytes()
            .into_iter()
            .skip_while(|octet| *octet == 0)
            .collect();
        out.push(0x80 | octets.len() as u8);
        out.extend_from_slice(&octets);
    }
}

/// Minimal two's-complement encoding of `value`.
pub fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

#[derive(Clone, Debug, Default)]
pub struct PduBuilder {
    body: Vec<u8>,
}

impl PduBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, tag: u8, value: &[u8]) -> Self {
        self.body.push(tag);
        encode_length(value.len(), &mut self.body);
        self.body.extend_from_slice(value);
        self
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn text(self, field: ApduField, value: &str) -> Self {
        self.raw(0x80 | field.tag_number() as u8, value.as_bytes())
    }

    pub fn integer(self, field: ApduField, value: &[u8]) -> Self {
        self.raw(0x80 | field.tag_number() as u8, value)
    }

    pub fn int(self, field: ApduField, value: i64) -> Self {
        self.integer(field, &encode_integer(value))
    }

    pub fn boolean(self, field: ApduField, value: bool) -> Self {
        self.raw(0x80 | field.tag_number() as u8, &[u8::from(value)])
    }

    pub fn utc_time(self, seconds: u32) -> Self {
        let mut value = seconds.to_be_bytes().to_vec();
        value.extend_from_slice(&[0x00, 0x00, 0x00, 0x0a]);
        self.raw(0x84, &value)
    }

    pub fn all_data(self, data: &[u8]) -> Self {
        self.raw(0xab, data)
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = vec![0x61];
        encode_length(self.body.len(), &mut out);
        out.extend(self.body);
        out
    }
}

/// A complete APDU with every mandatory field populated.
pub fn sample_pdu() -> Vec<u8> {
    sample_pdu_with(7, 300)
}

pub fn sample_pdu_with(st_num: i64, sq_num: i64) -> Vec<u8> {
    PduBuilder::new()
        .text(ApduField::GoCbRef, "IED1LD0/LLN0$GO$gcb01")
        .int(ApduField::TimeAllowedToLive, 2000)
        .text(ApduField::DatSet, "IED1LD0/LLN0$DataSet1")
        .text(ApduField::GoId, "IED1_GOOSE1")
        .utc_time(1_600_000_000)
        .int(ApduField::StNum, st_num)
        .int(ApduField::SqNum, sq_num)
        .boolean(ApduField::Test, false)
        .int(ApduField::ConfRev, 1)
        .boolean(ApduField::NdsCom, true)
        .int(ApduField::NumDatSetEntries, 2)
        .all_data(&[0x83, 0x01, 0x01, 0x84, 0x03, 0x03, 0x00, 0x00])
        .finish()
}

#[derive(Clone, Debug)]
pub struct FrameBuilder {
    destination: [u8; 6],
    source: [u8; 6],
    service_tag: Option<u16>,
    vlan: Option<u16>,
    appid: u16,
    reserved1: u16,
    apdu: Vec<u8>,
    padding: usize,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self {
            destination: DEFAULT_DESTINATION,
            source: DEFAULT_SOURCE,
            service_tag: None,
            vlan: None,
            appid: 0x0001,
            reserved1: 0,
            apdu: sample_pdu(),
            padding: 0,
        }
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destination(mut self, destination: [u8; 6]) -> Self {
        self.destination = destination;
        self
    }

    pub fn source(mut self, source: [u8; 6]) -> Self {
        self.source = source;
        self
    }

    /// Outer 802.1ad tag, written ahead of any 802.1Q tag.
    pub fn service_tag(mut self, tci: u16) -> Self {
        self.service_tag = Some(tci);
        self
    }

    pub fn vlan(mut self, tci: u16) -> Self {
        self.vlan = Some(tci);
        self
    }

    pub fn appid(mut self, appid: u16) -> Self {
        self.appid = appid;
        self
    }

    pub fn reserved1(mut self, reserved1: u16) -> Self {
        self.reserved1 = reserved1;
        self
    }

    pub fn apdu(mut self, apdu: &[u8]) -> Self {
        self.apdu = apdu.to_vec();
        self
    }

    pub fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.destination);
        out.extend_from_slice(&self.source);
        if let Some(tci) = self.service_tag {
            out.extend_from_slice(&ETHERTYPE_SERVICE_VLAN.to_be_bytes());
            out.extend_from_slice(&tci.to_be_bytes());
        }
        if let Some(tci) = self.vlan {
            out.extend_from_slice(&ETHERTYPE_VLAN.to_be_bytes());
            out.extend_from_slice(&tci.to_be_bytes());
        }
        out.extend_from_slice(&ETHERTYPE_GOOSE.to_be_bytes());

        let length = (GOOSE_HEADER_LEN + self.apdu.len()) as u16;
        out.extend_from_slice(&self.appid.to_be_bytes());
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&self.reserved1.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&self.apdu);
        out.resize(out.len() + self.padding, 0);
        out
    }
}

fn link_header(ether_type: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&DEFAULT_DESTINATION);
    out.extend_from_slice(&DEFAULT_SOURCE);
    out.extend_from_slice(&ether_type.to_be_bytes());
    out
}

/// An IPv4 frame with an empty payload of the given protocol.
pub fn ipv4_frame(protocol: u8) -> Vec<u8> {
    let mut out = link_header(0x0800);
    let mut ip = [0u8; 20];
    ip[0] = 0x45;
    ip[3] = 20;
    ip[8] = 64;
    ip[9] = protocol;
    out.extend_from_slice(&ip);
    out
}

/// An IPv6 frame whose hop-by-hop options header names `next_header`.
pub fn ipv6_frame_with_hop_by_hop(next_header: u8) -> Vec<u8> {
    let mut out = link_header(0x86dd);
    let mut ip = [0u8; 40];
    ip[0] = 0x60;
    ip[5] = 8;
    ip[6] = 0;
    ip[7] = 64;
    out.extend_from_slice(&ip);
    // PadN option filling the rest of the 8 byte extension header.
    out.extend_from_slice(&[next_header, 0, 0x01, 0x04, 0, 0, 0, 0]);
    out
}
