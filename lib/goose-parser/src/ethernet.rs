use std::fmt;

use etherparse::{EtherType, Ethernet2Slice, IpNumber, IpSlice, SingleVlanSlice};

use crate::error::{FrameError, TooShortSnafu};

pub const ETHERTYPE_GOOSE: u16 = 0x88b8;
pub const ETHERTYPE_GSE_MANAGEMENT: u16 = 0x88b9;

const ETHERNET_HEADER_LEN: usize = 14;
const VLAN_TAG_LEN: usize = 4;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(pub [u8; 6]);

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// IEEE 802.1Q tag control information.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VlanTag {
    pub priority: u8,
    pub drop_eligible: bool,
    pub id: u16,
}

impl From<&SingleVlanSlice<'_>> for VlanTag {
    fn from(slice: &SingleVlanSlice<'_>) -> Self {
        let header = slice.to_header();
        Self {
            priority: header.pcp.value(),
            drop_eligible: header.drop_eligible_indicator,
            id: header.vlan_id.value(),
        }
    }
}

/// Transport protocol carried inside an IP packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpTransport {
    Tcp,
    Udp,
    Other(u8),
}

impl From<IpNumber> for IpTransport {
    fn from(number: IpNumber) -> Self {
        match number {
            IpNumber::TCP => Self::Tcp,
            IpNumber::UDP => Self::Udp,
            other => Self::Other(other.0),
        }
    }
}

impl IpTransport {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Other(_) => "other",
        }
    }
}

const fn is_vlan(ether_type: EtherType) -> bool {
    matches!(
        ether_type,
        EtherType::VLAN_TAGGED_FRAME
            | EtherType::PROVIDER_BRIDGING
            | EtherType::VLAN_DOUBLE_TAGGED_FRAME
    )
}

/// Ethernet II header, with any stack of 802.1Q/802.1ad tags peeled off,
/// borrowing the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EthernetFrame<'a> {
    pub destination: MacAddress,
    pub source: MacAddress,
    /// Innermost tag, if the frame is tagged.
    pub vlan: Option<VlanTag>,
    pub vlan_depth: usize,
    pub ether_type: u16,
    pub payload: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    pub fn parse(input: &'a [u8]) -> Result<Self, FrameError> {
        let link = Ethernet2Slice::from_slice_without_fcs(input).map_err(|_| {
            TooShortSnafu {
                layer: "ethernet",
                length: input.len(),
                needed: ETHERNET_HEADER_LEN,
            }
            .build()
        })?;

        let mut ether_type = link.ether_type();
        let mut payload = link.payload_slice();
        let mut vlan = None;
        let mut vlan_depth = 0;
        while is_vlan(ether_type) {
            let tag = SingleVlanSlice::from_slice(payload).map_err(|_| {
                TooShortSnafu {
                    layer: "802.1q",
                    length: input.len(),
                    needed: ETHERNET_HEADER_LEN + (vlan_depth + 1) * VLAN_TAG_LEN,
                }
                .build()
            })?;
            vlan = Some(VlanTag::from(&tag));
            vlan_depth += 1;
            ether_type = tag.ether_type();
            payload = tag.payload_slice();
        }

        Ok(Self {
            destination: MacAddress(link.destination()),
            source: MacAddress(link.source()),
            vlan,
            vlan_depth,
            ether_type: ether_type.0,
            payload,
        })
    }

    /// Length of the link-layer header, including every VLAN tag.
    pub const fn header_len(&self) -> usize {
        ETHERNET_HEADER_LEN + self.vlan_depth * VLAN_TAG_LEN
    }

    pub const fn is_goose(&self) -> bool {
        self.ether_type == ETHERTYPE_GOOSE
    }

    /// Transport protocol of an IPv4/IPv6 payload, after any IPv6 extension
    /// headers. `None` for other EtherTypes or an unreadable IP header.
    pub fn transport(&self) -> Option<IpTransport> {
        match EtherType(self.ether_type) {
            EtherType::IPV4 | EtherType::IPV6 => IpSlice::from_slice(self.payload)
                .ok()
                .map(|ip| IpTransport::from(ip.payload().ip_number)),
            _ => None,
        }
    }
}
