use super::{ActivityState, BulkState, FlowKey, KeyError, TimingState};
use crate::{
    config::FlowMeterConfig,
    features::FlowFeatures,
    fields::ProtocolFields,
    frame::{PacketDirection, RawFrame},
    packet::GoosePacket,
};

/// Running state of a single flow.
///
/// Packets must be added in non-decreasing timestamp order. Nothing here
/// expires a flow; the owner decides when to read its features.
#[derive(Clone, Debug)]
pub struct FlowAggregate {
    key: FlowKey,
    config: FlowMeterConfig,
    metadata: Option<ProtocolFields>,
    label: Option<u16>,
    packets: Vec<(GoosePacket, PacketDirection)>,
    timing: TimingState,
    bulk: BulkState,
    activity: ActivityState,
}

impl FlowAggregate {
    /// Start a flow with `packet` as its first packet.
    pub fn new(
        packet: GoosePacket,
        direction: PacketDirection,
        config: FlowMeterConfig,
    ) -> Result<Self, KeyError> {
        let key = FlowKey::from_packet(&packet, direction)?;
        Ok(Self::with_key(key, packet, direction, config))
    }

    pub(crate) fn with_key(
        key: FlowKey,
        packet: GoosePacket,
        direction: PacketDirection,
        config: FlowMeterConfig,
    ) -> Self {
        let mut aggregate = Self {
            key,
            config,
            metadata: None,
            label: None,
            packets: Vec::new(),
            timing: TimingState::default(),
            bulk: BulkState::default(),
            activity: ActivityState::new(packet.timestamp()),
        };
        aggregate.add_parsed(packet, direction);
        aggregate
    }

    pub fn add_packet(&mut self, frame: RawFrame, direction: PacketDirection) {
        self.add_parsed(GoosePacket::parse(frame), direction);
    }

    pub fn add_parsed(&mut self, packet: GoosePacket, direction: PacketDirection) {
        let timestamp = packet.timestamp();
        self.capture_identity(&packet);

        self.bulk
            .update(timestamp, packet.payload_size(), direction, &self.config);
        self.activity
            .update(timestamp, self.timing.gap(timestamp), &self.config);
        self.timing.observe(timestamp, packet.fields().sq_num);

        self.packets.push((packet, direction));
    }

    // Label comes from the first parsed header, metadata from the first
    // decoded APDU. Later frames never overwrite either.
    fn capture_identity(&mut self, packet: &GoosePacket) {
        if self.label.is_none() {
            self.label = packet.header().map(|header| header.label());
        }
        if self.metadata.is_none() && packet.status().is_decoded() {
            self.metadata = Some(packet.fields().clone());
        }
    }

    pub const fn key(&self) -> &FlowKey {
        &self.key
    }

    pub const fn config(&self) -> &FlowMeterConfig {
        &self.config
    }

    pub fn packets(&self) -> &[(GoosePacket, PacketDirection)] {
        &self.packets
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Protocol fields of the first frame whose APDU decoded.
    pub fn metadata(&self) -> Option<&ProtocolFields> {
        self.metadata.as_ref()
    }

    /// Reserved label of the first frame with a GOOSE header, 0 otherwise.
    pub fn label(&self) -> u16 {
        self.label.unwrap_or_default()
    }

    pub const fn timing(&self) -> &TimingState {
        &self.timing
    }

    pub const fn bulk(&self) -> &BulkState {
        &self.bulk
    }

    pub const fn activity(&self) -> &ActivityState {
        &self.activity
    }

    pub fn features(&self) -> FlowFeatures {
        FlowFeatures::from_aggregate(self)
    }
}
