use indexmap::IndexMap;

use crate::{
    config::FlowMeterConfig,
    features::FlowFeatures,
    flow::{FlowAggregate, FlowKey},
    frame::{PacketDirection, RawFrame},
    internal_events::{FlowCreated, FlowFrameSkipped, FlowsFlushed},
    packet::GoosePacket,
};

/// In-memory flow table, ordered by flow creation.
///
/// Flows are never evicted. Call [`FlowMeter::finish`] to drain them into
/// feature records.
#[derive(Debug, Default)]
pub struct FlowMeter {
    config: FlowMeterConfig,
    flows: IndexMap<FlowKey, FlowAggregate>,
}

impl FlowMeter {
    pub fn new(config: FlowMeterConfig) -> Self {
        Self {
            config,
            flows: IndexMap::new(),
        }
    }

    pub const fn config(&self) -> &FlowMeterConfig {
        &self.config
    }

    /// Add a frame, resolving its direction from the existing flows: a frame
    /// belongs to a known flow as sent, or as the reply to one. Otherwise it
    /// opens a new flow in the forward direction.
    ///
    /// Returns the direction assigned, or `None` when the frame was skipped.
    pub fn ingest(&mut self, frame: RawFrame) -> Option<PacketDirection> {
        let packet = GoosePacket::parse(frame);
        let forward = self.key(&packet, PacketDirection::Forward)?;

        if let Some(flow) = self.flows.get_mut(&forward) {
            flow.add_parsed(packet, PacketDirection::Forward);
            return Some(PacketDirection::Forward);
        }

        let reverse = self.key(&packet, PacketDirection::Reverse)?;
        if let Some(flow) = self.flows.get_mut(&reverse) {
            flow.add_parsed(packet, PacketDirection::Reverse);
            return Some(PacketDirection::Reverse);
        }

        self.create(forward, packet, PacketDirection::Forward);
        Some(PacketDirection::Forward)
    }

    /// Add a frame whose direction the caller already knows.
    pub fn ingest_with_direction(
        &mut self,
        frame: RawFrame,
        direction: PacketDirection,
    ) -> Option<PacketDirection> {
        let packet = GoosePacket::parse(frame);
        let key = self.key(&packet, direction)?;

        match self.flows.get_mut(&key) {
            Some(flow) => flow.add_parsed(packet, direction),
            None => self.create(key, packet, direction),
        }
        Some(direction)
    }

    fn key(&self, packet: &GoosePacket, direction: PacketDirection) -> Option<FlowKey> {
        match FlowKey::from_packet(packet, direction) {
            Ok(key) => Some(key),
            Err(error) => {
                emit!(FlowFrameSkipped { error: &error });
                None
            }
        }
    }

    fn create(&mut self, key: FlowKey, packet: GoosePacket, direction: PacketDirection) {
        emit!(FlowCreated { key: &key });
        let flow = FlowAggregate::with_key(key.clone(), packet, direction, self.config);
        self.flows.insert(key, flow);
    }

    pub fn get(&self, key: &FlowKey) -> Option<&FlowAggregate> {
        self.flows.get(key)
    }

    pub fn flows(&self) -> impl Iterator<Item = (&FlowKey, &FlowAggregate)> {
        self.flows.iter()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Drain every flow into its feature record, oldest flow first.
    pub fn finish(&mut self) -> Vec<FlowFeatures> {
        let packets = self.flows.values().map(FlowAggregate::len).sum();
        let features: Vec<_> = self
            .flows
            .drain(..)
            .map(|(_, flow)| flow.features())
            .collect();

        emit!(FlowsFlushed {
            count: features.len(),
            packets,
        });
        features
    }
}

#[cfg(test)]
mod tests {
    use goose_parser::test_util::{FrameBuilder, ipv4_frame, sample_pdu_with};

    use super::*;

    const A: [u8; 6] = [0x02, 0, 0, 0, 0, 0x0a];
    const B: [u8; 6] = [0x02, 0, 0, 0, 0, 0x0b];

    fn frame(source: [u8; 6], destination: [u8; 6], timestamp: f64) -> RawFrame {
        RawFrame::new(
            FrameBuilder::new()
                .source(source)
                .destination(destination)
                .build(),
            timestamp,
        )
    }

    #[test]
    fn resolves_reply_direction() {
        crate::trace::test_init();
        let mut meter = FlowMeter::default();

        assert_eq!(meter.ingest(frame(A, B, 0.0)), Some(PacketDirection::Forward));
        assert_eq!(meter.ingest(frame(A, B, 0.1)), Some(PacketDirection::Forward));
        assert_eq!(meter.ingest(frame(B, A, 0.2)), Some(PacketDirection::Reverse));
        assert_eq!(meter.len(), 1);

        let (key, flow) = meter.flows().next().unwrap();
        assert_eq!(key.source.0, A);
        assert_eq!(flow.len(), 3);
        assert_eq!(flow.packets()[2].1, PacketDirection::Reverse);
    }

    #[test]
    fn new_state_number_opens_new_flow() {
        let mut meter = FlowMeter::default();
        meter.ingest(frame(A, B, 0.0));
        meter.ingest(RawFrame::new(
            FrameBuilder::new()
                .source(A)
                .destination(B)
                .apdu(&sample_pdu_with(8, 0))
                .build(),
            0.5,
        ));
        assert_eq!(meter.len(), 2);
    }

    #[test]
    fn explicit_direction_is_trusted() {
        let mut meter = FlowMeter::default();
        meter.ingest_with_direction(frame(A, B, 0.0), PacketDirection::Forward);
        meter.ingest_with_direction(frame(B, A, 0.1), PacketDirection::Reverse);
        meter.ingest_with_direction(frame(B, A, 0.2), PacketDirection::Forward);

        assert_eq!(meter.len(), 2);
        let lengths: Vec<_> = meter.flows().map(|(_, flow)| flow.len()).collect();
        assert_eq!(lengths, vec![2, 1]);
    }

    #[test]
    fn skips_unkeyable_frames() {
        let mut meter = FlowMeter::default();
        assert_eq!(meter.ingest(RawFrame::new(vec![0u8; 4], 0.0)), None);

        assert_eq!(meter.ingest(RawFrame::new(ipv4_frame(17), 0.0)), None);
        assert!(meter.is_empty());
    }

    #[test]
    fn finish_drains_in_creation_order() {
        let mut meter = FlowMeter::default();
        meter.ingest(frame(B, A, 0.0));
        meter.ingest(frame(A, B, 0.0));
        meter.ingest(RawFrame::new(
            FrameBuilder::new().appid(9).source(A).destination(B).build(),
            0.1,
        ));

        let features = meter.finish();
        assert!(meter.is_empty());
        // The A -> B frame is the reply to the first flow.
        let appids: Vec<_> = features.iter().map(|f| f.appid).collect();
        assert_eq!(appids, vec![1, 9]);
        assert_eq!(features[0].tot_flow_pkts, 2);
        assert_eq!(features[0].src_mac, "02:00:00:00:00:0b");
    }
}
