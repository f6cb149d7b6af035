use crate::{config::FlowMeterConfig, frame::PacketDirection};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    start: f64,
    count: u64,
    size: u64,
}

/// Forward bulk-transfer detection.
///
/// Payload-bearing forward packets closer together than `clump_timeout` form a
/// candidate burst. Once the burst reaches `bulk_bound` packets it is counted
/// as a bulk transfer, and every further packet in the burst extends it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BulkState {
    candidate: Option<Candidate>,
    last_forward: f64,
    count: u64,
    packets: u64,
    size: u64,
    duration: f64,
}

impl BulkState {
    pub fn update(
        &mut self,
        timestamp: f64,
        payload: usize,
        direction: PacketDirection,
        config: &FlowMeterConfig,
    ) {
        if payload == 0 || direction != PacketDirection::Forward {
            return;
        }
        let payload = payload as u64;
        let gap = timestamp - self.last_forward;

        match &mut self.candidate {
            Some(candidate) if gap <= config.clump_timeout => {
                candidate.count += 1;
                candidate.size += payload;

                if candidate.count == config.bulk_bound {
                    self.count += 1;
                    self.packets += candidate.count;
                    self.size += candidate.size;
                    self.duration += timestamp - candidate.start;
                } else if candidate.count > config.bulk_bound {
                    self.packets += 1;
                    self.size += payload;
                    self.duration += timestamp - self.last_forward;
                }
            }
            candidate => {
                *candidate = Some(Candidate {
                    start: timestamp,
                    count: 1,
                    size: payload,
                });
            }
        }
        self.last_forward = timestamp;
    }

    /// Committed bulk transfers.
    pub const fn count(&self) -> u64 {
        self.count
    }

    pub const fn packets(&self) -> u64 {
        self.packets
    }

    /// Payload bytes across committed bulk transfers.
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Seconds spent in committed bulk transfers.
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    pub fn bytes_per_bulk(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.size as f64 / self.count as f64
        }
    }

    pub fn packets_per_bulk(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.packets as f64 / self.count as f64
        }
    }

    /// Bytes per second while in bulk.
    pub fn rate(&self) -> f64 {
        if self.duration == 0.0 {
            0.0
        } else {
            self.size as f64 / self.duration
        }
    }
}
