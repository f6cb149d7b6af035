use crate::config::FlowMeterConfig;

/// Active/idle period detection, in microseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityState {
    start_active: f64,
    last_active: f64,
    active: Vec<f64>,
    idle: Vec<f64>,
}

impl ActivityState {
    pub const fn new(first_timestamp: f64) -> Self {
        Self {
            start_active: first_timestamp,
            last_active: first_timestamp,
            active: Vec::new(),
            idle: Vec::new(),
        }
    }

    /// `gap` is the time since the latest packet of the flow, zero for the
    /// first one. Every packet counts as activity, so an idle period is
    /// measured from the packet right before it.
    pub fn update(&mut self, timestamp: f64, gap: f64, config: &FlowMeterConfig) {
        if gap <= config.clump_timeout || timestamp - self.last_active <= config.active_timeout {
            self.last_active = timestamp;
            return;
        }

        let duration = self.last_active - self.start_active;
        if duration > 0.0 {
            self.active.push(1e6 * duration);
        }
        self.idle.push(1e6 * (timestamp - self.last_active));
        self.start_active = timestamp;
        self.last_active = timestamp;
    }

    pub fn active(&self) -> &[f64] {
        &self.active
    }

    pub fn idle(&self) -> &[f64] {
        &self.idle
    }
}
