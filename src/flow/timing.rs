/// Flow-level timing and sequence-number history.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimingState {
    start: Option<f64>,
    latest: Option<f64>,
    interarrival: Vec<f64>,
    sq_nums: Vec<i64>,
}

impl TimingState {
    /// Seconds since the latest packet. Zero before the first packet.
    pub fn gap(&self, timestamp: f64) -> f64 {
        timestamp - self.latest.unwrap_or(timestamp)
    }

    pub fn observe(&mut self, timestamp: f64, sq_num: i64) {
        if let Some(latest) = self.latest {
            self.interarrival.push(1e6 * (timestamp - latest));
        }
        self.latest = Some(self.latest.map_or(timestamp, |latest| latest.max(timestamp)));
        self.start.get_or_insert(timestamp);
        self.sq_nums.push(sq_num);
    }

    pub const fn start(&self) -> Option<f64> {
        self.start
    }

    pub const fn latest(&self) -> Option<f64> {
        self.latest
    }

    /// Seconds between the first and the latest packet.
    pub fn duration(&self) -> f64 {
        match (self.start, self.latest) {
            (Some(start), Some(latest)) => latest - start,
            _ => 0.0,
        }
    }

    /// Inter-arrival times in microseconds.
    pub fn interarrival(&self) -> &[f64] {
        &self.interarrival
    }

    pub fn sq_nums(&self) -> &[i64] {
        &self.sq_nums
    }

    /// Spread of observed sequence numbers relative to the number of
    /// packets. 1 when fewer than two were seen.
    pub fn sq_num_norm(&self) -> f64 {
        let (Some(max), Some(min)) = (self.sq_nums.iter().max(), self.sq_nums.iter().min()) else {
            return 1.0;
        };
        if self.sq_nums.len() == 1 {
            return 1.0;
        }
        (*max as f64 - *min as f64 + 1.0) / self.sq_nums.len() as f64
    }
}
