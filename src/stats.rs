use serde::Serialize;

/// Summary statistics over a sequence of samples. Every field is zero for an
/// empty sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StatSummary {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub total: f64,
}

impl StatSummary {
    pub fn summarize(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut mean = Mean::default();
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        let mut total = 0.0;
        for &value in values {
            mean.update(value);
            max = max.max(value);
            min = min.min(value);
            total += value;
        }

        Self {
            max,
            min,
            mean: mean.average(),
            std: variance(values).sqrt(),
            median: median(values),
            total,
        }
    }

    /// Population variance, recovered from the standard deviation.
    pub fn variance(&self) -> f64 {
        self.std * self.std
    }
}

/// Population variance. Zero for an empty sequence.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / values.len() as f64
}

/// Median, averaging the two middle values of an even-length sequence.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

/// Simple unweighted arithmetic mean
#[derive(Clone, Copy, Debug, Default)]
pub struct Mean {
    mean: f64,
    count: usize,
}

impl Mean {
    /// Fold in one sample and return the running average
    pub fn update(&mut self, point: f64) -> f64 {
        self.count += 1;
        self.mean += (point - self.mean) / self.count as f64;
        self.mean
    }

    pub const fn average(&self) -> f64 {
        self.mean
    }
}
