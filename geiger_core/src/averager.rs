//! Smoothing of the per-period CPM: simple mean over the history buffer and
//! a single-pole exponential filter. Both run every period; configuration
//! picks which one feeds telemetry and display.
use crate::error::BuildError;
use crate::history::HistoryBuffer;

/// Which average is reported downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AverageKind {
    #[default]
    Simple,
    Weighted,
}

/// Filter weight of the newest sample, strictly inside (0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight(f64);

impl Weight {
    pub fn new(w: f64) -> Result<Self, BuildError> {
        if w > 0.0 && w < 1.0 {
            Ok(Self(w))
        } else {
            Err(BuildError::InvalidConfig("filter weight must be in (0, 1)"))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Weight {
    type Error = BuildError;
    fn try_from(w: f64) -> Result<Self, Self::Error> {
        Self::new(w)
    }
}

/// `weight * current + (1 - weight) * previous`.
#[inline]
pub fn weighted_mean(current: f64, weight: Weight, previous: f64) -> f64 {
    let w = weight.get();
    w * current + (1.0 - w) * previous
}

/// Exponential filter state; lives for the process lifetime.
#[derive(Debug, Clone)]
pub struct ExpFilter {
    weight: Weight,
    last: Option<f64>,
}

impl ExpFilter {
    pub fn new(weight: Weight) -> Self {
        Self { weight, last: None }
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    /// Last filtered value, 0.0 before the first update.
    pub fn value(&self) -> f64 {
        self.last.unwrap_or(0.0)
    }

    /// Feed one raw sample. The first sample seeds the filter as-is.
    pub fn update(&mut self, raw: f64) -> f64 {
        let next = match self.last {
            Some(prev) => weighted_mean(raw, self.weight, prev),
            None => raw,
        };
        self.last = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Both averages for one period plus the configured selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub simple: f64,
    pub weighted: f64,
    pub selected: f64,
}

#[derive(Debug, Clone)]
pub struct Averager {
    kind: AverageKind,
    filter: ExpFilter,
}

impl Averager {
    pub fn new(kind: AverageKind, weight: Weight) -> Self {
        Self {
            kind,
            filter: ExpFilter::new(weight),
        }
    }

    pub fn kind(&self) -> AverageKind {
        self.kind
    }

    /// Advance the filter with `raw` and read the mean of `history`
    /// (which must already contain `raw`).
    pub fn update(&mut self, history: &HistoryBuffer, raw: f64) -> Averages {
        let weighted = self.filter.update(raw);
        self.current(history, weighted)
    }

    /// Current averages without advancing the filter.
    pub fn peek(&self, history: &HistoryBuffer) -> Averages {
        self.current(history, self.filter.value())
    }

    fn current(&self, history: &HistoryBuffer, weighted: f64) -> Averages {
        let simple = history.simple_mean();
        let selected = match self.kind {
            AverageKind::Simple => simple,
            AverageKind::Weighted => weighted,
        };
        Averages {
            simple,
            weighted,
            selected,
        }
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }
}
