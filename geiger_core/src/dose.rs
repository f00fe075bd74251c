//! CPM to dose rate: one fixed linear factor per tube.

/// Default SBM-20 factor, uSv/h per count-per-minute.
pub const DEFAULT_TUBE_FACTOR: f64 = geiger_config::DEFAULT_TUBE_FACTOR;

/// Dose rate in the tube factor's unit (uSv/h for the default factor).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct DoseRate(pub f64);

impl DoseRate {
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl core::fmt::Display for DoseRate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*}", p, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseConverter {
    tube_factor: f64,
}

impl Default for DoseConverter {
    fn default() -> Self {
        Self {
            tube_factor: DEFAULT_TUBE_FACTOR,
        }
    }
}

impl DoseConverter {
    /// Caller guarantees `tube_factor` is finite and > 0 (checked by the builder).
    pub fn new(tube_factor: f64) -> Self {
        Self { tube_factor }
    }

    pub fn tube_factor(&self) -> f64 {
        self.tube_factor
    }

    #[inline]
    pub fn to_dose_rate(&self, cpm: f64) -> DoseRate {
        DoseRate(cpm * self.tube_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_factor_converts_123_cpm() {
        let d = DoseConverter::default().to_dose_rate(123.0);
        assert!((d.value() - 0.998_805_555_555_51).abs() < 1e-9, "{d}");
    }

    #[test]
    fn zero_rate_is_zero_dose() {
        assert_eq!(DoseConverter::new(0.0057).to_dose_rate(0.0), DoseRate(0.0));
    }

    #[test]
    fn display_honours_precision() {
        assert_eq!(format!("{:.4}", DoseRate(0.998_805_5)), "0.9988");
    }
}
