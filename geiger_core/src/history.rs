//! Fixed-capacity, most-recent-first history of per-period CPM values.
//!
//! The buffer always has `capacity` slots; unfilled slots read as zero.
//! `push` shifts every slot one position toward the tail (dropping the
//! oldest) and writes the new value at the head, O(capacity) per period.

/// How `simple_mean` tells an empty slot from a real reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// A zero value means "no data": zero readings are excluded from the
    /// mean. A genuine zero reading is indistinguishable from an empty slot.
    #[default]
    ZeroIsEmpty,
    /// Each slot carries a filled bit; zero readings count toward the mean.
    TrackFilled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Slot {
    value: f64,
    filled: bool,
}

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<Slot>,
    policy: EmptyPolicy,
}

impl HistoryBuffer {
    /// Caller guarantees `capacity >= 1` (checked by the builder).
    pub fn new(capacity: usize, policy: EmptyPolicy) -> Self {
        Self {
            slots: vec![Slot::default(); capacity.max(1)],
            policy,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Total length, filled or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filled() == 0
    }

    /// Number of slots holding a pushed value.
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.filled).count()
    }

    pub fn policy(&self) -> EmptyPolicy {
        self.policy
    }

    pub fn push(&mut self, value: f64) {
        self.slots.rotate_right(1);
        self.slots[0] = Slot {
            value,
            filled: true,
        };
    }

    /// Most recent value, or 0.0 before the first push.
    pub fn head(&self) -> f64 {
        self.slots[0].value
    }

    /// Slot `i` counted from the head; 0.0 for unfilled or out-of-range.
    pub fn get(&self, i: usize) -> f64 {
        self.slots.get(i).map_or(0.0, |s| s.value)
    }

    /// All slots, most recent first, unfilled slots as 0.0.
    pub fn values(&self) -> Vec<f64> {
        self.slots.iter().map(|s| s.value).collect()
    }

    /// Mean over the slots that hold data under the configured policy;
    /// 0.0 when none do.
    pub fn simple_mean(&self) -> f64 {
        let (sum, n) = self
            .slots
            .iter()
            .filter(|s| match self.policy {
                EmptyPolicy::ZeroIsEmpty => s.value != 0.0,
                EmptyPolicy::TrackFilled => s.filled,
            })
            .fold((0.0f64, 0u32), |(sum, n), s| (sum + s.value, n + 1));
        if n == 0 { 0.0 } else { sum / f64::from(n) }
    }

    pub fn clear(&mut self) {
        self.slots.fill(Slot::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_shifts_toward_tail_and_drops_oldest() {
        let mut h = HistoryBuffer::new(5, EmptyPolicy::ZeroIsEmpty);
        for v in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0] {
            h.push(v);
        }
        assert_eq!(h.values(), vec![60.0, 50.0, 40.0, 30.0, 20.0]);
        assert_eq!(h.simple_mean(), 40.0);
        assert_eq!(h.head(), 60.0);
    }

    #[test]
    fn unfilled_slots_count_in_length_not_in_mean() {
        let mut h = HistoryBuffer::new(5, EmptyPolicy::ZeroIsEmpty);
        h.push(30.0);
        h.push(10.0);
        assert_eq!(h.len(), 5);
        assert_eq!(h.filled(), 2);
        assert_eq!(h.values(), vec![10.0, 30.0, 0.0, 0.0, 0.0]);
        assert_eq!(h.simple_mean(), 20.0);
    }

    #[test]
    fn all_zero_mean_is_zero() {
        let mut h = HistoryBuffer::new(3, EmptyPolicy::ZeroIsEmpty);
        assert_eq!(h.simple_mean(), 0.0);
        h.push(0.0);
        h.push(0.0);
        assert_eq!(h.simple_mean(), 0.0);
    }

    #[test]
    fn zero_readings_are_dropped_under_zero_is_empty() {
        let mut h = HistoryBuffer::new(4, EmptyPolicy::ZeroIsEmpty);
        h.push(12.0);
        h.push(0.0);
        assert_eq!(h.simple_mean(), 12.0);
    }

    #[test]
    fn zero_readings_count_when_tracking_filled() {
        let mut h = HistoryBuffer::new(4, EmptyPolicy::TrackFilled);
        h.push(12.0);
        h.push(0.0);
        assert_eq!(h.simple_mean(), 6.0);
        assert_eq!(h.filled(), 2);
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut h = HistoryBuffer::new(2, EmptyPolicy::TrackFilled);
        h.push(1.0);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.values(), vec![0.0, 0.0]);
    }
}
