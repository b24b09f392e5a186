use std::fmt;

use tracing::{debug, trace};

use crate::aggregate::PositionAggregator;
use crate::config::EngineConfig;

/// Counters describing the window's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    /// Non-empty slots handed to the eviction handler.
    pub evicted: u64,
    /// Requests rejected because they fell below the buffer floor.
    pub dropped_below_floor: u64,
    /// Number of flush cycles triggered by advancing positions.
    pub flushes: u64,
}

impl WindowStats {
    /// Add another window's counters.
    pub fn merge(&mut self, other: &WindowStats) {
        self.evicted += other.evicted;
        self.dropped_below_floor += other.dropped_below_floor;
        self.flushes += other.flushes;
    }
}

/// Fixed-capacity circular buffer of per-position values.
///
/// Logical position `p` lives in slot `(min_index + (p - min_position)) % capacity`.
/// Requesting a position at least `capacity` past the floor evicts every
/// slot further than `read_length_buffer` behind it, in increasing position
/// order, through the caller-supplied handler. Positions below the floor are
/// never re-created.
pub struct PositionWindow<T, H>
where
    H: FnMut(T),
{
    slots: Vec<Option<T>>,
    capacity: u32,
    read_length_buffer: u32,
    /// Lowest position still bufferable; 0 until the first request.
    min_position: u32,
    /// Physical slot holding `min_position`.
    min_index: usize,
    max_position: u32,
    handler: H,
    stats: WindowStats,
}

impl<T, H> fmt::Debug for PositionWindow<T, H>
where
    H: FnMut(T),
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionWindow")
            .field("capacity", &self.capacity)
            .field("read_length_buffer", &self.read_length_buffer)
            .field("min_position", &self.min_position)
            .field("min_index", &self.min_index)
            .field("max_position", &self.max_position)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<T, H> PositionWindow<T, H>
where
    H: FnMut(T),
{
    /// Create a window; `read_length_buffer` must be smaller than `capacity`.
    pub fn new(capacity: u32, read_length_buffer: u32, handler: H) -> Self {
        assert!(
            read_length_buffer < capacity,
            "read length buffer {read_length_buffer} must be smaller than capacity {capacity}"
        );
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
            read_length_buffer,
            min_position: 0,
            min_index: 0,
            max_position: 0,
            handler,
            stats: WindowStats::default(),
        }
    }

    /// Window sized from validated engine configuration.
    pub fn from_config(config: &EngineConfig, handler: H) -> Self {
        Self::new(config.window_capacity(), config.read_length_buffer(), handler)
    }

    /// Lowest bufferable position, once established.
    pub fn min_position(&self) -> Option<u32> {
        (self.min_position > 0).then_some(self.min_position)
    }

    /// Lifetime counters.
    pub fn stats(&self) -> WindowStats {
        self.stats
    }

    /// Value at `position`, creating it with `factory` if the slot is empty.
    ///
    /// Returns `None` (and drops the request) when `position` lies below the
    /// buffer floor.
    pub fn get_or_create<F>(&mut self, position: u32, factory: F) -> Option<&mut T>
    where
        F: FnOnce() -> T,
    {
        if self.min_position == 0 {
            self.min_position = position.saturating_sub(self.read_length_buffer).max(1);
            self.min_index = 0;
        }

        if position < self.min_position {
            self.stats.dropped_below_floor += 1;
            debug!(
                position,
                min_position = self.min_position,
                "dropping observation below window floor"
            );
            return None;
        }

        if position - self.min_position >= self.capacity {
            self.flush(position);
        }
        self.max_position = self.max_position.max(position);

        let index = self.slot_index(position);
        Some(self.slots[index].get_or_insert_with(factory))
    }

    /// Value at `position`, if buffered.
    pub fn get(&self, position: u32) -> Option<&T> {
        if !self.in_window(position) {
            return None;
        }
        self.slots[self.slot_index(position)].as_ref()
    }

    /// Evict every remaining slot in position order. Later requests at or
    /// below the highest position seen are rejected.
    pub fn evict_all(&mut self) {
        if self.min_position == 0 {
            return;
        }
        self.evict(self.capacity);
        self.min_position = self.max_position + 1;
        self.min_index = 0;
    }

    fn in_window(&self, position: u32) -> bool {
        self.min_position > 0
            && position >= self.min_position
            && position - self.min_position < self.capacity
    }

    fn flush(&mut self, position: u32) {
        let new_min = position - self.read_length_buffer;
        let count = (new_min - self.min_position).min(self.capacity);
        trace!(
            position,
            from = self.min_position,
            to = new_min,
            count,
            "flushing window"
        );
        self.stats.flushes += 1;
        self.evict(count);
        // Every slot is empty when the jump exceeds the capacity, so the
        // floor can move past positions that were never buffered.
        self.min_position = new_min;
    }

    /// Evict `count` slots starting at the floor, advancing `min_index`.
    fn evict(&mut self, count: u32) {
        for _ in 0..count {
            if let Some(value) = self.slots[self.min_index].take() {
                self.stats.evicted += 1;
                (self.handler)(value);
            }
            self.min_index = (self.min_index + 1) % self.capacity as usize;
        }
    }

    fn slot_index(&self, position: u32) -> usize {
        let offset = position - self.min_position;
        assert!(
            offset < self.capacity,
            "position {position} is {offset} past floor {} in a window of {}",
            self.min_position,
            self.capacity
        );
        let index = (self.min_index + offset as usize) % self.capacity as usize;
        assert!(index < self.slots.len(), "slot index {index} out of bounds");
        index
    }
}

impl<H> PositionWindow<PositionAggregator, H>
where
    H: FnMut(PositionAggregator),
{
    fn aggregator(&mut self, position: u32) -> Option<&mut PositionAggregator> {
        self.get_or_create(position, || PositionAggregator::new(position))
    }

    /// Count one read of raw depth at `position`; `false` if the request was
    /// dropped below the floor.
    pub fn increment_depth(&mut self, position: u32) -> bool {
        match self.aggregator(position) {
            Some(aggregator) => {
                aggregator.increment_depth();
                true
            }
            None => false,
        }
    }

    /// Set the depth ceiling at `position` unless one is already registered.
    pub fn register_depth_limit(&mut self, position: u32, limit: u32) {
        if let Some(aggregator) = self.aggregator(position) {
            aggregator.register_depth_limit(limit);
        }
    }

    /// Whether `position` has reached its ceiling; `None` when nothing is
    /// buffered there or no ceiling has been registered.
    pub fn exceeds_depth_limit(&self, position: u32) -> Option<bool> {
        self.get(position)
            .and_then(PositionAggregator::exceeds_depth_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_window(
        capacity: u32,
        buffer: u32,
        evicted: &mut Vec<u32>,
    ) -> PositionWindow<u32, impl FnMut(u32) + '_> {
        PositionWindow::new(capacity, buffer, move |value| evicted.push(value))
    }

    #[test]
    fn first_request_establishes_floor_with_slack() {
        let mut evicted = Vec::new();
        let mut window = recording_window(10, 6, &mut evicted);
        assert_eq!(window.min_position(), None);
        window.get_or_create(100, || 100);
        assert_eq!(window.min_position(), Some(94));
        assert_eq!(window.get(100), Some(&100));
        assert!(window.get_or_create(93, || 93).is_none());
        assert_eq!(window.stats().dropped_below_floor, 1);
    }

    #[test]
    fn flush_evicts_in_position_order_across_wrap() {
        let mut evicted = Vec::new();
        {
            let mut window = recording_window(10, 6, &mut evicted);
            // Floor at 1 (0 - slack saturates).
            for position in 1..=9 {
                window.get_or_create(position, || position);
            }
            // 11 - 1 >= 10 triggers a flush down to floor 5.
            window.get_or_create(11, || 11);
            assert_eq!(window.min_position(), Some(5));
            // Wraps into physical slots 0..=2.
            for position in 12..=14 {
                window.get_or_create(position, || position);
            }
            assert_eq!(window.get(14), Some(&14));
            // 15 - 5 >= 10 flushes 5..=8.
            window.get_or_create(15, || 15);
            assert_eq!(window.min_position(), Some(9));
            window.evict_all();
            assert!(window.get_or_create(15, || 15).is_none());
        }
        assert_eq!(evicted, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn large_jump_empties_window() {
        let mut evicted = Vec::new();
        {
            let mut window = recording_window(10, 6, &mut evicted);
            window.get_or_create(1, || 1);
            window.get_or_create(5, || 5);
            window.get_or_create(1_000, || 1_000);
            assert_eq!(window.min_position(), Some(994));
            assert_eq!(window.get(1_000), Some(&1_000));
        }
        assert_eq!(evicted, vec![1, 5]);
    }

    #[test]
    fn depth_limits_track_per_position() {
        let mut finalized = Vec::new();
        {
            let mut window = PositionWindow::new(10, 6, |agg: PositionAggregator| {
                finalized.push(agg.position())
            });
            assert_eq!(window.exceeds_depth_limit(50), None);
            window.register_depth_limit(50, 2);
            assert_eq!(window.exceeds_depth_limit(50), Some(false));
            assert!(window.increment_depth(50));
            assert!(window.increment_depth(50));
            assert_eq!(window.exceeds_depth_limit(50), Some(true));
            assert!(window.increment_depth(51));
            assert_eq!(window.exceeds_depth_limit(51), None);
            window.evict_all();
        }
        assert_eq!(finalized, vec![50, 51]);
    }
}
