//! Weighted random selection over integer weights.
//!
//! Each item owns a closed interval `[min_threshold, max_threshold]` inside
//! `[1, total]`. An item added when the running total is `t` with weight `w` gets
//! `[t + 1, t + w]`, so intervals are contiguous and disjoint, and a draw rolls
//! `r` in `[1, total]` (not `[0, total - 1]`). Shifting either end of that
//! convention changes which boundary integer maps to which item.
//!
//! Thresholds are cached when an item is added. Anything that changes a stored
//! weight must be followed by [`WeightedSampler::rebuild`].

use rand::{Rng, RngCore};

use crate::error::{Result, SimError};

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedItem<T> {
    pub value: T,
    weight: u32,
    min_threshold: u64,
    max_threshold: u64,
}

impl<T> WeightedItem<T> {
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Changes the weight without touching thresholds. Call `rebuild()` afterwards.
    pub fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
    }

    pub fn min_threshold(&self) -> u64 {
        self.min_threshold
    }

    pub fn max_threshold(&self) -> u64 {
        self.max_threshold
    }

    /// Zero-weight items have `min = max + 1` and contain nothing.
    pub fn contains(&self, roll: u64) -> bool {
        self.min_threshold <= roll && roll <= self.max_threshold
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSampler<T> {
    items: Vec<WeightedItem<T>>,
    total: u64,
}

impl<T> Default for WeightedSampler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WeightedSampler<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn add(&mut self, value: T, weight: u32) {
        let min_threshold = self.total + 1;
        self.total += u64::from(weight);
        self.items.push(WeightedItem {
            value,
            weight,
            min_threshold,
            max_threshold: self.total,
        });
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.total = 0;
    }

    /// Recompute every threshold from scratch, keeping item order.
    pub fn rebuild(&mut self) {
        self.total = 0;
        for item in &mut self.items {
            item.min_threshold = self.total + 1;
            self.total += u64::from(item.weight);
            item.max_threshold = self.total;
        }
    }

    /// Assign every item a new weight and rebuild.
    pub fn reweight(&mut self, mut weight_of: impl FnMut(&T) -> u32) {
        for item in &mut self.items {
            item.weight = weight_of(&item.value);
        }
        self.rebuild();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn items(&self) -> &[WeightedItem<T>] {
        &self.items
    }

    /// Mutable access for callers that adjust weights in place. Thresholds go
    /// stale until `rebuild()` is called.
    pub fn items_mut(&mut self) -> &mut [WeightedItem<T>] {
        &mut self.items
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.items.retain(|item| keep(&item.value));
        self.rebuild();
    }

    /// Locate the item whose interval contains `roll`. `None` for rolls outside
    /// `[1, total]`.
    pub fn select(&self, roll: u64) -> Option<&T> {
        if roll == 0 || roll > self.total {
            return None;
        }
        // max thresholds are non-decreasing, so the first item reaching `roll`
        // is the only candidate.
        let idx = self.items.partition_point(|item| item.max_threshold < roll);
        self.items
            .get(idx)
            .filter(|item| item.contains(roll))
            .map(|item| &item.value)
    }

    /// Draw one item.
    ///
    /// A single item is returned without consulting the RNG, whatever its
    /// weight. With two or more items all weighted zero the draw fails with
    /// `DegenerateWeights`.
    pub fn draw(&self, rng: &mut dyn RngCore) -> Result<&T> {
        match self.items.len() {
            0 => return Err(SimError::EmptyCollection),
            1 => return Ok(&self.items[0].value),
            _ => {}
        }
        if self.total == 0 {
            return Err(SimError::DegenerateWeights {
                items: self.items.len(),
            });
        }
        let roll = rng.random_range(1..=self.total);
        self.select(roll).ok_or(SimError::SelectionMiss {
            roll,
            total: self.total,
        })
    }

    pub fn try_draw(&self, rng: &mut dyn RngCore) -> Option<&T> {
        self.draw(rng).ok()
    }
}
