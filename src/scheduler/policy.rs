/*!
 * Selection Policy
 * Uniform random choice of the next table slot
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Pick the next slot out of `count`
///
/// With a current slot the draw is over the `count - 1` other slots: a
/// random index in `[0, count - 1)` is shifted past `current`, giving each
/// other slot probability `1 / (count - 1)`. Before the first dispatch every
/// slot is eligible. A table holding a single slot always yields that slot.
pub fn pick_slot<R: Rng + ?Sized>(rng: &mut R, count: usize, current: Option<usize>) -> Option<usize> {
    match (count, current) {
        (0, _) => None,
        (1, _) => Some(0),
        (_, Some(current)) if current < count => {
            let index = rng.gen_range(0..count - 1);
            Some(if index >= current { index + 1 } else { index })
        }
        _ => Some(rng.gen_range(0..count)),
    }
}

/// Random slot selector owned by the scheduler
#[derive(Debug, Clone)]
pub struct Selector {
    rng: StdRng,
}

impl Selector {
    /// Selector seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible selector
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn select(&mut self, count: usize, current: Option<usize>) -> Option<usize> {
        pick_slot(&mut self.rng, count, current)
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_table_selects_nothing() {
        let mut selector = Selector::seeded(1);
        assert_eq!(selector.select(0, None), None);
    }

    #[test]
    fn test_single_slot_is_reselected() {
        let mut selector = Selector::seeded(1);
        assert_eq!(selector.select(1, None), Some(0));
        assert_eq!(selector.select(1, Some(0)), Some(0));
    }

    #[test]
    fn test_other_slots_are_uniform() {
        let mut selector = Selector::seeded(42);
        let mut hits = [0u32; 4];
        let draws = 40_000;

        for _ in 0..draws {
            let slot = selector.select(4, Some(2)).unwrap();
            hits[slot] += 1;
        }

        assert_eq!(hits[2], 0);
        for slot in [0, 1, 3] {
            let share = hits[slot] as f64 / draws as f64;
            assert!((share - 1.0 / 3.0).abs() < 0.02, "slot {} share {}", slot, share);
        }
    }

    #[test]
    fn test_same_seed_same_schedule() {
        let mut a = Selector::seeded(7);
        let mut b = Selector::seeded(7);
        let mut current = None;
        for _ in 0..100 {
            let next = a.select(5, current);
            assert_eq!(next, b.select(5, current));
            current = next;
        }
    }

    proptest! {
        #[test]
        fn prop_never_reselects_current(seed in any::<u64>(), count in 2usize..64, current in 0usize..64) {
            prop_assume!(current < count);
            let mut selector = Selector::seeded(seed);
            let slot = selector.select(count, Some(current)).unwrap();
            prop_assert!(slot < count);
            prop_assert_ne!(slot, current);
        }

        #[test]
        fn prop_first_dispatch_in_range(seed in any::<u64>(), count in 1usize..64) {
            let mut selector = Selector::seeded(seed);
            let slot = selector.select(count, None).unwrap();
            prop_assert!(slot < count);
        }
    }
}
