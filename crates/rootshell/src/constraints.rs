//! Size constraints for toplevel windows
//!
//! Clamps a size requested by the compositor into the min/max bounds the
//! client declared with `set_min_size` / `set_max_size`.

/// Declared size bounds of a toplevel. A maximum of 0 means unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeBounds {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl SizeBounds {
    /// Clamp a requested size into these bounds
    pub fn constrain(&self, width: u32, height: u32) -> (u32, u32) {
        constrain(
            width,
            height,
            self.min_width,
            self.min_height,
            self.max_width,
            self.max_height,
        )
    }
}

/// Clamp one dimension. The minimum wins over the maximum when a client
/// declares min > max.
fn clamp_dimension(requested: u32, min: u32, max: u32) -> u32 {
    if requested < min {
        min
    } else if max > 0 && requested > max {
        max
    } else {
        requested
    }
}

/// Clamp a requested size into min/max bounds.
///
/// Returns `(width, height)`.
pub fn constrain(
    requested_width: u32,
    requested_height: u32,
    min_width: u32,
    min_height: u32,
    max_width: u32,
    max_height: u32,
) -> (u32, u32) {
    (
        clamp_dimension(requested_width, min_width, max_width),
        clamp_dimension(requested_height, min_height, max_height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn below_minimum_clamps_up() {
        assert_eq!(constrain(50, 80, 100, 0, 0, 0), (100, 80));
    }

    #[test]
    fn above_maximum_clamps_down() {
        assert_eq!(constrain(900, 700, 0, 0, 800, 600), (800, 600));
    }

    #[test]
    fn zero_maximum_is_unconstrained() {
        assert_eq!(constrain(5000, 4000, 10, 10, 0, 0), (5000, 4000));
    }

    #[test]
    fn minimum_wins_over_smaller_maximum() {
        // min > max is a client bug, but the first matching rule applies
        assert_eq!(constrain(10, 10, 300, 300, 200, 200), (300, 300));
        assert_eq!(constrain(400, 400, 300, 300, 200, 200), (200, 200));
    }

    #[test]
    fn bounds_method_matches_free_function() {
        let bounds = SizeBounds {
            min_width: 100,
            min_height: 50,
            max_width: 800,
            max_height: 0,
        };
        assert_eq!(bounds.constrain(20, 20), (100, 50));
        assert_eq!(bounds.constrain(1000, 1000), (800, 1000));
    }

    proptest! {
        #[test]
        fn result_within_bounds(
            requested in 0u32..10_000,
            min in 0u32..2_000,
            extra in 0u32..2_000,
            unconstrained in any::<bool>(),
        ) {
            let max = if unconstrained { 0 } else { min + extra };
            let (width, _) = constrain(requested, 0, min, 0, max, 0);
            prop_assert!(width >= min);
            if max > 0 {
                prop_assert!(width <= max);
            }
        }

        #[test]
        fn in_range_input_is_unchanged(
            min in 0u32..2_000,
            span in 0u32..2_000,
            offset in 0u32..2_000,
        ) {
            let max = min + span;
            let requested = min + offset.min(span);
            prop_assert_eq!(constrain(requested, requested, min, min, max, max), (requested, requested));
        }

        #[test]
        fn constrain_is_idempotent(
            requested in 0u32..10_000,
            min in 0u32..2_000,
            extra in 0u32..2_000,
            unconstrained in any::<bool>(),
        ) {
            let max = if unconstrained { 0 } else { min + extra };
            let once = constrain(requested, requested, min, min, max, max);
            let twice = constrain(once.0, once.1, min, min, max, max);
            prop_assert_eq!(once, twice);
        }
    }
}
