//! Glucose unit conversion between the portal's native mmol/L and the
//! downstream tool's mg/dL.

/// Conversion factor from mmol/L to mg/dL (molar mass based).
pub const MMOL_TO_MGDL: f64 = 18.0143;

/// Lower bound (exclusive) for a plausible native-unit reading.
pub const MIN_PLAUSIBLE_MMOL: f64 = 0.0;

/// Upper bound (exclusive) for a plausible native-unit reading.
/// Values at or above this are sentinel/corrupt upstream data.
pub const MAX_PLAUSIBLE_MMOL: f64 = 30.0;

/// Convert mmol/L to mg/dL, rounded to the nearest integer.
pub fn mmol_to_mgdl(value: f64) -> i32 {
    (value * MMOL_TO_MGDL).round() as i32
}

/// Convert mg/dL back to mmol/L, unrounded.
pub fn mgdl_to_mmol(value: f64) -> f64 {
    value / MMOL_TO_MGDL
}

/// Whether a native-unit reading is inside the plausible range.
pub fn is_plausible_mmol(value: f64) -> bool {
    value > MIN_PLAUSIBLE_MMOL && value < MAX_PLAUSIBLE_MMOL
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_conversions() {
        assert_eq!(mmol_to_mgdl(5.0), 90);
        assert_eq!(mmol_to_mgdl(8.2), 148);
        assert_eq!(mmol_to_mgdl(12.1), 218);
        assert_eq!(mmol_to_mgdl(3.9), 70);
    }

    #[test]
    fn plausibility_bounds_are_exclusive() {
        assert!(!is_plausible_mmol(0.0));
        assert!(!is_plausible_mmol(30.0));
        assert!(!is_plausible_mmol(-1.2));
        assert!(is_plausible_mmol(0.01));
        assert!(is_plausible_mmol(29.99));
    }

    proptest! {
        #[test]
        fn round_trip_within_rounding_tolerance(v in 0.1f64..35.0) {
            let mgdl = mmol_to_mgdl(v);
            let back = mgdl_to_mmol(mgdl as f64);
            // Rounding to whole mg/dL moves the value by at most 0.5 mg/dL.
            prop_assert!((back - v).abs() <= 0.5 / MMOL_TO_MGDL + f64::EPSILON);
        }

        #[test]
        fn conversion_is_monotonic(a in 0.1f64..30.0, b in 0.1f64..30.0) {
            if a + 0.06 < b {
                prop_assert!(mmol_to_mgdl(a) <= mmol_to_mgdl(b));
            }
        }
    }
}
