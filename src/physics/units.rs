//! Unit conversions for field-scale runs
//!
//! Ocean-current scenarios are naturally stated in SI per-second units but
//! simulated over years, so velocities and diffusivities are converted to
//! per-year before any stability number is computed. Mixing the two is the
//! easiest way to get a meaningless Courant number.

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: f64 = 60.0 * 60.0 * 24.0 * 365.0;

/// Litres in one oil barrel
pub const LITERS_PER_BARREL: f64 = 159.0;

/// Cubic metres in one litre
pub const CUBIC_METERS_PER_LITER: f64 = 1e-3;

/// m/s → m/year
#[inline]
pub fn per_second_to_per_year(value: f64) -> f64 {
    value * SECONDS_PER_YEAR
}

/// m/year → m/s
#[inline]
pub fn per_year_to_per_second(value: f64) -> f64 {
    value / SECONDS_PER_YEAR
}

/// Barrels → m³
#[inline]
pub fn barrels_to_cubic_meters(barrels: f64) -> f64 {
    barrels * LITERS_PER_BARREL * CUBIC_METERS_PER_LITER
}

/// Total volume in m³ released at `barrels_per_day` over `days`
pub fn release_volume(barrels_per_day: f64, days: f64) -> f64 {
    barrels_to_cubic_meters(barrels_per_day * days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_loop_current_velocity() {
        // 0.8 m/s is the mean Loop Current speed
        assert_relative_eq!(per_second_to_per_year(0.8), 25_228_800.0);
        assert_relative_eq!(per_year_to_per_second(25_228_800.0), 0.8);
    }

    #[test]
    fn test_release_volume() {
        // 60 000 barrels a day for 87 days
        assert_relative_eq!(release_volume(60_000.0, 87.0), 829_980.0, epsilon = 1e-6);
    }
}
