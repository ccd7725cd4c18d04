use std::time::Duration;

/// Computes the wait before retry number `attempt` (1-based).
///
/// `delay = |base * (factor^attempt - 1)|`, so with a 1s base and a factor
/// of 2.0 the first three retries wait 1s, 3s and 7s. Results that do not
/// fit in `u64` nanoseconds saturate at `Duration::from_nanos(u64::MAX)`
/// instead of panicking.
pub fn backoff_delay(base: Duration, factor: f64, attempt: u32) -> Duration {
    let nanos = base.as_nanos() as f64 * (factor.powf(f64::from(attempt)) - 1.0);
    // `as` saturates for out-of-range floats and maps NaN to zero.
    Duration::from_nanos(nanos.abs() as u64)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::backoff_delay;

    #[test]
    fn doubling_factor_yields_one_three_seven_seconds() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 2.0, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2.0, 2), Duration::from_secs(3));
        assert_eq!(backoff_delay(base, 2.0, 3), Duration::from_secs(7));
    }

    #[test]
    fn fractional_factor_is_exact() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 1.5, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 1.5, 2), Duration::from_millis(1_250));
        assert_eq!(backoff_delay(base, 1.5, 3), Duration::from_micros(2_375_000));
    }

    #[test]
    fn factor_below_one_stays_non_negative() {
        let delay = backoff_delay(Duration::from_secs(1), 0.5, 1);
        assert_eq!(delay, Duration::from_millis(500));
    }

    #[test]
    fn zero_attempt_waits_nothing() {
        assert_eq!(backoff_delay(Duration::from_secs(5), 3.0, 0), Duration::ZERO);
    }

    #[test]
    fn huge_exponent_saturates() {
        let delay = backoff_delay(Duration::from_secs(1), 10.0, 400);
        assert_eq!(delay, Duration::from_nanos(u64::MAX));
    }
}
