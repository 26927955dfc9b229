use std::time::Duration;

/// Exponential backoff for transport-level RPC retries, capped well below
/// the job-retry backoff a higher-level scheduler might use: a bundler
/// manager is waiting synchronously on this call, so the cap stays in the
/// single-digit seconds rather than minutes.
pub fn retry_delay(attempt: u32) -> Duration {
    let shift = attempt.min(6);
    let base_ms = 50u64.checked_shl(shift).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.min(2_000))
}

#[cfg(test)]
mod tests {
    use super::retry_delay;
    use std::time::Duration;

    #[test]
    fn retry_delay_grows_monotonically_until_cap() {
        let mut prev = Duration::from_millis(0);
        for attempt in 0..=12 {
            let d = retry_delay(attempt);
            assert!(d >= prev, "regressed at attempt={attempt}");
            assert!(d <= Duration::from_secs(2));
            prev = d;
        }
    }

    #[test]
    fn retry_delay_caps_at_two_seconds() {
        for attempt in [6, 7, 20, u32::MAX] {
            assert_eq!(retry_delay(attempt), Duration::from_secs(2));
        }
    }
}
