//! Bounded exponential backoff helpers for backend retries.

use std::time::Duration;

/// Parse a Retry-After header value into a wait duration, capped at 60s.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(60)))
}

/// Calculate exponential backoff delay for a given attempt.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(60_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(0, 500), Duration::from_millis(500));
        assert_eq!(backoff_delay(1, 500), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2, 500), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay(30, 1000), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("3")), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after(Some("900")), Some(Duration::from_secs(60)));
        assert_eq!(parse_retry_after(Some("soon")), None);
        assert_eq!(parse_retry_after(None), None);
    }
}
