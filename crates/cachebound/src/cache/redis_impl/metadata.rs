//! Encoding of expiration options into Redis hash fields.
//!
//! Both windows are stored as integer milliseconds; `-1` means "not set".

use std::time::Duration;

use chrono::{DateTime, Utc};

use cachebound_core::cache::CacheEntryOptions;

pub const DATA_FIELD: &str = "data";
pub const ABSOLUTE_FIELD: &str = "absexp";
pub const SLIDING_FIELD: &str = "sldexp";

const NOT_SET: i64 = -1;

/// Encodes options as `(absolute unix ms, sliding ms)`.
pub fn encode(options: &CacheEntryOptions) -> (i64, i64) {
    let absolute = options
        .absolute_expiration
        .map_or(NOT_SET, |at| at.timestamp_millis());
    let sliding = options
        .sliding_expiration
        .map_or(NOT_SET, |idle| i64::try_from(idle.as_millis()).unwrap_or(i64::MAX));
    (absolute, sliding)
}

/// Decodes options stored by [`encode`].
pub fn decode(absolute: i64, sliding: i64) -> CacheEntryOptions {
    CacheEntryOptions {
        absolute_expiration: (absolute != NOT_SET)
            .then(|| DateTime::<Utc>::from_timestamp_millis(absolute))
            .flatten(),
        sliding_expiration: u64::try_from(sliding).ok().map(Duration::from_millis),
    }
}

/// Key expiry to apply at `now`, in milliseconds.
///
/// `None` means the key should persist; `Some(0)` means it already expired.
pub fn expire_millis(options: &CacheEntryOptions, now: DateTime<Utc>) -> Option<i64> {
    options
        .ttl(now)
        .map(|ttl| i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_encode_decode_both_windows() {
        let options = CacheEntryOptions::new()
            .with_absolute_expiration(fixed_now() + TimeDelta::minutes(60))
            .with_sliding_expiration(Duration::from_secs(300));

        let (absolute, sliding) = encode(&options);

        assert_eq!(sliding, 300_000);
        assert_eq!(decode(absolute, sliding), options);
    }

    #[test]
    fn test_encode_decode_unset_windows() {
        let (absolute, sliding) = encode(&CacheEntryOptions::new());

        assert_eq!((absolute, sliding), (-1, -1));
        assert_eq!(decode(absolute, sliding), CacheEntryOptions::new());
    }

    #[test]
    fn test_expire_millis_uses_earliest_window() {
        let options = CacheEntryOptions::new()
            .with_absolute_expiration(fixed_now() + TimeDelta::seconds(10))
            .with_sliding_expiration(Duration::from_secs(60));

        assert_eq!(expire_millis(&options, fixed_now()), Some(10_000));
    }

    #[test]
    fn test_expire_millis_past_deadline_is_zero() {
        let options =
            CacheEntryOptions::new().with_absolute_expiration(fixed_now() - TimeDelta::seconds(1));

        assert_eq!(expire_millis(&options, fixed_now()), Some(0));
    }
}
