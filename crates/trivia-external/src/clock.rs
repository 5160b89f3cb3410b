use time::{Date, OffsetDateTime};

/// Injected wall clock. Every engine reads time through this instead of
/// calling `OffsetDateTime::now_utc()` directly, so tests can pin "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Today's date in `tz` (minutes east of UTC), used for the daily-limit
    /// and `seen` KV namespaces which roll over at local midnight.
    fn today(&self, tz_offset_minutes: i16) -> Date;
}
