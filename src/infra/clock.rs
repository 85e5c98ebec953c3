//! Wall-clock seam. Defer expiry and requirement age read time through
//! [`Clock`] so tests can move it.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync
{
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock
{
    fn now(&self) -> DateTime<Utc>
    {
        Utc::now()
    }
}

/// Manually driven clock; clones share the same instant
#[derive(Debug, Clone)]
pub struct FixedClock
{
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock
{
    pub fn new(now: DateTime<Utc>) -> Self
    {
        Self { now: Arc::new(RwLock::new(now)) }
    }

    pub fn set(
        &self,
        now: DateTime<Utc>,
    )
    {
        if let Ok(mut guard) = self
            .now
            .write()
        {
            *guard = now;
        }
    }

    pub fn advance(
        &self,
        by: Duration,
    )
    {
        if let Ok(mut guard) = self
            .now
            .write()
        {
            *guard += by;
        }
    }
}

impl Clock for FixedClock
{
    fn now(&self) -> DateTime<Utc>
    {
        match self
            .now
            .read()
        {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn fixed_clock_moves_only_when_told()
    {
        let start = Utc
            .with_ymd_and_hms(2020, 5, 1, 12, 0, 0)
            .unwrap();
        let clock = FixedClock::new(start);
        let shared = clock.clone();

        assert_eq!(clock.now(), start);
        shared.advance(Duration::days(3));
        assert_eq!(clock.now(), start + Duration::days(3));
        clock.set(start);
        assert_eq!(shared.now(), start);
    }
}
