//! Clock port - 時刻の抽象化
//!
//! InMemory ストアが created_at / updated_at を払い出すときに使います。

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Clock は現在時刻を提供
///
/// # テスト容易性
/// - trait により時刻を差し替え可能
/// - テストでは FixedClock / SteppingClock を使用
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// 本番用
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 常に同じ時刻を返す
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}

/// 呼ばれるたびに `step` だけ進む時計
///
/// 連続した書き込みでも updated_at が必ず単調増加するので、
/// 「update 後の updated_at が以前より大きい」ことを決定的に検証できます。
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    step: Duration,
    ticks: AtomicI64,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            step,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        let offset = i32::try_from(tick)
            .ok()
            .and_then(|tick| self.step.checked_mul(tick))
            .unwrap_or(Duration::MAX);
        self.start.checked_add_signed(offset).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_never_moves() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn stepping_clock_is_strictly_increasing() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = SteppingClock::new(start, Duration::seconds(1));

        let t0 = clock.now();
        let t1 = clock.now();
        let t2 = clock.now();

        assert_eq!(t0, start);
        assert!(t0 < t1 && t1 < t2);
        assert_eq!(t2 - t0, Duration::seconds(2));
    }

    #[test]
    fn stepping_clock_saturates_instead_of_wrapping() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = SteppingClock::new(start, Duration::seconds(1));
        clock.ticks.store(i64::from(i32::MAX) + 1, Ordering::SeqCst);

        let late = clock.now();
        assert!(late > start);
        assert_eq!(late, DateTime::<Utc>::MAX_UTC);
        assert!(clock.now() >= late);
    }

    #[test]
    fn arc_dyn_clock_delegates() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(at));
        assert_eq!(clock.now(), at);
    }
}
