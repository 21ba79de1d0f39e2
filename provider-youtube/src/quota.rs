//! Daily quota ledger for metered provider calls.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

/// Tracks provider quota units spent against a daily ceiling.
///
/// The ledger is instance-scoped: two adapter instances do not see each
/// other's spending, and there is no cross-process coordination. True quota
/// enforcement across a fleet needs an external coordinator; this ledger
/// protects a single process from burning its own allowance.
///
/// The counter rolls over on UTC calendar-day boundaries: the first
/// reservation attempted on a new day resets it before the ceiling check.
#[derive(Debug)]
pub struct QuotaLedger {
    limit_per_day: u64,
    used: u64,
    day: NaiveDate,
}

impl QuotaLedger {
    pub fn new(limit_per_day: u64) -> Self {
        Self {
            limit_per_day,
            used: 0,
            day: Utc::now().date_naive(),
        }
    }

    /// Reserve `cost` units for an imminent call.
    ///
    /// Fail-closed: returns `false` — and the caller must not touch the
    /// network — when the reservation would push usage past the ceiling.
    pub fn try_reserve(&mut self, cost: u64) -> bool {
        self.roll_over_if_new_day();
        if self.used + cost > self.limit_per_day {
            warn!(
                used = self.used,
                cost,
                limit = self.limit_per_day,
                "quota ceiling reached, rejecting call before network"
            );
            return false;
        }
        self.used += cost;
        true
    }

    pub fn used_today(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit_per_day.saturating_sub(self.used)
    }

    fn roll_over_if_new_day(&mut self) {
        let today = Utc::now().date_naive();
        if today != self.day {
            info!(
                spent_yesterday = self.used,
                "quota day rolled over, resetting counter"
            );
            self.day = today;
            self.used = 0;
        }
    }

    #[cfg(test)]
    fn backdate(&mut self, days: i64) {
        self.day = self.day - chrono::Duration::days(days);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_exactly_when_reservation_would_exceed_limit() {
        let mut ledger = QuotaLedger::new(250);

        assert!(ledger.try_reserve(100));
        assert!(ledger.try_reserve(100));
        assert_eq!(ledger.used_today(), 200);

        // 200 + 100 > 250: rejected, nothing charged.
        assert!(!ledger.try_reserve(100));
        assert_eq!(ledger.used_today(), 200);

        // 200 + 50 == 250: exactly at the ceiling is allowed.
        assert!(ledger.try_reserve(50));
        assert_eq!(ledger.remaining(), 0);
    }

    #[test]
    fn day_rollover_resets_the_counter() {
        let mut ledger = QuotaLedger::new(100);
        assert!(ledger.try_reserve(100));
        assert!(!ledger.try_reserve(1));

        ledger.backdate(1);
        assert!(ledger.try_reserve(1));
        assert_eq!(ledger.used_today(), 1);
    }
}
