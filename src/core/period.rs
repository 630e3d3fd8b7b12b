use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{AppError, Result};

/// A weekly payout accounting window: Wednesday 00:00:00.000 UTC through the
/// following Tuesday 23:59:59.999 UTC, both bounds inclusive.
///
/// Orders are attributed to a window by their business `order_date`; the
/// window itself is always computed in UTC regardless of storefront locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PayoutPeriod {
    /// Resolve the most recently completed weekly window relative to `now`.
    ///
    /// The returned window always ends strictly before `now`: when `now` is a
    /// Wednesday the window ended yesterday; when `now` is a Tuesday the
    /// in-progress week does not count and the window ended a full week ago.
    pub fn previous(now: DateTime<Utc>) -> Self {
        let days_back_to_tuesday = match now.weekday() {
            Weekday::Wed => 1,
            Weekday::Thu => 2,
            Weekday::Fri => 3,
            Weekday::Sat => 4,
            Weekday::Sun => 5,
            Weekday::Mon => 6,
            Weekday::Tue => 7,
        };

        let end_date = now.date_naive() - Duration::days(days_back_to_tuesday);
        let start_date = end_date - Duration::days(6);

        let start = Utc.from_utc_datetime(
            &start_date
                .and_hms_milli_opt(0, 0, 0, 0)
                .expect("valid time components"),
        );
        let end = Utc.from_utc_datetime(
            &end_date
                .and_hms_milli_opt(23, 59, 59, 999)
                .expect("valid time components"),
        );

        Self { start, end }
    }

    /// Operator-supplied bounds for backfills and corrections.
    ///
    /// The raw `[start, end]` is used as-is, only validated `start < end` —
    /// no snapping to week boundaries.
    pub fn manual(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(AppError::validation(format!(
                "period start ({}) must be before period end ({})",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Whether a business timestamp falls inside this window (inclusive).
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Millisecond epoch of the window start.
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// Millisecond epoch of the window end.
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

impl fmt::Display for PayoutPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.end.format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}
