//! 時間窗口與天數換算

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 每天秒數
pub const SECONDS_PER_DAY: i64 = 86_400;

/// 半開時間窗口 `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// 起始時間（含）
    pub from: DateTime<Utc>,

    /// 結束時間（不含）
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// 創建新的時間窗口
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// 以分析日為終點的回溯窗口
    ///
    /// 終點為分析日結束（次日 00:00 UTC），起點往前推 `lookback_days` 天，
    /// 因此窗口長度剛好是 `lookback_days` 天並完整涵蓋分析日。
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use replen_core::TimeWindow;
    /// use rust_decimal::Decimal;
    ///
    /// let as_of = NaiveDate::from_ymd_opt(2025, 10, 15).unwrap();
    /// let window = TimeWindow::lookback(as_of, 30);
    /// assert_eq!(window.span_days(), Decimal::from(30));
    /// ```
    pub fn lookback(as_of: NaiveDate, lookback_days: u32) -> Self {
        let to = end_of_day(as_of);
        let from = to
            .checked_sub_signed(Duration::days(i64::from(lookback_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { from, to }
    }

    /// 窗口是否為空（from ≥ to）
    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    /// 窗口長度（天），空窗口為 0
    pub fn span_days(&self) -> Decimal {
        if self.is_empty() {
            return Decimal::ZERO;
        }
        days_between(self.from, self.to)
    }

    /// 計算 `[start, end)` 與窗口重疊的天數
    pub fn overlap_days(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
        let overlap_start = start.max(self.from);
        let overlap_end = end.min(self.to);
        if overlap_end <= overlap_start {
            return Decimal::ZERO;
        }
        days_between(overlap_start, overlap_end)
    }

    /// 檢查時間點是否在窗口內
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.from && ts < self.to
    }
}

/// 兩個時間點之間的天數（可為負）
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let seconds = (end - start).num_seconds();
    Decimal::from(seconds) / Decimal::from(SECONDS_PER_DAY)
}

/// 日期結束時間（次日 00:00 UTC）
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    match date.succ_opt() {
        Some(next) => next.and_time(NaiveTime::MIN).and_utc(),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// 將數值限制在 `[min, max]`
pub fn clamp_decimal(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    if max < min {
        return min;
    }
    value.max(min).min(max)
}
