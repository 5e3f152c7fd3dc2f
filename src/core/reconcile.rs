//! Year-over-year reconciliation.
//!
//! Each record is compared with the record 365 days earlier. A prior record is
//! looked up by month, day and the year of the page it came from, so a row
//! listed on a neighbouring year's page near January 1st does not count for
//! the calendar year it falls in. When that exact day is missing, the windowed
//! policy scans `target - radius ..= target + radius` in ascending order and
//! takes the first day present, so a match at -3 wins over a closer one at +1.

use crate::domain::model::{Series, YoYRecord};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashMap;

pub const YOY_LOOKBACK_DAYS: u64 = 365;
pub const DEFAULT_WINDOW_DAYS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Only the exact day 365 days earlier counts.
    ExactOnly,
    /// Fall back to the first day found in `-radius..=radius` around the target.
    Windowed { radius: u32 },
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy::Windowed {
            radius: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Month, day and page year of a record.
type DayKey = (u32, u32, i32);

/// Matched prior-year observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorMatch {
    pub date: NaiveDate,
    pub volume: u64,
    /// Days between the exact target and the matched date.
    pub offset: i64,
}

fn shift(date: NaiveDate, offset: i64) -> Option<NaiveDate> {
    if offset >= 0 {
        date.checked_add_days(Days::new(offset as u64))
    } else {
        date.checked_sub_days(Days::new(offset.unsigned_abs()))
    }
}

/// `volume / prior` and its percentage; both absent when `prior` is zero.
pub fn growth(volume: u64, prior: u64) -> (Option<f64>, Option<f64>) {
    if prior == 0 {
        return (None, None);
    }
    let ratio = volume as f64 / prior as f64;
    (Some(ratio), Some((ratio - 1.0) * 100.0))
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    policy: MatchPolicy,
}

impl Reconciler {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    fn index(series: &Series) -> HashMap<DayKey, (NaiveDate, u64)> {
        let mut by_day = HashMap::with_capacity(series.len());
        for record in series {
            by_day
                .entry((record.date.month(), record.date.day(), record.source_year))
                .or_insert((record.date, record.volume));
        }
        by_day
    }

    fn lookup(
        index: &HashMap<DayKey, (NaiveDate, u64)>,
        day: NaiveDate,
        offset: i64,
    ) -> Option<PriorMatch> {
        index
            .get(&(day.month(), day.day(), day.year()))
            .map(|&(date, volume)| PriorMatch {
                date,
                volume,
                offset,
            })
    }

    fn find_prior(
        &self,
        index: &HashMap<DayKey, (NaiveDate, u64)>,
        date: NaiveDate,
    ) -> Option<PriorMatch> {
        let target = date.checked_sub_days(Days::new(YOY_LOOKBACK_DAYS))?;

        if let Some(found) = Self::lookup(index, target, 0) {
            return Some(found);
        }

        let MatchPolicy::Windowed { radius } = self.policy else {
            return None;
        };
        let radius = i64::from(radius);

        (-radius..=radius)
            .find_map(|offset| Self::lookup(index, shift(target, offset)?, offset))
    }

    /// Prior-year match for `date` within `series`, if any.
    pub fn prior_for(&self, series: &Series, date: NaiveDate) -> Option<PriorMatch> {
        self.find_prior(&Self::index(series), date)
    }

    /// One output per input record, in the same order.
    pub fn reconcile(&self, series: &Series) -> Vec<YoYRecord> {
        let index = Self::index(series);

        series
            .iter()
            .map(|record| {
                let prior = self.find_prior(&index, record.date);
                let (yoy_ratio, yoy_percentage) = match prior {
                    Some(p) => growth(record.volume, p.volume),
                    None => (None, None),
                };

                YoYRecord {
                    date: record.date,
                    volume: record.volume,
                    source_year: record.source_year,
                    prior_date: prior.map(|p| p.date),
                    prior_volume: prior.map(|p| p.volume),
                    yoy_ratio,
                    yoy_percentage,
                }
            })
            .collect()
    }
}
