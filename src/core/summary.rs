use crate::domain::model::{SummaryStats, YoYRecord};
use chrono::{Datelike, Days, NaiveDate};
use std::fmt;

pub const RECENT_WINDOW_DAYS: u64 = 30;

fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Same month/day one year earlier; Feb 29 maps to Feb 28.
fn one_year_before(date: NaiveDate) -> Option<NaiveDate> {
    date.with_year(date.year() - 1)
        .or_else(|| NaiveDate::from_ymd_opt(date.year() - 1, date.month(), 28))
}

impl SummaryStats {
    /// `None` for an empty input.
    pub fn from_records(records: &[YoYRecord]) -> Option<Self> {
        let latest = records.iter().max_by_key(|r| r.date)?;
        let latest_date = latest.date;

        let window_start = latest_date
            .checked_sub_days(Days::new(RECENT_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN);
        let recent: Vec<&YoYRecord> = records.iter().filter(|r| r.date >= window_start).collect();
        let avg_volume_30d = mean(recent.iter().map(|r| r.volume as f64)).unwrap_or(0.0);
        let avg_yoy_30d = mean(recent.iter().filter_map(|r| r.yoy_percentage));

        let current_year = latest_date.year();
        let ytd_avg_volume = mean(
            records
                .iter()
                .filter(|r| r.source_year == current_year)
                .map(|r| r.volume as f64),
        );

        let prior_cutoff = one_year_before(latest_date);
        let prior_ytd_avg = mean(
            records
                .iter()
                .filter(|r| r.source_year == current_year - 1)
                .filter(|r| prior_cutoff.is_some_and(|cutoff| r.date <= cutoff))
                .map(|r| r.volume as f64),
        );
        let ytd_yoy = match (ytd_avg_volume, prior_ytd_avg) {
            (Some(current), Some(prior)) if prior > 0.0 => Some((current / prior - 1.0) * 100.0),
            _ => None,
        };

        Some(SummaryStats {
            latest_date,
            latest_volume: latest.volume,
            latest_yoy: latest.yoy_percentage,
            avg_volume_30d,
            avg_yoy_30d,
            ytd_avg_volume,
            ytd_yoy,
            total_records: records.len(),
        })
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "N/A".to_string())
}

fn volume(value: Option<f64>) -> String {
    value
        .map(|v| group_thousands(v.round() as u64))
        .unwrap_or_else(|| "N/A".to_string())
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Latest Data")?;
        writeln!(f, "  Date: {}", self.latest_date.format("%B %d, %Y"))?;
        writeln!(
            f,
            "  Passenger Volume: {} passengers",
            group_thousands(self.latest_volume)
        )?;
        writeln!(f, "  Year-over-Year Growth: {}", percent(self.latest_yoy))?;
        writeln!(f, "30-Day Averages")?;
        writeln!(
            f,
            "  Average Volume: {} passengers",
            volume(Some(self.avg_volume_30d))
        )?;
        writeln!(f, "  Average YoY Growth: {}", percent(self.avg_yoy_30d))?;
        writeln!(f, "Year-to-Date Summary")?;
        writeln!(
            f,
            "  YTD Average Volume: {} passengers",
            volume(self.ytd_avg_volume)
        )?;
        writeln!(f, "  YTD YoY Growth: {}", percent(self.ytd_yoy))?;
        write!(f, "Total Records: {}", self.total_records)
    }
}
