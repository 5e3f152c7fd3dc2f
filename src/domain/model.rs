use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One published daily observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub date: NaiveDate,
    #[serde(rename = "passenger_volume")]
    pub volume: u64,
    /// Year of the page the row was read from. Near January 1st this can
    /// differ from `date.year()`; that is left as published.
    #[serde(rename = "year")]
    pub source_year: i32,
}

impl VolumeRecord {
    pub fn new(date: NaiveDate, volume: u64, source_year: i32) -> Self {
        Self {
            date,
            volume,
            source_year,
        }
    }
}

/// Date-ordered records with at most one record per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    records: Vec<VolumeRecord>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from records in any order.
    ///
    /// Records sharing a date collapse to the one that came last in `records`.
    pub fn from_unsorted(mut records: Vec<VolumeRecord>) -> Self {
        // stable sort keeps input order within a date, so the last one is the latest writer
        records.sort_by_key(|r| r.date);
        let mut deduped: Vec<VolumeRecord> = Vec::with_capacity(records.len());
        for record in records {
            match deduped.last_mut() {
                Some(last) if last.date == record.date => *last = record,
                _ => deduped.push(record),
            }
        }
        Self { records: deduped }
    }

    pub fn records(&self) -> &[VolumeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&VolumeRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&VolumeRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VolumeRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<VolumeRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a VolumeRecord;
    type IntoIter = std::slice::Iter<'a, VolumeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A record annotated with its prior-year comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YoYRecord {
    pub date: NaiveDate,
    #[serde(rename = "passenger_volume")]
    pub volume: u64,
    #[serde(rename = "year")]
    pub source_year: i32,
    pub prior_date: Option<NaiveDate>,
    pub prior_volume: Option<u64>,
    pub yoy_ratio: Option<f64>,
    pub yoy_percentage: Option<f64>,
}

impl YoYRecord {
    pub fn has_yoy(&self) -> bool {
        self.yoy_percentage.is_some()
    }
}

/// Headline figures for the notification body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub latest_date: NaiveDate,
    pub latest_volume: u64,
    pub latest_yoy: Option<f64>,
    pub avg_volume_30d: f64,
    pub avg_yoy_30d: Option<f64>,
    pub ytd_avg_volume: Option<f64>,
    pub ytd_yoy: Option<f64>,
    pub total_records: usize,
}

/// Everything the transform phase hands to the export phase.
#[derive(Debug, Clone)]
pub struct Report {
    pub series: Series,
    pub yoy: Vec<YoYRecord>,
    pub summary: Option<SummaryStats>,
    pub run_date: NaiveDate,
}

impl Report {
    pub fn yoy_coverage(&self) -> usize {
        self.yoy.iter().filter(|r| r.has_yoy()).count()
    }
}
