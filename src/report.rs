//! Per-contributor recap of submitted listings.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::actor::Role;
use crate::listing::{ListingRecord, ListingStatus};
use crate::workflow::WorkflowError;

/// Longest custom range a report accepts, in days.
pub const MAX_CUSTOM_RANGE_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "period")]
pub enum ReportPeriod {
    Today,
    /// Monday through Sunday of the current week.
    ThisWeek,
    ThisMonth,
    ThisYear,
    /// Both ends inclusive.
    Custom { start: NaiveDate, end: NaiveDate },
    All,
}

impl ReportPeriod {
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, WorkflowError> {
        if start > end {
            return Err(WorkflowError::validation(format!(
                "report start {start} is after end {end}"
            )));
        }
        if (end - start).num_days() > MAX_CUSTOM_RANGE_DAYS {
            return Err(WorkflowError::validation(format!(
                "report range may span at most {MAX_CUSTOM_RANGE_DAYS} days"
            )));
        }
        Ok(ReportPeriod::Custom { start, end })
    }

    /// Inclusive date range relative to `today`; `None` for [`ReportPeriod::All`].
    pub fn bounds(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            ReportPeriod::Today => Some((today, today)),
            ReportPeriod::ThisWeek => {
                let start =
                    today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                Some((start, start + Duration::days(6)))
            }
            ReportPeriod::ThisMonth => {
                let start = today - Duration::days(i64::from(today.day0()));
                Some((start, start + Months::new(1) - Duration::days(1)))
            }
            ReportPeriod::ThisYear => {
                let start = today - Duration::days(i64::from(today.ordinal0()));
                Some((start, start + Months::new(12) - Duration::days(1)))
            }
            ReportPeriod::Custom { start, end } => Some((start, end)),
            ReportPeriod::All => None,
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportPeriod::Today => f.write_str("today"),
            ReportPeriod::ThisWeek => f.write_str("this week"),
            ReportPeriod::ThisMonth => f.write_str("this month"),
            ReportPeriod::ThisYear => f.write_str("this year"),
            ReportPeriod::Custom { start, end } => write!(f, "{start} to {end}"),
            ReportPeriod::All => f.write_str("all time"),
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = String;

    /// Named periods only; custom ranges go through [`ReportPeriod::custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "hari" => Ok(ReportPeriod::Today),
            "week" | "minggu" => Ok(ReportPeriod::ThisWeek),
            "month" | "bulan" => Ok(ReportPeriod::ThisMonth),
            "year" | "tahun" => Ok(ReportPeriod::ThisYear),
            "all" | "semua" => Ok(ReportPeriod::All),
            other => Err(format!(
                "Unknown report period '{other}' (expected today, week, month, year or all)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub aktif: usize,
    pub pending: usize,
    pub rejected: usize,
    pub pending_deletion: usize,
}

impl StatusBreakdown {
    pub fn record(&mut self, status: ListingStatus) {
        *self.slot(status) += 1;
    }

    pub fn get(&self, status: ListingStatus) -> usize {
        match status {
            ListingStatus::Aktif => self.aktif,
            ListingStatus::Pending => self.pending,
            ListingStatus::Rejected => self.rejected,
            ListingStatus::PendingDeletion => self.pending_deletion,
        }
    }

    fn slot(&mut self, status: ListingStatus) -> &mut usize {
        match status {
            ListingStatus::Aktif => &mut self.aktif,
            ListingStatus::Pending => &mut self.pending,
            ListingStatus::Rejected => &mut self.rejected,
            ListingStatus::PendingDeletion => &mut self.pending_deletion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorStats {
    pub key: String,
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub total: usize,
    pub breakdown: StatusBreakdown,
    pub listing_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorReport {
    pub period: ReportPeriod,
    pub range: Option<(NaiveDate, NaiveDate)>,
    pub total_listings: usize,
    pub total_contributors: usize,
    pub breakdown: StatusBreakdown,
    /// Sorted by `total`, largest first.
    pub contributors: Vec<ContributorStats>,
}

impl ContributorReport {
    pub fn build(records: &[ListingRecord], period: ReportPeriod, now: DateTime<Utc>) -> Self {
        let range = period.bounds(now.date_naive());
        // only listings that name their submitter and carry a submission date count
        let in_range = |record: &ListingRecord| {
            let provenance = &record.provenance;
            match (range, provenance.submitted_at) {
                _ if provenance.submitter_name.trim().is_empty() => false,
                (_, None) => false,
                (None, Some(_)) => true,
                (Some((start, end)), Some(at)) => (start..=end).contains(&at.date_naive()),
            }
        };

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut contributors: Vec<ContributorStats> = Vec::new();
        let mut breakdown = StatusBreakdown::default();
        let mut total_listings = 0;

        for record in records.iter().filter(|r| in_range(r)) {
            let provenance = &record.provenance;
            let key = provenance.contributor_key();
            if key.is_empty() {
                continue;
            }

            let slot = *index.entry(key.to_string()).or_insert_with(|| {
                contributors.push(ContributorStats {
                    key: key.to_string(),
                    uid: provenance.submitter_id.clone(),
                    name: provenance.submitter_name.clone(),
                    email: provenance.submitter_email.clone(),
                    role: provenance.submitter_role,
                    total: 0,
                    breakdown: StatusBreakdown::default(),
                    listing_ids: Vec::new(),
                });
                contributors.len() - 1
            });

            let stats = &mut contributors[slot];
            stats.total += 1;
            stats.breakdown.record(record.status);
            stats.listing_ids.push(record.id.clone());
            breakdown.record(record.status);
            total_listings += 1;
        }

        contributors.sort_by(|a, b| b.total.cmp(&a.total));

        Self {
            period,
            range,
            total_listings,
            total_contributors: contributors.len(),
            breakdown,
            contributors,
        }
    }

    /// Rounded mean of listings per contributor.
    pub fn average_per_contributor(&self) -> usize {
        if self.total_contributors == 0 {
            return 0;
        }
        (self.total_listings as f64 / self.total_contributors as f64).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_runs_monday_to_sunday() {
        // 2025-03-05 is a Wednesday
        let (start, end) = ReportPeriod::ThisWeek.bounds(date(2025, 3, 5)).unwrap();
        assert_eq!(start, date(2025, 3, 3));
        assert_eq!(end, date(2025, 3, 9));

        let (start, _) = ReportPeriod::ThisWeek.bounds(date(2025, 3, 9)).unwrap();
        assert_eq!(start, date(2025, 3, 3));
    }

    #[test]
    fn test_month_and_year_bounds() {
        assert_eq!(
            ReportPeriod::ThisMonth.bounds(date(2024, 2, 17)),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(
            ReportPeriod::ThisYear.bounds(date(2025, 7, 1)),
            Some((date(2025, 1, 1), date(2025, 12, 31)))
        );
        assert_eq!(ReportPeriod::All.bounds(date(2025, 7, 1)), None);
    }

    #[test]
    fn test_custom_range_is_validated() {
        assert!(ReportPeriod::custom(date(2025, 3, 2), date(2025, 3, 1)).is_err());
        assert!(ReportPeriod::custom(date(2024, 1, 1), date(2025, 6, 1)).is_err());
        assert!(ReportPeriod::custom(date(2025, 1, 1), date(2025, 1, 31)).is_ok());
    }

    #[test]
    fn test_average_rounds() {
        let report = ContributorReport::build(&[], ReportPeriod::All, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(report.average_per_contributor(), 0);
        assert!(report.contributors.is_empty());
    }

    #[test]
    fn test_listings_without_submitter_or_date_are_left_out() {
        let now = Utc.with_ymd_and_hms(2025, 6, 11, 10, 0, 0).unwrap();
        let listing = |name: &str, at: Option<DateTime<Utc>>| {
            let document = serde_json::json!({
                "nama": "Tambal",
                "alamat": "Jl. Asia Afrika 1",
                "latitude": "-6.9",
                "longitude": "107.6",
                "status": "aktif",
                "uid_penambah": "u1",
                "ditambahkan_oleh": name,
                "tanggal_ditambahkan": at,
            });
            serde_json::from_value::<ListingRecord>(document).unwrap()
        };
        let records = [
            listing("Budi", Some(now)),
            listing("Budi", None),
            listing("", Some(now)),
        ];

        for period in [ReportPeriod::All, ReportPeriod::ThisMonth] {
            let report = ContributorReport::build(&records, period, now);
            assert_eq!(report.total_listings, 1, "{period}");
            assert_eq!(report.contributors[0].name, "Budi");
        }
    }

    #[test]
    fn test_period_names_parse() {
        assert_eq!("minggu".parse::<ReportPeriod>().unwrap(), ReportPeriod::ThisWeek);
        assert_eq!("Month".parse::<ReportPeriod>().unwrap(), ReportPeriod::ThisMonth);
        assert!("decade".parse::<ReportPeriod>().is_err());
    }
}
