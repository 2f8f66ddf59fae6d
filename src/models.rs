use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Accepted date layouts for the source sheets.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid date {raw:?}, expected YYYY-MM-DD or DD/MM/YYYY"
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeeklyCaseRecord {
    #[serde(deserialize_with = "deserialize_date")]
    pub week_ending: NaiveDate,
    pub total_confirmed: i64,
    #[serde(default)]
    pub student_confirmed: Option<i64>,
    #[serde(default)]
    pub staff_confirmed: Option<i64>,
    #[serde(default)]
    pub week_confirmed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollegeRecord {
    pub college: String,
    pub positives: i64,
    pub isolating_households: i64,
    pub isolating_students: i64,
    #[serde(deserialize_with = "deserialize_date")]
    pub last_updated: NaiveDate,
    pub source_name: String,
    #[serde(default)]
    pub source_link: Option<String>,
}

impl CollegeRecord {
    /// Value shown in the "Source" column: the link when there is one.
    pub fn display_source(&self) -> &str {
        match self.source_link.as_deref().map(str::trim) {
            Some(link) if !link.is_empty() => link,
            _ => &self.source_name,
        }
    }
}

/// Row layout of `testing.csv`, before the totals are derived.
#[derive(Debug, Clone, Deserialize)]
pub struct TestingRow {
    #[serde(deserialize_with = "deserialize_date")]
    pub week_ending: NaiveDate,
    pub asym_screened: i64,
    pub sym_screened: i64,
    pub asym_positive: i64,
    pub sym_positive: i64,
    pub other_positive: i64,
    pub asym_positive_rate: f64,
    pub sym_positive_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyTestingRecord {
    pub week_ending: NaiveDate,
    pub asym_screened: i64,
    pub sym_screened: i64,
    pub asym_positive: i64,
    pub sym_positive: i64,
    pub other_positive: i64,
    pub asym_positive_rate: f64,
    pub sym_positive_rate: f64,
    pub total_screened: i64,
    pub total_positive: i64,
}

impl From<TestingRow> for WeeklyTestingRecord {
    fn from(row: TestingRow) -> Self {
        let mut record = Self {
            week_ending: row.week_ending,
            asym_screened: row.asym_screened,
            sym_screened: row.sym_screened,
            asym_positive: row.asym_positive,
            sym_positive: row.sym_positive,
            other_positive: row.other_positive,
            asym_positive_rate: row.asym_positive_rate,
            sym_positive_rate: row.sym_positive_rate,
            total_screened: 0,
            total_positive: 0,
        };
        record.total_screened = crate::metrics::total_screened(&record);
        record.total_positive = crate::metrics::total_positive(&record);
        record
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeeklyParticipationRecord {
    #[serde(deserialize_with = "deserialize_date")]
    pub week_ending: NaiveDate,
    pub consented: i64,
    pub declined: i64,
    pub undecided: i64,
    pub consented_percent: f64,
    pub declined_percent: f64,
    pub undecided_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseCount {
    Total,
    Student,
    Staff,
    Week,
}

impl CaseCount {
    pub const ALL: [Self; 4] = [Self::Total, Self::Student, Self::Staff, Self::Week];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestingCount {
    AsymScreened,
    SymScreened,
    AsymPositive,
    SymPositive,
    OtherPositive,
    TotalScreened,
    TotalPositive,
}

impl TestingCount {
    pub const ALL: [Self; 7] = [
        Self::AsymScreened,
        Self::SymScreened,
        Self::AsymPositive,
        Self::SymPositive,
        Self::OtherPositive,
        Self::TotalScreened,
        Self::TotalPositive,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestingRate {
    AsymPositive,
    SymPositive,
}

impl TestingRate {
    pub const ALL: [Self; 2] = [Self::AsymPositive, Self::SymPositive];
}

/// Consent status; selects both the count and the percentage columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consent {
    Consented,
    Declined,
    Undecided,
}

impl Consent {
    pub const ALL: [Self; 3] = [Self::Consented, Self::Declined, Self::Undecided];
}
