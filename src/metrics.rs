use std::borrow::Cow;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{
    CaseCount, Consent, TestingCount, TestingRate, WeeklyCaseRecord,
    WeeklyParticipationRecord, WeeklyTestingRecord,
};

/// A record in a week-ordered series.
pub trait Weekly: Clone {
    fn week_ending(&self) -> NaiveDate;

    /// Zero-valued stand-in for the week before `self`.
    fn zeroed(&self) -> Self;
}

/// Integer columns addressable by a field selector.
pub trait Counts {
    type Field: Copy;

    fn count(&self, field: Self::Field) -> Option<i64>;
}

/// Percentage columns addressable by a field selector.
pub trait Rates {
    type Field: Copy;

    fn rate(&self, field: Self::Field) -> f64;
}

pub fn total_screened(record: &WeeklyTestingRecord) -> i64 {
    record.asym_screened + record.sym_screened
}

pub fn total_positive(record: &WeeklyTestingRecord) -> i64 {
    record.asym_positive + record.sym_positive + record.other_positive
}

pub fn total_eligible(latest: &WeeklyParticipationRecord) -> i64 {
    latest.consented + latest.declined + latest.undecided
}

/// Week-over-week change of a count. `None` when either week lacks the column.
pub fn delta<R: Counts>(latest: &R, previous: &R, field: R::Field) -> Option<i64> {
    Some(latest.count(field)? - previous.count(field)?)
}

/// Week-over-week change of a percentage, rounded to one decimal place.
pub fn percent_delta<R: Rates>(latest: &R, previous: &R, field: R::Field) -> f64 {
    round_to_tenth(latest.rate(field) - previous.rate(field))
}

pub fn round_to_tenth(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // avoid rendering "-0.0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[derive(Debug, Clone)]
pub struct WeekPair<'a, R: Weekly> {
    pub latest: &'a R,
    pub previous: Cow<'a, R>,
}

/// Last and second-to-last weeks of a series. A single-week series gets a
/// zero-valued previous week so deltas equal the latest values.
pub fn latest_pair<R: Weekly>(series: &[R]) -> Option<WeekPair<'_, R>> {
    match series {
        [] => None,
        [latest] => {
            debug!(
                week_ending = %latest.week_ending(),
                "only one week of history, using a zero baseline"
            );
            Some(WeekPair {
                latest,
                previous: Cow::Owned(latest.zeroed()),
            })
        }
        [.., previous, latest] => Some(WeekPair {
            latest,
            previous: Cow::Borrowed(previous),
        }),
    }
}

impl Weekly for WeeklyCaseRecord {
    fn week_ending(&self) -> NaiveDate {
        self.week_ending
    }

    fn zeroed(&self) -> Self {
        Self {
            week_ending: self.week_ending,
            total_confirmed: 0,
            student_confirmed: Some(0),
            staff_confirmed: Some(0),
            week_confirmed: Some(0),
        }
    }
}

impl Counts for WeeklyCaseRecord {
    type Field = CaseCount;

    fn count(&self, field: CaseCount) -> Option<i64> {
        match field {
            CaseCount::Total => Some(self.total_confirmed),
            CaseCount::Student => self.student_confirmed,
            CaseCount::Staff => self.staff_confirmed,
            CaseCount::Week => self.week_confirmed,
        }
    }
}

impl Weekly for WeeklyTestingRecord {
    fn week_ending(&self) -> NaiveDate {
        self.week_ending
    }

    fn zeroed(&self) -> Self {
        Self {
            week_ending: self.week_ending,
            asym_screened: 0,
            sym_screened: 0,
            asym_positive: 0,
            sym_positive: 0,
            other_positive: 0,
            asym_positive_rate: 0.0,
            sym_positive_rate: 0.0,
            total_screened: 0,
            total_positive: 0,
        }
    }
}

impl Counts for WeeklyTestingRecord {
    type Field = TestingCount;

    fn count(&self, field: TestingCount) -> Option<i64> {
        Some(match field {
            TestingCount::AsymScreened => self.asym_screened,
            TestingCount::SymScreened => self.sym_screened,
            TestingCount::AsymPositive => self.asym_positive,
            TestingCount::SymPositive => self.sym_positive,
            TestingCount::OtherPositive => self.other_positive,
            TestingCount::TotalScreened => self.total_screened,
            TestingCount::TotalPositive => self.total_positive,
        })
    }
}

impl Rates for WeeklyTestingRecord {
    type Field = TestingRate;

    fn rate(&self, field: TestingRate) -> f64 {
        match field {
            TestingRate::AsymPositive => self.asym_positive_rate,
            TestingRate::SymPositive => self.sym_positive_rate,
        }
    }
}

impl Weekly for WeeklyParticipationRecord {
    fn week_ending(&self) -> NaiveDate {
        self.week_ending
    }

    fn zeroed(&self) -> Self {
        Self {
            week_ending: self.week_ending,
            consented: 0,
            declined: 0,
            undecided: 0,
            consented_percent: 0.0,
            declined_percent: 0.0,
            undecided_percent: 0.0,
        }
    }
}

impl Counts for WeeklyParticipationRecord {
    type Field = Consent;

    fn count(&self, field: Consent) -> Option<i64> {
        Some(match field {
            Consent::Consented => self.consented,
            Consent::Declined => self.declined,
            Consent::Undecided => self.undecided,
        })
    }
}

impl Rates for WeeklyParticipationRecord {
    type Field = Consent;

    fn rate(&self, field: Consent) -> f64 {
        match field {
            Consent::Consented => self.consented_percent,
            Consent::Declined => self.declined_percent,
            Consent::Undecided => self.undecided_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestingRow;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 10, day).unwrap()
    }

    fn cases(day: u32, total: i64) -> WeeklyCaseRecord {
        WeeklyCaseRecord {
            week_ending: date(day),
            total_confirmed: total,
            student_confirmed: Some(total - 10),
            staff_confirmed: Some(10),
            week_confirmed: Some(total / 4),
        }
    }

    fn testing(day: u32, asym_rate: f64) -> WeeklyTestingRecord {
        WeeklyTestingRecord::from(TestingRow {
            week_ending: date(day),
            asym_screened: 5000,
            sym_screened: 180,
            asym_positive: 12,
            sym_positive: 8,
            other_positive: 3,
            asym_positive_rate: asym_rate,
            sym_positive_rate: 4.4,
        })
    }

    fn participation(day: u32) -> WeeklyParticipationRecord {
        WeeklyParticipationRecord {
            week_ending: date(day),
            consented: 9000,
            declined: 600,
            undecided: 2400,
            consented_percent: 75.0,
            declined_percent: 5.0,
            undecided_percent: 20.0,
        }
    }

    #[test]
    fn testing_totals_sum_components() {
        let record = testing(11, 0.2);
        assert_eq!(record.total_screened, record.asym_screened + record.sym_screened);
        assert_eq!(
            record.total_positive,
            record.asym_positive + record.sym_positive + record.other_positive
        );
    }

    #[test]
    fn delta_against_self_is_zero() {
        let case = cases(11, 120);
        for field in CaseCount::ALL {
            assert_eq!(delta(&case, &case, field), Some(0));
        }
        let test = testing(11, 0.7);
        for field in TestingCount::ALL {
            assert_eq!(delta(&test, &test, field), Some(0));
        }
        for field in TestingRate::ALL {
            assert_eq!(percent_delta(&test, &test, field), 0.0);
        }
        let part = participation(11);
        for field in Consent::ALL {
            assert_eq!(delta(&part, &part, field), Some(0));
            assert_eq!(percent_delta(&part, &part, field), 0.0);
        }
    }

    #[test]
    fn single_week_gets_zero_baseline() {
        let series = vec![cases(4, 37)];
        let pair = latest_pair(&series).unwrap();
        assert!(matches!(pair.previous, Cow::Owned(_)));
        assert_eq!(pair.previous.total_confirmed, 0);
        assert_eq!(pair.previous.student_confirmed, Some(0));
        assert_eq!(pair.previous.staff_confirmed, Some(0));
        assert_eq!(
            delta(pair.latest, pair.previous.as_ref(), CaseCount::Total),
            Some(37)
        );
    }

    #[test]
    fn pair_uses_last_two_weeks() {
        let series = vec![cases(4, 37), cases(11, 100), cases(18, 145)];
        let pair = latest_pair(&series).unwrap();
        assert!(matches!(pair.previous, Cow::Borrowed(_)));
        assert_eq!(pair.latest.week_ending, date(18));
        assert_eq!(pair.previous.week_ending, date(11));
        assert_eq!(
            delta(pair.latest, pair.previous.as_ref(), CaseCount::Total),
            Some(45)
        );
    }

    #[test]
    fn empty_series_has_no_pair() {
        let series: Vec<WeeklyCaseRecord> = Vec::new();
        assert!(latest_pair(&series).is_none());
    }

    #[test]
    fn missing_split_yields_no_delta() {
        let previous = cases(11, 100);
        let mut latest = cases(18, 145);
        latest.student_confirmed = None;
        assert_eq!(delta(&latest, &previous, CaseCount::Student), None);
        assert_eq!(delta(&latest, &previous, CaseCount::Total), Some(45));
    }

    #[test]
    fn percent_delta_rounds_to_one_place() {
        let previous = testing(11, 1.8);
        let latest = testing(18, 2.3);
        assert_eq!(percent_delta(&latest, &previous, TestingRate::AsymPositive), 0.5);
        assert_eq!(percent_delta(&previous, &latest, TestingRate::AsymPositive), -0.5);
        assert_eq!(round_to_tenth(-0.04), 0.0);
    }

    #[test]
    fn total_eligible_sums_statuses() {
        assert_eq!(total_eligible(&participation(18)), 12000);
    }

    #[test]
    fn participation_percentages_cover_everyone() {
        let record = participation(18);
        let sum: f64 = Consent::ALL.iter().map(|field| record.rate(*field)).sum();
        assert!((sum - 100.0).abs() < 0.5);
    }
}
