use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use crate::metrics::{total_eligible, Counts, Rates, Weekly};
use crate::models::{
    CaseCount, CollegeRecord, Consent, TestingCount, TestingRate, WeeklyCaseRecord,
    WeeklyParticipationRecord, WeeklyTestingRecord,
};

const WEEK_AXIS: &str = "Week Ending Date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Count,
    Percentage,
}

impl Unit {
    pub fn axis_title(self) -> &'static str {
        match self {
            Unit::Count => "Number",
            Unit::Percentage => "Percentage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Point {
    Count(i64),
    Percent(f64),
}

/// One line-with-markers series in Plotly's scatter trace layout.
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<Option<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertext: Option<Vec<String>>,
}

impl Trace {
    fn line(name: &str, x: Vec<NaiveDate>, y: Vec<Option<Point>>) -> Self {
        Self {
            kind: "scatter",
            mode: "lines+markers",
            name: name.to_string(),
            x,
            y,
            hovertext: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: String,
    pub unit: Unit,
    pub legend_title: &'static str,
    pub traces: Vec<Trace>,
}

impl ChartSpec {
    /// Plotly figure object (`data` plus `layout`).
    pub fn figure(&self) -> serde_json::Value {
        json!({
            "data": self.traces,
            "layout": {
                "title": { "text": self.title },
                "xaxis": { "title": { "text": WEEK_AXIS } },
                "yaxis": { "title": { "text": self.unit.axis_title() } },
                "legend": { "title": { "text": self.legend_title } },
            },
        })
    }
}

fn weeks<R: Weekly>(series: &[R]) -> Vec<NaiveDate> {
    series.iter().map(Weekly::week_ending).collect()
}

fn as_of<R: Weekly>(series: &[R]) -> Option<String> {
    series
        .last()
        .map(|latest| latest.week_ending().format("%Y-%m-%d").to_string())
}

fn titled<R: Weekly>(base: &str, series: &[R]) -> String {
    match as_of(series) {
        Some(date) => format!("{base} (as of {date})"),
        None => base.to_string(),
    }
}

fn count_trace<R: Weekly + Counts>(name: &str, series: &[R], field: R::Field) -> Trace {
    let y = series
        .iter()
        .map(|record| record.count(field).map(Point::Count))
        .collect();
    Trace::line(name, weeks(series), y)
}

fn rate_trace<R: Weekly + Rates>(name: &str, series: &[R], field: R::Field) -> Trace {
    let y = series
        .iter()
        .map(|record| Some(Point::Percent(record.rate(field))))
        .collect();
    Trace::line(name, weeks(series), y)
}

pub fn positives_chart(testing: &[WeeklyTestingRecord]) -> ChartSpec {
    ChartSpec {
        id: "test-positive-graph",
        title: titled("Weekly Confirmed Cases", testing),
        unit: Unit::Count,
        legend_title: "Test Type",
        traces: vec![
            count_trace("Asymptomatic", testing, TestingCount::AsymPositive),
            count_trace("Symptomatic", testing, TestingCount::SymPositive),
            count_trace("Other (NHS/Targeted)", testing, TestingCount::OtherPositive),
            count_trace("Total", testing, TestingCount::TotalPositive),
        ],
    }
}

pub fn cases_chart(cases: &[WeeklyCaseRecord]) -> ChartSpec {
    ChartSpec {
        id: "cases-graph",
        title: titled("Total Confirmed Cases", cases),
        unit: Unit::Count,
        legend_title: "Category",
        traces: vec![
            count_trace("Total", cases, CaseCount::Total),
            count_trace("Student", cases, CaseCount::Student),
            count_trace("Staff", cases, CaseCount::Staff),
        ],
    }
}

pub fn screening_chart(testing: &[WeeklyTestingRecord]) -> ChartSpec {
    ChartSpec {
        id: "test-screening-graph",
        title: titled("Weekly asymptomatic and symptomatic tests", testing),
        unit: Unit::Count,
        legend_title: "Test Type",
        traces: vec![
            count_trace("Asymptomatic", testing, TestingCount::AsymScreened),
            count_trace("Symptomatic", testing, TestingCount::SymScreened),
            count_trace("Total", testing, TestingCount::TotalScreened),
        ],
    }
}

pub fn positivity_chart(testing: &[WeeklyTestingRecord]) -> ChartSpec {
    ChartSpec {
        id: "test-positivity-graph",
        title: titled("Weekly asymptomatic/symptomatic test positivity rate", testing),
        unit: Unit::Percentage,
        legend_title: "Test Type",
        traces: vec![
            rate_trace("Asymptomatic", testing, TestingRate::AsymPositive),
            rate_trace("Symptomatic", testing, TestingRate::SymPositive),
        ],
    }
}

/// Screened and positive totals on one chart, for the compact layout.
pub fn testing_totals_chart(testing: &[WeeklyTestingRecord]) -> ChartSpec {
    ChartSpec {
        id: "test-totals-graph",
        title: titled("Weekly tests and confirmed cases", testing),
        unit: Unit::Count,
        legend_title: "Test Type",
        traces: vec![
            count_trace("Total screened", testing, TestingCount::TotalScreened),
            count_trace("Total positive", testing, TestingCount::TotalPositive),
        ],
    }
}

pub fn participation_chart(participation: &[WeeklyParticipationRecord]) -> ChartSpec {
    let title = match (participation.last(), as_of(participation)) {
        (Some(latest), Some(date)) => format!(
            "Testing Participation (Total Eligible = {}, as of {date})",
            total_eligible(latest)
        ),
        _ => "Testing Participation".to_string(),
    };

    let traces = [
        ("Consented", Consent::Consented),
        ("Declined", Consent::Declined),
        ("Undecided", Consent::Undecided),
    ]
    .into_iter()
    .map(|(name, status)| {
        let mut trace = count_trace(name, participation, status);
        trace.hovertext = Some(
            participation
                .iter()
                .map(|record| format!("{}%", crate::page::format_number(record.rate(status))))
                .collect(),
        );
        trace
    })
    .collect();

    ChartSpec {
        id: "participation-graph",
        title,
        unit: Unit::Count,
        legend_title: "Status",
        traces,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableColumn {
    pub id: &'static str,
    pub name: &'static str,
    pub numeric: bool,
}

/// College breakdown bound to a sortable grid. Cells are display strings.
#[derive(Debug, Clone)]
pub struct CollegeTable {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
}

const COLLEGE_COLUMNS: [TableColumn; 6] = [
    TableColumn { id: "college", name: "College", numeric: false },
    TableColumn { id: "positives", name: "Number of students tested positive", numeric: true },
    TableColumn { id: "isolating_households", name: "Number of households isolating", numeric: true },
    TableColumn { id: "isolating_students", name: "Number of students isolating", numeric: true },
    TableColumn { id: "last_updated", name: "Last updated", numeric: false },
    TableColumn { id: "source", name: "Source", numeric: false },
];

pub fn college_table(colleges: &[CollegeRecord]) -> CollegeTable {
    let rows = colleges
        .iter()
        .map(|record| {
            vec![
                record.college.clone(),
                record.positives.to_string(),
                record.isolating_households.to_string(),
                record.isolating_students.to_string(),
                record.last_updated.format("%Y-%m-%d").to_string(),
                record.display_source().to_string(),
            ]
        })
        .collect();

    CollegeTable {
        columns: COLLEGE_COLUMNS.to_vec(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestingRow;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 10, day).unwrap()
    }

    fn testing_series() -> Vec<WeeklyTestingRecord> {
        [(11, 1.8), (18, 2.3)]
            .into_iter()
            .map(|(day, rate)| {
                WeeklyTestingRecord::from(TestingRow {
                    week_ending: date(day),
                    asym_screened: 5000,
                    sym_screened: 200,
                    asym_positive: 10,
                    sym_positive: 7,
                    other_positive: 2,
                    asym_positive_rate: rate,
                    sym_positive_rate: 3.5,
                })
            })
            .collect()
    }

    #[test]
    fn title_embeds_latest_week() {
        let chart = positives_chart(&testing_series());
        assert_eq!(chart.title, "Weekly Confirmed Cases (as of 2020-10-18)");
        let names: Vec<&str> = chart.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Asymptomatic", "Symptomatic", "Other (NHS/Targeted)", "Total"]
        );
    }

    #[test]
    fn one_point_per_week() {
        let chart = screening_chart(&testing_series());
        for trace in &chart.traces {
            assert_eq!(trace.x, vec![date(11), date(18)]);
            assert_eq!(trace.y.len(), 2);
        }
        assert_eq!(chart.traces[2].y[1], Some(Point::Count(5200)));
    }

    #[test]
    fn missing_splits_become_gaps() {
        let cases = vec![
            WeeklyCaseRecord {
                week_ending: date(11),
                total_confirmed: 100,
                student_confirmed: Some(80),
                staff_confirmed: Some(20),
                week_confirmed: Some(38),
            },
            WeeklyCaseRecord {
                week_ending: date(18),
                total_confirmed: 145,
                student_confirmed: None,
                staff_confirmed: None,
                week_confirmed: None,
            },
        ];
        let chart = cases_chart(&cases);
        assert_eq!(chart.traces[1].y, vec![Some(Point::Count(80)), None]);
    }

    #[test]
    fn figure_serializes_for_plotly() {
        let figure = positivity_chart(&testing_series()).figure();
        assert_eq!(figure["data"][0]["mode"], "lines+markers");
        assert_eq!(figure["data"][0]["x"][1], "2020-10-18");
        assert_eq!(figure["data"][0]["y"][1], 2.3);
        assert_eq!(figure["layout"]["yaxis"]["title"]["text"], "Percentage");
        assert_eq!(figure["layout"]["legend"]["title"]["text"], "Test Type");
    }

    #[test]
    fn participation_title_and_hover() {
        let participation = vec![WeeklyParticipationRecord {
            week_ending: date(18),
            consented: 9100,
            declined: 590,
            undecided: 2310,
            consented_percent: 75.8,
            declined_percent: 4.9,
            undecided_percent: 19.3,
        }];
        let chart = participation_chart(&participation);
        assert_eq!(
            chart.title,
            "Testing Participation (Total Eligible = 12000, as of 2020-10-18)"
        );
        assert_eq!(
            chart.traces[0].hovertext.as_deref(),
            Some(&["75.8%".to_string()][..])
        );
    }

    #[test]
    fn college_rows_resolve_source() {
        let colleges = vec![
            CollegeRecord {
                college: "Trinity".to_string(),
                positives: 3,
                isolating_households: 2,
                isolating_students: 14,
                last_updated: date(18),
                source_name: "NHS".to_string(),
                source_link: Some("https://x".to_string()),
            },
            CollegeRecord {
                college: "Homerton".to_string(),
                positives: 1,
                isolating_households: 1,
                isolating_students: 6,
                last_updated: date(17),
                source_name: "NHS".to_string(),
                source_link: None,
            },
        ];
        let table = college_table(&colleges);
        assert_eq!(table.columns.len(), 6);
        assert_eq!(table.columns[5].name, "Source");
        assert_eq!(table.rows[0][5], "https://x");
        assert_eq!(table.rows[1][5], "NHS");
        assert_eq!(table.rows[1][4], "2020-10-17");
    }
}
