use chrono::NaiveDate;

use crate::charts::{self, ChartSpec, CollegeTable};
use crate::loader::DataSet;
use crate::metrics::{delta, latest_pair, percent_delta, Counts, Weekly};
use crate::models::{
    CaseCount, CollegeRecord, TestingCount, TestingRate, WeeklyCaseRecord,
    WeeklyParticipationRecord, WeeklyTestingRecord,
};

/// Which snapshot of the dashboard layout to compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LayoutVariant {
    /// College table and asymptomatic/symptomatic breakdowns.
    #[default]
    Full,
    /// Cases, testing totals and participation only.
    Compact,
}

#[derive(Debug, Clone)]
pub struct PageMeta {
    pub title: &'static str,
    pub description: &'static str,
    pub keywords: &'static str,
    pub author: &'static str,
    pub url: &'static str,
    pub image: &'static str,
}

pub const META: PageMeta = PageMeta {
    title: "University of Cambridge COVID-19 Dashboard",
    description: "A simple dashboard for tracking weekly case and testing data from the \
                  University of Cambridge testing programmes for students and staff.",
    keywords: "coronavirus, covid, university, cambridge, data, visualisation, dashboard",
    author: "Faizaan Pervaiz",
    url: "http://camcovid.xyz",
    image: "http://camcovid.xyz/assets/sars-cov-2.jpg",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: &'static str,
    pub href: &'static str,
}

pub const DATA_SOURCE: Link = Link {
    label: "University of Cambridge",
    href: "https://www.cam.ac.uk/coronavirus/stay-safe-cambridge-uni/data-from-covid-19-testing-service",
};

pub const FOOTER_LINKS: [Link; 3] = [
    Link {
        label: "GitHub",
        href: "https://github.com/fpervaiz/UniversityOfCambridge-COVID-19-Dashboard",
    },
    Link {
        label: "Faizaan Pervaiz",
        href: "https://faizaanpervaiz.me",
    },
    Link {
        label: "Image credits: CDC PHIL",
        href: "https://phil.cdc.gov/Details.aspx?pid=23311",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub date: NaiveDate,
    pub text: &'static str,
}

pub fn default_notes() -> Vec<Note> {
    NaiveDate::from_ymd_opt(2020, 10, 20)
        .map(|date| Note {
            date,
            text: "The University has stopped providing a breakdown of students and staff \
                   cases, therefore only the total number of cases is available from the \
                   week ending 18th October 2020.",
        })
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum Section {
    Chart(ChartSpec),
    Colleges(CollegeTable),
}

/// Everything the page shows, composed once at startup.
#[derive(Debug, Clone)]
pub struct PageModel {
    pub meta: PageMeta,
    pub last_update: Option<NaiveDate>,
    pub source: Link,
    pub cards: Vec<SummaryCard>,
    pub sections: Vec<Section>,
    pub notes: Vec<Note>,
    pub footer: Vec<Link>,
}

impl PageModel {
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.sections.iter().filter_map(|section| match section {
            Section::Chart(chart) => Some(chart),
            Section::Colleges(_) => None,
        })
    }

    pub fn college_table(&self) -> Option<&CollegeTable> {
        self.sections.iter().find_map(|section| match section {
            Section::Colleges(table) => Some(table),
            Section::Chart(_) => None,
        })
    }
}

/// Floats the way the source sheets write them: `2.0`, `2.3`, `0.25`.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

pub fn format_count_card(value: i64, change: Option<i64>) -> String {
    match change {
        Some(change) => format!("{value} ({change:+})"),
        None => value.to_string(),
    }
}

pub fn format_rate_card(value: f64, change: f64) -> String {
    format!("{}% ({change:+.1}%)", format_number(value))
}

fn case_card(cases: &[WeeklyCaseRecord]) -> Option<SummaryCard> {
    let pair = latest_pair(cases)?;
    Some(SummaryCard {
        label: "Total Confirmed Cases",
        value: format_count_card(
            pair.latest.total_confirmed,
            delta(pair.latest, pair.previous.as_ref(), CaseCount::Total),
        ),
    })
}

fn testing_count_card(
    testing: &[WeeklyTestingRecord],
    label: &'static str,
    field: TestingCount,
) -> Option<SummaryCard> {
    let pair = latest_pair(testing)?;
    let value = pair.latest.count(field).unwrap_or_default();
    Some(SummaryCard {
        label,
        value: format_count_card(value, delta(pair.latest, pair.previous.as_ref(), field)),
    })
}

fn positivity_card(testing: &[WeeklyTestingRecord]) -> Option<SummaryCard> {
    let pair = latest_pair(testing)?;
    Some(SummaryCard {
        label: "Weekly Asymptomatic Positivity Rate",
        value: format_rate_card(
            pair.latest.asym_positive_rate,
            percent_delta(pair.latest, pair.previous.as_ref(), TestingRate::AsymPositive),
        ),
    })
}

fn last_update(
    cases: &[WeeklyCaseRecord],
    testing: &[WeeklyTestingRecord],
    participation: &[WeeklyParticipationRecord],
) -> Option<NaiveDate> {
    [
        cases.last().map(Weekly::week_ending),
        testing.last().map(Weekly::week_ending),
        participation.last().map(Weekly::week_ending),
    ]
    .into_iter()
    .flatten()
    .max()
}

pub fn build_page(
    cases: &[WeeklyCaseRecord],
    colleges: &[CollegeRecord],
    testing: &[WeeklyTestingRecord],
    participation: &[WeeklyParticipationRecord],
    variant: LayoutVariant,
) -> PageModel {
    let (cards, sections) = match variant {
        LayoutVariant::Full => (
            vec![
                case_card(cases),
                testing_count_card(testing, "Weekly Asymptomatic Tests", TestingCount::AsymScreened),
                positivity_card(testing),
            ],
            vec![
                Section::Chart(charts::positives_chart(testing)),
                Section::Chart(charts::cases_chart(cases)),
                Section::Colleges(charts::college_table(colleges)),
                Section::Chart(charts::screening_chart(testing)),
                Section::Chart(charts::positivity_chart(testing)),
                Section::Chart(charts::participation_chart(participation)),
            ],
        ),
        LayoutVariant::Compact => (
            vec![
                case_card(cases),
                testing_count_card(testing, "Weekly Tests", TestingCount::TotalScreened),
                testing_count_card(testing, "Weekly Positive Tests", TestingCount::TotalPositive),
            ],
            vec![
                Section::Chart(charts::cases_chart(cases)),
                Section::Chart(charts::testing_totals_chart(testing)),
                Section::Chart(charts::participation_chart(participation)),
            ],
        ),
    };

    PageModel {
        meta: META,
        last_update: last_update(cases, testing, participation),
        source: DATA_SOURCE,
        cards: cards.into_iter().flatten().collect(),
        sections,
        notes: default_notes(),
        footer: FOOTER_LINKS.to_vec(),
    }
}

pub fn build_page_from(data: &DataSet, variant: LayoutVariant) -> PageModel {
    build_page(
        &data.cases,
        &data.colleges,
        &data.testing,
        &data.participation,
        variant,
    )
}
