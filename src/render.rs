//! HTML rendering of a composed [`PageModel`].
//!
//! The output is one static document. Charts are Plotly figures embedded as
//! JSON and drawn client-side; the college table sorts client-side.

use std::fmt::Write;

use crate::charts::{ChartSpec, CollegeTable};
use crate::page::{Link, PageModel, Section, SummaryCard};

pub const STYLESHEET_PATH: &str = "/assets/css/main.css";

const PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const BOOTSTRAP_SRC: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@4.5.3/dist/css/bootstrap.min.css";

pub fn render_page(page: &PageModel) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
{meta}
    <link rel="stylesheet" href="{bootstrap}">
    <link rel="stylesheet" href="{stylesheet}">
    <script src="{plotly}"></script>
</head>
<body>
    <div class="container my-5 px-5 pt-5 pb-3">
{header}
{cards}
{sections}
{notes}
{footer}
    </div>
    <script>{js}</script>
</body>
</html>
"#,
        title = html_escape(page.meta.title),
        meta = render_meta(page),
        bootstrap = BOOTSTRAP_SRC,
        stylesheet = STYLESHEET_PATH,
        plotly = PLOTLY_SRC,
        header = render_header(page),
        cards = render_cards(&page.cards),
        sections = page
            .sections
            .iter()
            .map(render_section)
            .collect::<Vec<_>>()
            .join("\n"),
        notes = render_notes(page),
        footer = render_footer(&page.footer),
        js = inline_javascript(),
    )
}

fn render_meta(page: &PageModel) -> String {
    let meta = &page.meta;
    let tags = [
        ("name", "title", meta.title),
        ("name", "description", meta.description),
        ("name", "keywords", meta.keywords),
        ("name", "language", "English"),
        ("name", "author", meta.author),
        ("http-equiv", "X-UA-Compatible", "IE=edge"),
        ("property", "og:type", "website"),
        ("property", "og:url", meta.url),
        ("property", "og:title", meta.title),
        ("property", "og:description", meta.description),
        ("property", "og:image", meta.image),
        ("property", "twitter:card", "summary_large_image"),
        ("property", "twitter:url", meta.url),
        ("property", "twitter:title", meta.title),
        ("property", "twitter:description", meta.description),
        ("property", "twitter:image", meta.image),
    ];

    let mut output = String::new();
    for (attr, key, content) in tags {
        let _ = writeln!(
            output,
            r#"    <meta {attr}="{key}" content="{content}">"#,
            content = html_escape(content)
        );
    }
    output
}

fn render_header(page: &PageModel) -> String {
    let updated = page
        .last_update
        .map(|date| format!("Updated weekly. Last update: {}", date.format("%-d %B %Y")))
        .unwrap_or_else(|| "Updated weekly.".to_string());

    format!(
        r#"        <h1>{title}</h1>
        <div>{updated}</div>
        <div>Unofficial student-run dashboard. Data from {source}.</div>"#,
        title = html_escape(page.meta.title),
        source = render_link(&page.source),
    )
}

fn render_link(link: &Link) -> String {
    format!(
        r#"<a href="{}" target="_blank">{}</a>"#,
        html_escape(link.href),
        html_escape(link.label)
    )
}

fn render_cards(cards: &[SummaryCard]) -> String {
    let labels: String = cards
        .iter()
        .map(|card| format!(r#"<div class="col"><div>{}</div></div>"#, html_escape(card.label)))
        .collect();
    let values: String = cards
        .iter()
        .map(|card| format!(r#"<div class="col"><div><h5>{}</h5></div></div>"#, html_escape(&card.value)))
        .collect();

    format!(
        r#"        <div class="my-5 summary">
            <div class="row">{labels}</div>
            <div class="row">{values}</div>
        </div>"#
    )
}

fn render_section(section: &Section) -> String {
    match section {
        Section::Chart(chart) => render_chart(chart),
        Section::Colleges(table) => render_college_table(table),
    }
}

fn render_chart(chart: &ChartSpec) -> String {
    // `<` is escaped so the figure cannot close its script element
    let figure = chart.figure().to_string().replace('<', "\\u003c");
    format!(
        r#"        <div class="chart" id="{id}" data-figure="{id}-figure"></div>
        <script type="application/json" id="{id}-figure">{figure}</script>"#,
        id = chart.id,
    )
}

fn render_college_table(table: &CollegeTable) -> String {
    let headers: String = table
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            format!(
                r#"<th class="sortable" data-column="{index}" data-numeric="{numeric}">{name}</th>"#,
                numeric = column.numeric,
                name = html_escape(column.name),
            )
        })
        .collect();

    let mut rows = String::new();
    for row in &table.rows {
        let cells: String = row
            .iter()
            .map(|cell| format!("<td>{}</td>", html_escape(cell)))
            .collect();
        let _ = writeln!(rows, "                    <tr>{cells}</tr>");
    }

    format!(
        r#"        <div class="my-5">
            <h4 class="mb-4">Breakdown by College</h4>
            <div class="table-wrapper">
            <table id="college-table" class="table table-sm">
                <thead><tr>{headers}</tr></thead>
                <tbody>
{rows}                </tbody>
            </table>
            </div>
        </div>"#
    )
}

fn render_notes(page: &PageModel) -> String {
    if page.notes.is_empty() {
        return String::new();
    }

    let items: String = page
        .notes
        .iter()
        .map(|note| {
            format!(
                "<li><strong>{}: </strong>{}</li>",
                note.date.format("%-d %B %Y"),
                html_escape(note.text)
            )
        })
        .collect();

    format!(
        r#"        <div class="my-3">
            <h4 class="mb-3">Notes</h4>
            <ul>{items}</ul>
        </div>"#
    )
}

fn render_footer(links: &[Link]) -> String {
    let rows: String = links
        .iter()
        .map(|link| {
            format!(
                r#"<div class="row"><div class="col d-flex justify-content-center">{}</div></div>"#,
                render_link(link)
            )
        })
        .collect();

    format!(r#"        <div class="mt-5">{rows}</div>"#)
}

pub fn stylesheet() -> &'static str {
    r#"body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    color: #212529;
}
.chart {
    min-height: 450px;
    margin-bottom: 2rem;
}
.summary h5 {
    font-weight: 600;
}
.table-wrapper {
    overflow-x: auto;
}
th.sortable {
    cursor: pointer;
    user-select: none;
}
th.sortable.asc::after {
    content: " \25B2";
}
th.sortable.desc::after {
    content: " \25BC";
}
"#
}

fn inline_javascript() -> &'static str {
    r#"
(function() {
    document.querySelectorAll('.chart').forEach(function(el) {
        const source = document.getElementById(el.dataset.figure);
        if (!source || typeof Plotly === 'undefined') {
            return;
        }
        const figure = JSON.parse(source.textContent);
        Plotly.newPlot(el, figure.data, figure.layout, {responsive: true});
    });

    const table = document.getElementById('college-table');
    if (!table) {
        return;
    }
    let sortColumn = null;
    let sortDirection = 'asc';

    function sortTable(header) {
        const column = Number(header.dataset.column);
        const numeric = header.dataset.numeric === 'true';
        if (sortColumn === column) {
            sortDirection = sortDirection === 'asc' ? 'desc' : 'asc';
        } else {
            sortColumn = column;
            sortDirection = 'asc';
        }

        table.querySelectorAll('th.sortable').forEach(th => th.classList.remove('asc', 'desc'));
        header.classList.add(sortDirection);

        const body = table.querySelector('tbody');
        const rows = Array.from(body.querySelectorAll('tr'));
        rows.sort((a, b) => {
            const aVal = a.children[column].textContent;
            const bVal = b.children[column].textContent;
            const order = numeric
                ? parseFloat(aVal) - parseFloat(bVal)
                : aVal.localeCompare(bVal);
            return sortDirection === 'asc' ? order : -order;
        });
        rows.forEach(row => body.appendChild(row));
    }

    table.querySelectorAll('th.sortable').forEach(th => {
        th.addEventListener('click', () => sortTable(th));
    });
})();
"#
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollegeRecord, WeeklyCaseRecord};
    use crate::page::{build_page, LayoutVariant};
    use chrono::NaiveDate;

    fn page_with_college(name: &str) -> PageModel {
        let week = NaiveDate::from_ymd_opt(2020, 10, 18).unwrap();
        let cases = vec![WeeklyCaseRecord {
            week_ending: week,
            total_confirmed: 145,
            student_confirmed: None,
            staff_confirmed: None,
            week_confirmed: None,
        }];
        let colleges = vec![CollegeRecord {
            college: name.to_string(),
            positives: 2,
            isolating_households: 1,
            isolating_students: 9,
            last_updated: week,
            source_name: "NHS".to_string(),
            source_link: None,
        }];
        build_page(&cases, &colleges, &[], &[], LayoutVariant::Full)
    }

    #[test]
    fn escapes_table_cells() {
        let html = render_page(&page_with_college("St <Catharine's>"));
        assert!(html.contains("<td>St &lt;Catharine&#39;s&gt;</td>"));
        assert!(!html.contains("St <Catharine"));
    }

    #[test]
    fn embeds_each_chart_figure() {
        let page = page_with_college("Trinity");
        let html = render_page(&page);
        for chart in page.charts() {
            assert!(html.contains(&format!(r#"id="{}-figure""#, chart.id)));
        }
        assert!(html.contains("Total Confirmed Cases (as of 2020-10-18)"));
        assert!(html.contains("<h5>145 (+145)</h5>"));
    }

    #[test]
    fn header_notes_and_footer() {
        let html = render_page(&page_with_college("Trinity"));
        assert!(html.contains("Last update: 18 October 2020"));
        assert!(html.contains("<strong>20 October 2020: </strong>"));
        assert!(html.contains(r#"href="https://faizaanpervaiz.me""#));
        assert!(html.contains(STYLESHEET_PATH));
        assert!(html.contains(r#"<meta property="og:url" content="http://camcovid.xyz">"#));
    }

    #[test]
    fn figure_json_cannot_close_script() {
        let mut page = page_with_college("Trinity");
        if let Some(Section::Chart(chart)) = page.sections.first_mut() {
            chart.title = "</script><b>".to_string();
        }
        let html = render_page(&page);
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("\\u003c/script>"));
    }
}
