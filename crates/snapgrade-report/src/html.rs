//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use std::path::Path;

use anyhow::{Context, Result};

use snapgrade_core::report::GradingReport;
use snapgrade_core::statistics::QuestionStatistic;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a grading report.
pub fn generate_html(report: &GradingReport) -> String {
    let mut html = String::new();
    let title = html_escape(&report.test.title);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{title} - snapgrade results</title>\n"));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{title}</h1>\n"));
    html.push_str(&format!(
        "<p class=\"meta\">{} questions | passing score {}% | {} sheets | generated {}</p>\n",
        report.test.total_questions,
        report.test.passing_score,
        report.results.len(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Class summary cards
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Class Summary</h2>\n");
    match &report.class_statistics {
        Some(stats) => {
            html.push_str("<div class=\"cards\">\n");
            for (label, value) in [
                ("Average", format!("{}%", stats.average)),
                ("Highest", format!("{}%", stats.highest)),
                ("Lowest", format!("{}%", stats.lowest)),
                (
                    "Passed",
                    format!("{}/{}", stats.passed_count, stats.total_count),
                ),
                ("Pass Rate", format!("{}%", stats.pass_rate_percent)),
            ] {
                html.push_str(&format!(
                    "<div class=\"card\"><span class=\"label\">{label}</span><span class=\"value\">{value}</span></div>\n"
                ));
            }
            html.push_str("</div>\n");
        }
        None => html.push_str("<p class=\"meta\">No sheets have been graded yet.</p>\n"),
    }
    html.push_str("</section>\n");

    // Per-student results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Students</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Student</th><th onclick=\"sortTable(1)\">ID</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Percentage</th><th onclick=\"sortTable(4)\">Status</th><th onclick=\"sortTable(5)\">Scanned</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for r in &report.results {
        let passed = report.passed(r);
        let class = if passed { "pass" } else { "fail" };
        let status = if passed { "Pass" } else { "Fail" };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}/{}</td><td>{}%</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
            html_escape(&r.student_name),
            html_escape(&r.student_id),
            r.correct_count,
            r.total_questions(),
            r.percentage,
            class,
            status,
            r.scanned_at.format("%Y-%m-%d %H:%M")
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Per-question analysis
    html.push_str("<section class=\"questions\">\n");
    html.push_str("<h2>Question Analysis</h2>\n");
    if !report.results.is_empty() {
        html.push_str(&generate_bar_chart(&report.question_statistics));
    }
    html.push_str("<table class=\"questions-table\">\n");
    html.push_str("<thead><tr><th>Question</th><th>Answer</th><th>Correct</th><th>Incorrect</th><th>Blank</th><th>Correct %</th><th>Most Common Wrong</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for q in &report.question_statistics {
        html.push_str(&format!(
            "<tr><td>Q{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}%</td><td>{}</td></tr>\n",
            q.question_number,
            q.expected_answer,
            q.correct_count,
            q.incorrect_count,
            q.unanswered_count,
            q.correct_percentage,
            q.most_common_wrong_answer
                .as_deref()
                .map(html_escape)
                .unwrap_or_else(|| "-".to_string())
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &GradingReport, path: &Path) -> Result<()> {
    crate::write_document(path, &generate_html(report))
        .with_context(|| format!("failed to write HTML report to {}", path.display()))
}

fn generate_bar_chart(questions: &[QuestionStatistic]) -> String {
    let bar_height = 18;
    let max_width = 400;
    let padding = 6;
    let label_width = 60;

    let total_height = questions.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, q) in questions.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = q.correct_percentage as usize * max_width / 100;

        let color = if q.correct_percentage >= 80 {
            "#22c55e"
        } else if q.correct_percentage >= 50 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">Q{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            q.question_number
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"3\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"currentColor\" dominant-baseline=\"middle\">{}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            q.correct_percentage
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #ffffff; --fg: #111827; --border: #e5e7eb; --pass: #d1fae5; --fail: #fee2e2; --card: #f3f4f6; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --card: #1f2937; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.cards { display: flex; flex-wrap: wrap; gap: 1rem; }
.card { background: var(--card); border-radius: 8px; padding: 1rem 1.5rem; min-width: 8rem; display: flex; flex-direction: column; }
.card .label { font-size: 0.8rem; color: #6b7280; text-transform: uppercase; }
.card .value { font-size: 1.6rem; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
