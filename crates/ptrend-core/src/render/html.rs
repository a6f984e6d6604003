//! Self-contained HTML trend page.

use super::json::TrendReport;
use super::RenderError;

const TEMPLATE: &str = include_str!("templates/report.html");

/// Fill the report template with `report` as its data payload.
pub fn render_report(report: &TrendReport, title: &str) -> Result<String, RenderError> {
    // keep the payload from closing the surrounding <script>
    let data = report.to_json()?.replace("</", "<\\/");
    Ok(TEMPLATE
        .replace("{{title}}", &escape(title))
        .replace("{{data}}", &data))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
