//! Delimited text export, one row per request and one column per run.

use std::io;

use super::RenderError;
use crate::align::AlignedMatrix;
use crate::stats::{Metric, StatisticRecord};

/// Header of the first column.
pub const CORNER_HEADER: &str = "Request\\Test";

/// Write one metric of a request matrix.
pub fn write_metric_csv<W: io::Write>(
    writer: W,
    matrix: &AlignedMatrix<StatisticRecord>,
    metric: Metric,
    delimiter: u8,
) -> Result<(), RenderError> {
    write_rows(
        writer,
        &matrix.run_descriptions,
        matrix.metric_rows(metric),
        delimiter,
    )
}

/// Write a matrix of plain values (WebPageTest metrics).
pub fn write_series_csv<W: io::Write>(
    writer: W,
    matrix: &AlignedMatrix<f64>,
    delimiter: u8,
) -> Result<(), RenderError> {
    let rows = matrix.rows.iter().map(|row| {
        let values: Vec<Option<f64>> = row.per_run.iter().map(|v| v.as_option().copied()).collect();
        (row.label.as_str(), values)
    });
    write_rows(writer, &matrix.run_descriptions, rows, delimiter)
}

fn write_rows<'a, W, I>(
    writer: W,
    runs: &[String],
    rows: I,
    delimiter: u8,
) -> Result<(), RenderError>
where
    W: io::Write,
    I: IntoIterator<Item = (&'a str, Vec<Option<f64>>)>,
{
    let mut out = ::csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    out.write_record(std::iter::once(CORNER_HEADER).chain(runs.iter().map(String::as_str)))?;

    for (label, values) in rows {
        let mut record = Vec::with_capacity(values.len() + 1);
        record.push(label.to_owned());
        record.extend(values.into_iter().map(format_value));
        out.write_record(&record)?;
    }

    out.flush()?;
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{align, ObservedSeries};
    use crate::stats::aggregate;

    fn matrix() -> AlignedMatrix<StatisticRecord> {
        let canonical = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let mut login = ObservedSeries::new("login");
        login.push("A", aggregate("login", &[10, 20]).unwrap());
        login.push("C", aggregate("login", &[30]).unwrap());
        let mut search = ObservedSeries::new("search");
        search.push("B", aggregate("search", &[0]).unwrap());
        align(&canonical, vec![login, search]).matrix
    }

    #[test]
    fn test_metric_csv_layout() {
        let mut out = Vec::new();
        write_metric_csv(&mut out, &matrix(), Metric::Average, b',').unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Request\\Test,A,B,C\nlogin,15,,30\nsearch,,0,\n");
    }

    #[test]
    fn test_custom_delimiter() {
        let mut out = Vec::new();
        write_metric_csv(&mut out, &matrix(), Metric::Max, b';').unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Request\\Test;A;B;C\n"));
        assert!(text.contains("login;20;;30\n"));
    }

    #[test]
    fn test_series_csv() {
        let canonical = vec!["A".to_string(), "B".to_string()];
        let mut load = ObservedSeries::new("loadTime");
        load.push("B", 1234.5);
        let matrix = align(&canonical, vec![load]).matrix;

        let mut out = Vec::new();
        write_series_csv(&mut out, &matrix, b',').unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Request\\Test,A,B\nloadTime,,1234.5\n"
        );
    }
}
