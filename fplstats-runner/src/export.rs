//! Artifact rendering: CSV, the DataTables HTML page, and Parquet.
//!
//! Every function here renders into memory. Writing to disk is the
//! pipeline's job, through an `ArtifactWriter`.

use fplstats_core::domain::{Cell, Table};
use polars::prelude::{Column, DataFrame, ParquetWriter, PolarsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV flush failed: {0}")]
    Flush(String),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Parquet encoding failed: {0}")]
    Parquet(#[from] PolarsError),
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Header row, then one record per row. Numbers use the shortest
/// representation that parses back to the same value; `Empty` is an empty
/// field.
pub fn export_csv(table: &Table) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(Cell::render))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

// ─── HTML export ────────────────────────────────────────────────────

const DATATABLES_CSS: &str = "https://cdn.datatables.net/1.11.5/css/jquery.dataTables.css";
const JQUERY_JS: &str = "https://code.jquery.com/jquery-3.6.0.min.js";
const DATATABLES_JS: &str = "https://cdn.datatables.net/1.11.5/js/jquery.dataTables.js";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Adds a "Min ..." input filtering rows on this column. Ignored when the
    /// table has no such column.
    pub min_filter_column: Option<String>,
}

impl HtmlOptions {
    pub fn with_min_filter(column: impl Into<String>) -> Self {
        Self {
            min_filter_column: Some(column.into()),
        }
    }
}

/// Render a static page showing `table` as a sortable, searchable DataTable.
pub fn render_html(table: &Table, options: &HtmlOptions) -> String {
    let filter = options
        .min_filter_column
        .as_deref()
        .and_then(|name| table.column_index(name).map(|idx| (name, idx)));
    if let (Some(name), None) = (options.min_filter_column.as_deref(), filter) {
        tracing::warn!(column = name, "min filter column not in table; filter omitted");
    }

    let mut html = String::with_capacity(256 + table.len() * table.headers.len() * 16);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("    <meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "    <link rel=\"stylesheet\" type=\"text/css\" href=\"{DATATABLES_CSS}\">\n"
    ));
    html.push_str(&format!(
        "    <script type=\"text/javascript\" charset=\"utf8\" src=\"{JQUERY_JS}\"></script>\n"
    ));
    html.push_str(&format!(
        "    <script type=\"text/javascript\" charset=\"utf8\" src=\"{DATATABLES_JS}\"></script>\n"
    ));
    html.push_str("    <script>\n");
    html.push_str(&init_script(filter.map(|(_, idx)| idx)));
    html.push_str("    </script>\n</head>\n<body>\n");
    if let Some((name, _)) = filter {
        html.push_str(&format!(
            "    <label>Min {}: <input type=\"text\" id=\"minFilter\"></label>\n",
            escape_html(&title_case(name))
        ));
    }
    html.push_str(&table_markup(table));
    html.push_str("</body>\n</html>\n");
    html
}

fn init_script(filter_index: Option<usize>) -> String {
    let mut js = String::from(
        "        $(document).ready(function () {\n            var table = $('#dataTable').DataTable();\n",
    );
    if let Some(idx) = filter_index {
        js.push_str(&format!(
            r#"            $.fn.dataTable.ext.search.push(
                function (settings, data, dataIndex) {{
                    var min = parseInt($('#minFilter').val(), 10);
                    var value = parseFloat(data[{idx}]) || 0;
                    return isNaN(min) || value >= min;
                }}
            );
            $('#minFilter').keyup(function () {{
                table.draw();
            }});
"#
        ));
    }
    js.push_str("        });\n");
    js
}

fn table_markup(table: &Table) -> String {
    let mut out = String::from(
        "    <table border=\"1\" class=\"dataframe display\" id=\"dataTable\">\n      <thead>\n        <tr style=\"text-align: right;\">\n",
    );
    for h in &table.headers {
        out.push_str(&format!("          <th>{}</th>\n", escape_html(h)));
    }
    out.push_str("        </tr>\n      </thead>\n      <tbody>\n");
    for row in &table.rows {
        out.push_str("        <tr>\n");
        for cell in row {
            out.push_str(&format!("          <td>{}</td>\n", escape_html(&cell.render())));
        }
        out.push_str("        </tr>\n");
    }
    out.push_str("      </tbody>\n    </table>\n");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ─── Parquet export ─────────────────────────────────────────────────

/// Columns holding only numbers (or blanks) become nullable `f64`; all
/// others become nullable strings.
fn table_to_dataframe(table: &Table) -> Result<DataFrame, PolarsError> {
    let columns = table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells = table.rows.iter().map(|row| &row[idx]);
            let numeric = table
                .rows
                .iter()
                .all(|row| matches!(row[idx], Cell::Number(_) | Cell::Empty));
            if numeric {
                let values: Vec<Option<f64>> = cells.map(Cell::as_number).collect();
                Column::new(name.as_str().into(), values)
            } else {
                let values: Vec<Option<String>> = cells
                    .map(|c| (!c.is_empty()).then(|| c.render()))
                    .collect();
                Column::new(name.as_str().into(), values)
            }
        })
        .collect::<Vec<_>>();
    DataFrame::new(columns)
}

/// Encode `table` as a Parquet file image.
pub fn parquet_bytes(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut df = table_to_dataframe(table)?;
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf).finish(&mut df)?;
    Ok(buf)
}
