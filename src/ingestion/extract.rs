//! Header validation and positional row extraction for a single worksheet.

use calamine::{Data, Range};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{CellRule, ColumnSpec, ExtractionSchema, Row};

use super::dates;

/// Text of every cell in the header row (row 1), across all used columns.
///
/// Empty or missing cells become `""`.
pub fn header_titles(range: &Range<Data>) -> Vec<String> {
    let Some((_, last_col)) = range.end() else {
        return Vec::new();
    };
    (0..=last_col)
        .map(|col| {
            range
                .get_value((0, col))
                .and_then(cell_text)
                .unwrap_or_default()
        })
        .collect()
}

/// Required headers that do not appear in `titles` (exact, case-sensitive match).
pub fn missing_labels<'a>(schema: &'a ExtractionSchema, titles: &[String]) -> Vec<&'a str> {
    schema
        .required_headers()
        .filter(|label| !titles.iter().any(|t| t == label))
        .collect()
}

/// Fail with [`IngestionError::SchemaMismatch`] unless every required header is present.
///
/// Order and extra columns are ignored.
pub fn validate_headers(
    file_name: &str,
    schema: &ExtractionSchema,
    titles: &[String],
) -> IngestionResult<()> {
    let missing = missing_labels(schema, titles);
    if missing.is_empty() {
        return Ok(());
    }
    Err(IngestionError::SchemaMismatch {
        file_name: file_name.to_string(),
        missing: missing.into_iter().map(str::to_string).collect(),
        message: schema.mismatch_message(),
    })
}

/// Lazily extract data rows (row 2 onwards) until the first blank row.
///
/// Values are read from each column's fixed position, not from wherever its header was
/// found. The blank row itself is not yielded and nothing after it is read. A row whose date
/// cannot be rendered with `date_format` is yielded as an error.
pub fn data_rows<'a>(
    range: &'a Range<Data>,
    schema: &'a ExtractionSchema,
    date_format: &'a str,
) -> impl Iterator<Item = IngestionResult<Row>> + 'a {
    let last_row = range.end().map_or(0, |(row, _)| row);
    (1..=last_row)
        .map(move |row| extract_row(range, row, schema, date_format))
        .take_while(move |row| row.as_ref().map_or(true, |r| !is_blank_row(schema, r)))
}

/// Validate the header row, then collect the data rows.
pub fn extract_sheet(
    file_name: &str,
    range: &Range<Data>,
    schema: &ExtractionSchema,
    date_format: &str,
) -> IngestionResult<Vec<Row>> {
    let titles = header_titles(range);
    validate_headers(file_name, schema, &titles)?;
    data_rows(range, schema, date_format).collect()
}

/// A row is blank when every column that can be empty is empty or whitespace.
///
/// Always-populated columns (dates) are ignored.
pub fn is_blank_row(schema: &ExtractionSchema, row: &Row) -> bool {
    schema
        .columns
        .iter()
        .filter(|c| !c.rule.always_populated())
        .all(|c| row.get(&c.key).is_none_or(|v| v.trim().is_empty()))
}

/// Build one row from absolute 0-based worksheet row `row`.
pub fn extract_row(
    range: &Range<Data>,
    row: u32,
    schema: &ExtractionSchema,
    date_format: &str,
) -> IngestionResult<Row> {
    let fields = schema
        .columns
        .iter()
        .map(|c| {
            let cell = column_cell(range, row, c);
            Ok((c.key.clone(), apply_rule(&c.rule, cell, date_format)?))
        })
        .collect::<IngestionResult<Vec<_>>>()?;
    Ok(Row::new(fields))
}

fn column_cell<'a>(range: &'a Range<Data>, row: u32, column: &ColumnSpec) -> Option<&'a Data> {
    let col = u32::try_from(column.position.checked_sub(1)?).ok()?;
    range.get_value((row, col))
}

fn apply_rule(rule: &CellRule, cell: Option<&Data>, date_format: &str) -> IngestionResult<Option<String>> {
    match rule {
        CellRule::Raw => Ok(cell.and_then(cell_text)),
        CellRule::Strip { chars } => Ok(cell
            .and_then(cell_text)
            .map(|s| s.chars().filter(|ch| !chars.contains(*ch)).collect())),
        CellRule::OleDate => {
            let text = cell.and_then(date_cell_text);
            dates::format_date(dates::parse_ole_text(text.as_deref()), date_format).map(Some)
        }
    }
}

/// Cell text as the worksheet presents it; `None` for empty cells.
pub fn cell_text(c: &Data) -> Option<String> {
    match c {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => Some(e.to_string()),
    }
}

// Date-formatted cells are stored as serials; surface the serial so it parses as a number.
fn date_cell_text(c: &Data) -> Option<String> {
    match c {
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        other => cell_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::{data_rows, extract_sheet, header_titles, is_blank_row, missing_labels};
    use crate::error::IngestionError;
    use crate::types::{ExtractionSchema, Row};
    use calamine::{Cell, Data, Range};

    const FORMAT: &str = "%d/%m/%Y %H:%M:%S";

    fn grid(rows: &[&[&str]]) -> Range<Data> {
        let mut cells = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                if !v.is_empty() {
                    cells.push(Cell::new((r as u32, c as u32), Data::String((*v).to_string())));
                }
            }
        }
        Range::from_sparse(cells)
    }

    const HEADER: &[&str] = &["Documento", "Razão Social", "CEP", "Produto", "Número do pedido", "Data"];

    #[test]
    fn header_titles_fill_gaps_with_empty_strings() {
        let range = grid(&[&["a", "", "c"]]);
        assert_eq!(header_titles(&range), vec!["a", "", "c"]);
    }

    #[test]
    fn missing_labels_is_presence_only_and_case_sensitive() {
        let schema = ExtractionSchema::default();
        let titles: Vec<String> = ["Data", "Extra", "Número do pedido", "Produto", "CEP", "Razão social", "Documento"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(missing_labels(&schema, &titles), vec!["Razão Social"]);
    }

    #[test]
    fn cleanup_rules_apply_per_column() {
        let schema = ExtractionSchema::default();
        let range = grid(&[HEADER, &["123.456.789-00", "ACME Ltda", "12345-678", "Caneta", "P-1", "1"]]);
        let rows = extract_sheet("a.csv", &range, &schema, FORMAT).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("Documento"), Some("12345678900"));
        assert_eq!(row.get("Razão social"), Some("ACME Ltda"));
        assert_eq!(row.get("CEP"), Some("12345678"));
        assert_eq!(row.get("Número do pedido"), Some("P-1"));
        assert_eq!(row.get("Data"), Some("31/12/1899 00:00:00"));
    }

    #[test]
    fn first_blank_row_ends_the_sheet() {
        let schema = ExtractionSchema::default();
        let range = grid(&[
            HEADER,
            &["1", "A", "", "", "", ""],
            &["2", "B", "", "", "", ""],
            &["", "  ", "", "", "", "45000"],
            &["3", "C", "", "", "", ""],
        ]);
        let rows: Vec<Row> = data_rows(&range, &schema, FORMAT)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("Documento"), Some("2"));
    }

    #[test]
    fn unrenderable_date_format_is_an_error_not_a_panic() {
        let schema = ExtractionSchema::default();
        let range = grid(&[HEADER, &["1", "A", "", "", "", "45000"]]);
        let err = extract_sheet("a.csv", &range, &schema, "%d/%m/%Y %z").unwrap_err();
        assert!(matches!(err, IngestionError::InvalidConfig { .. }));
    }

    #[test]
    fn blank_check_ignores_date_column() {
        let schema = ExtractionSchema::default();
        let row = Row::new(vec![
            ("Documento".to_string(), None),
            ("Razão social".to_string(), Some(" ".to_string())),
            ("CEP".to_string(), Some(String::new())),
            ("Produto".to_string(), None),
            ("Número do pedido".to_string(), None),
            ("Data".to_string(), Some("01/01/1900 00:00:00".to_string())),
        ]);
        assert!(is_blank_row(&schema, &row));
    }

    #[test]
    fn extraction_is_positional_even_when_headers_are_shuffled() {
        let schema = ExtractionSchema::default();
        let range = grid(&[
            &["Produto", "Razão Social", "CEP", "Documento", "Número do pedido", "Data"],
            &["Caneta", "ACME", "1-2", "9.9", "7", "x"],
        ]);
        let rows = extract_sheet("a.csv", &range, &schema, FORMAT).unwrap();
        assert_eq!(rows[0].get("Documento"), Some("Caneta"));
        assert_eq!(rows[0].get("Produto"), Some("9.9"));
        assert_eq!(rows[0].get("Data"), Some("01/01/1900 00:00:00"));
    }

    #[test]
    fn missing_header_reports_schema_mismatch() {
        let schema = ExtractionSchema::default();
        let range = grid(&[&["Documento", "CEP"], &["1", "2"]]);
        let err = extract_sheet("pedidos.csv", &range, &schema, FORMAT).unwrap_err();
        match err {
            IngestionError::SchemaMismatch { file_name, missing, .. } => {
                assert_eq!(file_name, "pedidos.csv");
                assert_eq!(missing.len(), 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn typed_cells_render_as_text() {
        let schema = ExtractionSchema::default();
        let mut range: Range<Data> = Range::new((0, 0), (1, 5));
        for (c, h) in HEADER.iter().enumerate() {
            range.set_value((0, c as u32), Data::String((*h).to_string()));
        }
        range.set_value((1, 0), Data::Float(12345678900.0));
        range.set_value((1, 2), Data::Int(12345678));
        range.set_value((1, 5), Data::Float(45000.5));
        let rows = extract_sheet("a.xlsx", &range, &schema, FORMAT).unwrap();
        assert_eq!(rows[0].get("Documento"), Some("12345678900"));
        assert_eq!(rows[0].get("CEP"), Some("12345678"));
        assert_eq!(rows[0].get("Razão social"), None);
        assert_eq!(rows[0].get("Data"), Some("15/03/2023 12:00:00"));
    }
}
