//! CSV loading.
//!
//! Delimited uploads are read into the same [`calamine::Range`] grid that workbooks produce,
//! so header validation and positional extraction treat every format alike.

use calamine::{Cell, Data, Range};

use crate::error::IngestionResult;

/// Parse CSV bytes into a sparse cell range.
///
/// Rules:
///
/// - No header handling here: the first record is row 0 like any other.
/// - Records may have different lengths.
/// - Empty fields are left out of the range, so an all-empty file has no dimension.
/// - Fields are UTF-8; a field that is not valid UTF-8 is read as Latin-1, the usual
///   encoding of spreadsheet CSV exports.
pub fn worksheet_from_bytes(bytes: &[u8], delimiter: u8) -> IngestionResult<Range<Data>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut cells: Vec<Cell<Data>> = Vec::new();
    for (row_idx, result) in rdr.byte_records().enumerate() {
        let record = result?;
        for (col_idx, field) in record.iter().enumerate() {
            if field.is_empty() {
                continue;
            }
            cells.push(Cell::new(
                (grid_index(row_idx), grid_index(col_idx)),
                Data::String(decode_field(field)),
            ));
        }
    }

    Ok(Range::from_sparse(cells))
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|b| char::from(*b)).collect(),
    }
}

// calamine addresses cells with u32; anything past that is beyond any real upload.
fn grid_index(idx: usize) -> u32 {
    u32::try_from(idx).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::worksheet_from_bytes;
    use calamine::Data;

    #[test]
    fn cells_keep_absolute_positions() {
        let range = worksheet_from_bytes(b"a,b\n,x\n", b',').unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("a".to_string())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("x".to_string())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Empty));
        assert_eq!(range.end(), Some((1, 1)));
    }

    #[test]
    fn semicolon_delimiter_and_ragged_rows() {
        let range = worksheet_from_bytes(b"a;b;c\n1\n", b';').unwrap();
        assert_eq!(range.get_value((0, 2)), Some(&Data::String("c".to_string())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("1".to_string())));
    }

    #[test]
    fn latin1_fields_are_decoded() {
        let range = worksheet_from_bytes(b"Raz\xe3o,ok\n", b',').unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Razão".to_string())));
        assert_eq!(range.get_value((0, 1)), Some(&Data::String("ok".to_string())));
    }

    #[test]
    fn empty_input_has_no_dimension() {
        assert!(worksheet_from_bytes(b"", b',').unwrap().is_empty());
        assert!(worksheet_from_bytes(b",,\n,\n", b',').unwrap().is_empty());
    }
}
