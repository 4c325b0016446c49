//! Workbook (`.xlsx`, `.xls`) loading.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::error::IngestionResult;

use super::SheetSelection;

/// Parse an in-memory workbook and return the selected worksheet's cell range.
///
/// The container type is sniffed from the bytes, so a mislabelled `.xls`/`.xlsx` still opens.
/// Returns `Ok(None)` when the workbook has no sheets or the named sheet does not exist.
/// The buffer is consumed and dropped once the range has been read.
pub fn worksheet_from_bytes(
    bytes: Vec<u8>,
    selection: &SheetSelection,
) -> IngestionResult<Option<Range<Data>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet = match selection {
        SheetSelection::First => workbook.sheet_names().first().cloned(),
        SheetSelection::Named(name) => workbook
            .sheet_names()
            .iter()
            .find(|s| *s == name)
            .cloned(),
    };

    match sheet {
        Some(sheet) => Ok(Some(workbook.worksheet_range(&sheet)?)),
        None => Ok(None),
    }
}
