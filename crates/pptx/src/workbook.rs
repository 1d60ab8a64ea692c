//! Reading the cached values of a chart's embedded workbook.

use crate::package::Package;
use crate::xml::XmlElement;
use deck_core::{CellValue, Error, Result};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Row count of a worksheet; row numbers past it are ignored.
const MAX_ROWS: usize = 1 << 20;

/// Column count of a worksheet, `A` through `XFD`.
const MAX_COLUMNS: usize = 16_384;

/// Rows of cell values. `None` marks an empty cell between filled ones.
pub type Grid = Vec<Vec<Option<CellValue>>>;

/// Read the active sheet of an embedded XLSX.
///
/// Rows without any value are dropped and trailing empty cells trimmed.
pub fn read_active_sheet(xlsx: &[u8]) -> Result<Grid> {
    let mut package = Package::open(Cursor::new(xlsx))
        .map_err(|e| Error::WorkbookError(format!("Not a workbook: {}", e)))?;

    let workbook = package.read_xml("xl/workbook.xml")?;
    let active_tab: usize = workbook
        .path(&["bookViews", "workbookView"])
        .and_then(|view| view.attr("activeTab"))
        .and_then(|tab| tab.parse().ok())
        .unwrap_or(0);

    let sheets: Vec<&XmlElement> = workbook
        .child("sheets")
        .map(|s| s.children_named("sheet").collect())
        .unwrap_or_default();
    let sheet = sheets
        .get(active_tab)
        .or_else(|| sheets.first())
        .ok_or_else(|| Error::WorkbookError("Workbook has no sheets".to_string()))?;
    let rel_id = sheet
        .ns_attr("id")
        .ok_or_else(|| Error::WorkbookError("Sheet has no relationship id".to_string()))?;

    let rels = package.relationships("xl/workbook.xml")?;
    let sheet_path = rels
        .get(rel_id)
        .map(|r| r.target.clone())
        .ok_or_else(|| Error::WorkbookError(format!("Unresolved sheet relationship {}", rel_id)))?;

    let shared = if package.has_part("xl/sharedStrings.xml") {
        parse_shared_strings(&package.read_xml("xl/sharedStrings.xml")?)
    } else {
        Vec::new()
    };

    let sheet_xml = package.read_xml(&sheet_path)?;
    Ok(parse_sheet(&sheet_xml, &shared))
}

/// Strings of the shared string table, in index order.
fn parse_shared_strings(sst: &XmlElement) -> Vec<String> {
    sst.children_named("si")
        .map(|si| {
            // Phonetic runs are annotations, not content.
            si.elements()
                .filter(|e| e.name != "rPh" && e.name != "phoneticPr")
                .map(XmlElement::text)
                .collect()
        })
        .collect()
}

fn parse_sheet(sheet: &XmlElement, shared: &[String]) -> Grid {
    let mut rows: BTreeMap<usize, Vec<Option<CellValue>>> = BTreeMap::new();
    let Some(data) = sheet.child("sheetData") else {
        return Vec::new();
    };

    let mut next_row: usize = 1;
    for row in data.children_named("row") {
        let row_number = row
            .attr("r")
            .and_then(|r| r.parse().ok())
            .unwrap_or(next_row);
        if row_number == 0 || row_number > MAX_ROWS {
            log::debug!("Skipping worksheet row {}", row_number);
            continue;
        }
        next_row = row_number.saturating_add(1);

        let mut cells: Vec<Option<CellValue>> = Vec::new();
        for cell in row.children_named("c") {
            let col = match cell.attr("r") {
                Some(reference) => match column_index(reference) {
                    Some(col) => col,
                    None => {
                        log::debug!("Skipping cell with reference '{}'", reference);
                        continue;
                    }
                },
                None => cells.len(),
            };
            if col >= MAX_COLUMNS {
                continue;
            }
            if cells.len() <= col {
                cells.resize(col + 1, None);
            }
            cells[col] = cell_value(cell, shared);
        }

        while matches!(cells.last(), Some(None)) {
            cells.pop();
        }
        if !cells.is_empty() {
            rows.insert(row_number, cells);
        }
    }

    rows.into_values().collect()
}

fn cell_value(cell: &XmlElement, shared: &[String]) -> Option<CellValue> {
    let raw = cell.child("v").map(XmlElement::text);
    match cell.attr("t") {
        Some("s") => raw
            .and_then(|idx| idx.trim().parse::<usize>().ok())
            .and_then(|idx| shared.get(idx))
            .map(|s| CellValue::Text(s.clone())),
        Some("inlineStr") => cell.child("is").map(|is| CellValue::Text(is.text())),
        Some("b") => raw.map(|v| CellValue::Bool(v.trim() == "1")),
        Some("str") | Some("e") => raw.map(CellValue::Text),
        _ => raw.map(|v| match v.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(v),
        }),
    }
}

/// Zero-based column index of a cell reference like `AB12`.
///
/// `None` when there are no letters or the column lies past `XFD`.
fn column_index(reference: &str) -> Option<usize> {
    let letters = reference.bytes().take_while(|b| b.is_ascii_alphabetic());
    let mut index: usize = 0;
    for b in letters {
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as usize;
        index = index.checked_mul(26)?.checked_add(digit)?;
        if index > MAX_COLUMNS {
            return None;
        }
    }
    index.checked_sub(1)
}
