//! XLSX rendering of an in-memory [`Workbook`].

use std::collections::BTreeMap;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Worksheet};
use unicode_width::UnicodeWidthStr;

use crate::error::WorkbookError;
use crate::sheet::{CellStyle, CellValue, HorizontalAlign};
use crate::workbook::{CellBorders, Sheet, Workbook};

const MIN_COLUMN_WIDTH: f64 = 8.43;
const MAX_COLUMN_WIDTH: f64 = 50.0;
// Title cells are far wider than the grid text; widths follow body text only
const WIDTH_FONT_SIZE_LIMIT: u32 = 14;

/// Write every sheet of `workbook` to an `.xlsx` file.
pub fn write_workbook(workbook: &Workbook, path: &Path) -> Result<(), WorkbookError> {
    let mut book = rust_xlsxwriter::Workbook::new();
    for sheet in workbook.sheets() {
        let worksheet = book.add_worksheet();
        write_sheet(worksheet, sheet)?;
    }
    book.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), WorkbookError> {
    worksheet.set_name(sheet.name())?;

    let merged_cell = |row: u32, col: u32| {
        sheet
            .merges()
            .iter()
            .any(|m| m.contains(row, col) && !(m.row == row && m.col == col))
    };

    // Cells carrying only a border still need a format
    let mut positions: Vec<(u32, u32)> = sheet.cells().map(|(pos, _)| pos).collect();
    for row in 1..=sheet.row_count() {
        for col in 1..=sheet.last_column() {
            if sheet.cell(row, col).is_none() && sheet.borders(row, col).any() {
                positions.push((row, col));
            }
        }
    }
    positions.sort_unstable();

    for (row, col) in positions {
        if merged_cell(row, col) {
            continue;
        }
        let value = sheet.value(row, col);
        let format = cell_format(&sheet.style(row, col), sheet.borders(row, col));
        let (r, c) = zero_based(row, col)?;
        match value {
            CellValue::Number(n) => {
                worksheet.write_number_with_format(r, c, n, &format)?;
            }
            CellValue::Text(ref s) if !s.is_empty() => {
                worksheet.write_string_with_format(r, c, s, &format)?;
            }
            _ => {
                worksheet.write_blank(r, c, &format)?;
            }
        }
    }

    for merge in sheet.merges() {
        let mut borders = sheet.borders(merge.row, merge.col);
        let last = sheet.borders(merge.last_row(), merge.last_col());
        borders.right = last.right;
        borders.bottom = last.bottom;
        let format = cell_format(&sheet.style(merge.row, merge.col), borders);
        let (first_row, first_col) = zero_based(merge.row, merge.col)?;
        let (last_row, last_col) = zero_based(merge.last_row(), merge.last_col())?;
        worksheet.merge_range(
            first_row,
            first_col,
            last_row,
            last_col,
            &sheet.value(merge.row, merge.col).as_text(),
            &format,
        )?;
    }

    for (col, width) in column_widths(sheet) {
        worksheet.set_column_width(col, width)?;
    }

    Ok(())
}

fn zero_based(row: u32, col: u32) -> Result<(u32, u16), WorkbookError> {
    let c = u16::try_from(col - 1)
        .map_err(|_| WorkbookError::Invalid(format!("column {} out of range", col)))?;
    Ok((row - 1, c))
}

fn cell_format(style: &CellStyle, borders: CellBorders) -> Format {
    let mut format = Format::new();
    if let Some(size) = style.font_size {
        format = format.set_font_size(size);
    }
    if style.bold == Some(true) {
        format = format.set_bold();
    }
    if let Some(align) = style.align {
        format = format.set_align(match align {
            HorizontalAlign::Left => FormatAlign::Left,
            HorizontalAlign::Center => FormatAlign::Center,
            HorizontalAlign::Right => FormatAlign::Right,
        });
    }
    if let Some(rgb) = style.background.as_deref().and_then(parse_hex_color) {
        format = format.set_background_color(rgb);
    }
    if let Some(num_format) = &style.number_format {
        format = format.set_num_format(num_format);
    }
    if borders.top {
        format = format.set_border_top(FormatBorder::Thin);
    }
    if borders.bottom {
        format = format.set_border_bottom(FormatBorder::Thin);
    }
    if borders.left {
        format = format.set_border_left(FormatBorder::Thin);
    }
    if borders.right {
        format = format.set_border_right(FormatBorder::Thin);
    }
    format
}

/// `#rrggbb` to `0xRRGGBB`.
pub fn parse_hex_color(color: &str) -> Option<u32> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Column widths from the display width of body text (CJK counts double).
pub fn column_widths(sheet: &Sheet) -> BTreeMap<u16, f64> {
    let mut widths: BTreeMap<u16, f64> = BTreeMap::new();
    for ((_, col), cell) in sheet.cells() {
        if cell.style.font_size.unwrap_or(0) > WIDTH_FONT_SIZE_LIMIT || col == 0 {
            continue;
        }
        let Ok(c) = u16::try_from(col - 1) else {
            continue;
        };
        let text = cell.value.as_text();
        let width = (text.width() as f64 + 2.0).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        let entry = widths.entry(c).or_insert(MIN_COLUMN_WIDTH);
        *entry = entry.max(width);
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#d9ead3"), Some(0xD9EAD3));
        assert_eq!(parse_hex_color("d9ead3"), None);
        assert_eq!(parse_hex_color("#fff"), None);
    }
}
