//! In-memory spreadsheet implementing [`SheetBackend`], persisted as JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, WorkbookError};
use crate::sheet::{BorderSpec, CellRange, CellStyle, CellValue, Fill, RangeDirective, SheetBackend};
use crate::types::{HOME_LABELS, MONTH_CELL, Period, YEAR_CELL};

/// Grid size of a freshly inserted sheet, as in a hosted spreadsheet.
pub const DEFAULT_ROW_COUNT: u32 = 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "CellStyle::is_empty")]
    pub style: CellStyle,
}

/// Borders drawn around one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellBorders {
    pub top: bool,
    pub left: bool,
    pub bottom: bool,
    pub right: bool,
}

impl CellBorders {
    pub fn any(&self) -> bool {
        self.top || self.left || self.bottom || self.right
    }
}

/// One worksheet.
///
/// Borders are stored as grid lines shared by neighbouring cells:
/// `(row, col)` in `horizontal` is the line above `row` at column `col`, in
/// `vertical` the line left of `col` at row `row`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    row_count: u32,
    cells: BTreeMap<(u32, u32), Cell>,
    horizontal: BTreeSet<(u32, u32)>,
    vertical: BTreeSet<(u32, u32)>,
    merges: Vec<CellRange>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, row_count: u32) -> Self {
        Sheet {
            name: name.into(),
            row_count,
            cells: BTreeMap::new(),
            horizontal: BTreeSet::new(),
            vertical: BTreeSet::new(),
            merges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u32) -> CellValue {
        self.cell(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    pub fn style(&self, row: u32, col: u32) -> CellStyle {
        self.cell(row, col)
            .map(|c| c.style.clone())
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        self.grow_to(row);
        self.cells.entry((row, col)).or_default().value = value.into();
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u32), &Cell)> {
        self.cells.iter().map(|(&pos, cell)| (pos, cell))
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    pub fn borders(&self, row: u32, col: u32) -> CellBorders {
        CellBorders {
            top: self.horizontal.contains(&(row, col)),
            bottom: self.horizontal.contains(&(row + 1, col)),
            left: self.vertical.contains(&(row, col)),
            right: self.vertical.contains(&(row, col + 1)),
        }
    }

    /// Last row holding a non-blank value, 0 for an empty sheet.
    pub fn last_row(&self) -> u32 {
        self.cells
            .iter()
            .filter(|(_, cell)| !cell.value.is_blank())
            .map(|(&(row, _), _)| row)
            .max()
            .unwrap_or(0)
    }

    /// Last column touched by a value, style or border.
    pub fn last_column(&self) -> u32 {
        let cells = self.cells.keys().map(|&(_, col)| col);
        let horizontal = self.horizontal.iter().map(|&(_, col)| col);
        let vertical = self.vertical.iter().map(|&(_, col)| col.saturating_sub(1));
        cells.chain(horizontal).chain(vertical).max().unwrap_or(0)
    }

    fn grow_to(&mut self, row: u32) {
        self.row_count = self.row_count.max(row);
    }

    fn apply(&mut self, directive: &RangeDirective) -> Result<(), BackendError> {
        let range = directive.range;
        range.validate()?;
        self.grow_to(range.last_row());

        if directive.merge {
            self.merges.retain(|m| !overlaps(m, &range));
            self.merges.push(range);
        }

        match &directive.fill {
            Some(Fill::Grid(values)) => {
                let got_cols = values.iter().map(Vec::len).max().unwrap_or(0);
                if values.len() != range.rows as usize
                    || values.iter().any(|row| row.len() != range.cols as usize)
                {
                    return Err(BackendError::ShapeMismatch {
                        rows: range.rows,
                        cols: range.cols,
                        got_rows: values.len(),
                        got_cols,
                    });
                }
                for (r, row_values) in values.iter().enumerate() {
                    for (c, value) in row_values.iter().enumerate() {
                        let pos = (range.row + r as u32, range.col + c as u32);
                        self.cells.entry(pos).or_default().value = value.clone();
                    }
                }
            }
            Some(Fill::Single(value)) => {
                let merged = self.merges.iter().any(|m| *m == range);
                for row in range.row..=range.last_row() {
                    for col in range.col..=range.last_col() {
                        let top_left = row == range.row && col == range.col;
                        let value = if merged && !top_left {
                            CellValue::Empty
                        } else {
                            value.clone()
                        };
                        self.cells.entry((row, col)).or_default().value = value;
                    }
                }
            }
            None => {}
        }

        if !directive.style.is_empty() {
            for row in range.row..=range.last_row() {
                for col in range.col..=range.last_col() {
                    let cell = self.cells.entry((row, col)).or_default();
                    cell.style = cell.style.merge(&directive.style);
                }
            }
        }

        if let Some(border) = directive.border {
            self.apply_border(&range, border);
        }

        Ok(())
    }

    fn apply_border(&mut self, range: &CellRange, border: BorderSpec) {
        let cols = range.col..=range.last_col();
        let rows = range.row..=range.last_row();
        if let Some(on) = border.top {
            for col in cols.clone() {
                toggle(&mut self.horizontal, (range.row, col), on);
            }
        }
        if let Some(on) = border.bottom {
            for col in cols {
                toggle(&mut self.horizontal, (range.last_row() + 1, col), on);
            }
        }
        if let Some(on) = border.left {
            for row in rows.clone() {
                toggle(&mut self.vertical, (row, range.col), on);
            }
        }
        if let Some(on) = border.right {
            for row in rows {
                toggle(&mut self.vertical, (row, range.last_col() + 1), on);
            }
        }
    }

    fn insert_rows_after(&mut self, after: u32, count: u32) -> Result<(), BackendError> {
        if after > self.row_count {
            return Err(BackendError::InvalidRange(format!(
                "cannot insert after row {} of {} in {}",
                after, self.row_count, self.name
            )));
        }
        let shift = |row: u32| if row > after { row + count } else { row };

        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .map(|((row, col), cell)| ((shift(row), col), cell))
            .collect();
        self.horizontal = std::mem::take(&mut self.horizontal)
            .into_iter()
            .map(|(row, col)| (shift(row), col))
            .collect();
        self.vertical = std::mem::take(&mut self.vertical)
            .into_iter()
            .map(|(row, col)| (shift(row), col))
            .collect();
        for merge in &mut self.merges {
            merge.row = shift(merge.row);
        }
        self.row_count += count;
        Ok(())
    }
}

fn toggle(lines: &mut BTreeSet<(u32, u32)>, key: (u32, u32), on: bool) {
    if on {
        lines.insert(key);
    } else {
        lines.remove(&key);
    }
}

fn overlaps(a: &CellRange, b: &CellRange) -> bool {
    a.row <= b.last_row() && b.row <= a.last_row() && a.col <= b.last_col() && b.col <= a.last_col()
}

/// Ordered collection of sheets.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    default_row_count: u32,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Workbook {
            sheets: Vec::new(),
            default_row_count: DEFAULT_ROW_COUNT,
        }
    }

    /// Workbook whose inserted sheets start with `rows` grid rows.
    pub fn with_row_count(rows: u32) -> Self {
        Workbook {
            sheets: Vec::new(),
            default_row_count: rows,
        }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Get or create a sheet.
    pub fn ensure_sheet(&mut self, name: &str) -> &mut Sheet {
        let idx = match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sheets.push(Sheet::new(name, self.default_row_count));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[idx]
    }

    /// Write year/month into the home sheet, creating it with labels if needed.
    pub fn write_home_period(&mut self, home: &str, period: Period) {
        let created = self.sheet(home).is_none();
        let sheet = self.ensure_sheet(home);
        if created {
            sheet.set_value(1, YEAR_CELL.1, HOME_LABELS[0]);
            sheet.set_value(1, MONTH_CELL.1, HOME_LABELS[1]);
        }
        sheet.set_value(YEAR_CELL.0, YEAR_CELL.1, period.year);
        sheet.set_value(MONTH_CELL.0, MONTH_CELL.1, period.month);
    }

    fn existing_mut(&mut self, name: &str) -> Result<&mut Sheet, BackendError> {
        self.sheet_mut(name)
            .ok_or_else(|| BackendError::SheetNotFound(name.to_string()))
    }

    fn existing(&self, name: &str) -> Result<&Sheet, BackendError> {
        self.sheet(name)
            .ok_or_else(|| BackendError::SheetNotFound(name.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, WorkbookError> {
        let doc: WorkbookDocument = serde_json::from_str(raw)?;
        Workbook::try_from(doc)
    }

    pub fn to_json(&self) -> Result<String, WorkbookError> {
        Ok(serde_json::to_string_pretty(&WorkbookDocument::from(self))?)
    }

    pub fn load(path: &Path) -> Result<Self, WorkbookError> {
        let raw = std::fs::read_to_string(path).map_err(|source| WorkbookError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Workbook::from_json(&raw)
    }

    pub fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        std::fs::write(path, self.to_json()?).map_err(|source| WorkbookError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl SheetBackend for Workbook {
    fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    fn cell_value(&self, sheet: &str, row: u32, col: u32) -> Result<CellValue, BackendError> {
        Ok(self.existing(sheet)?.value(row, col))
    }

    fn delete_sheet(&mut self, name: &str) -> Result<(), BackendError> {
        let idx = self
            .sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| BackendError::SheetNotFound(name.to_string()))?;
        self.sheets.remove(idx);
        Ok(())
    }

    fn insert_sheet(&mut self, name: &str) -> Result<(), BackendError> {
        if self.has_sheet(name) {
            return Err(BackendError::SheetExists(name.to_string()));
        }
        self.sheets.push(Sheet::new(name, self.default_row_count));
        Ok(())
    }

    fn apply(&mut self, sheet: &str, directive: &RangeDirective) -> Result<(), BackendError> {
        self.existing_mut(sheet)?.apply(directive)
    }

    fn last_row(&self, sheet: &str) -> Result<u32, BackendError> {
        Ok(self.existing(sheet)?.last_row())
    }

    fn row_count(&self, sheet: &str) -> Result<u32, BackendError> {
        Ok(self.existing(sheet)?.row_count())
    }

    fn insert_rows_after(
        &mut self,
        sheet: &str,
        after: u32,
        count: u32,
    ) -> Result<(), BackendError> {
        self.existing_mut(sheet)?.insert_rows_after(after, count)
    }
}

// JSON document shape. Tuple-keyed maps become flat lists.

#[derive(Debug, Serialize, Deserialize)]
struct WorkbookDocument {
    #[serde(default)]
    sheets: Vec<SheetDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SheetDocument {
    name: String,
    #[serde(default = "default_rows")]
    rows: u32,
    #[serde(default)]
    cells: Vec<CellDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    horizontal_borders: Vec<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    vertical_borders: Vec<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    merges: Vec<CellRange>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CellDocument {
    row: u32,
    col: u32,
    #[serde(flatten)]
    cell: Cell,
}

fn default_rows() -> u32 {
    DEFAULT_ROW_COUNT
}

impl From<&Workbook> for WorkbookDocument {
    fn from(book: &Workbook) -> Self {
        let sheets = book
            .sheets
            .iter()
            .map(|sheet| SheetDocument {
                name: sheet.name.clone(),
                rows: sheet.row_count,
                cells: sheet
                    .cells
                    .iter()
                    .map(|(&(row, col), cell)| CellDocument {
                        row,
                        col,
                        cell: cell.clone(),
                    })
                    .collect(),
                horizontal_borders: sheet.horizontal.iter().map(|&(r, c)| [r, c]).collect(),
                vertical_borders: sheet.vertical.iter().map(|&(r, c)| [r, c]).collect(),
                merges: sheet.merges.clone(),
            })
            .collect();
        WorkbookDocument { sheets }
    }
}

/// Border grid lines keyed by `[row, col]`, both starting at 1.
fn border_lines<T>(keys: Vec<[u32; 2]>, kind: &str, sheet: &str) -> Result<T, WorkbookError>
where
    T: FromIterator<(u32, u32)>,
{
    keys.into_iter()
        .map(|[row, col]| {
            if row == 0 || col == 0 {
                Err(WorkbookError::Invalid(format!(
                    "{kind} border at row {row}, col {col} in {sheet} (rows and columns start at 1)"
                )))
            } else {
                Ok((row, col))
            }
        })
        .collect()
}

impl TryFrom<WorkbookDocument> for Workbook {
    type Error = WorkbookError;

    fn try_from(doc: WorkbookDocument) -> Result<Self, Self::Error> {
        let mut book = Workbook::new();
        for sheet_doc in doc.sheets {
            if book.has_sheet(&sheet_doc.name) {
                return Err(WorkbookError::Invalid(format!(
                    "duplicate sheet name: {}",
                    sheet_doc.name
                )));
            }
            let mut sheet = Sheet::new(sheet_doc.name, sheet_doc.rows);
            for entry in sheet_doc.cells {
                if entry.row == 0 || entry.col == 0 {
                    return Err(WorkbookError::Invalid(format!(
                        "cell at row {}, col {} in {} (rows and columns start at 1)",
                        entry.row, entry.col, sheet.name
                    )));
                }
                sheet.grow_to(entry.row);
                sheet.cells.insert((entry.row, entry.col), entry.cell);
            }
            sheet.horizontal = border_lines(sheet_doc.horizontal_borders, "horizontal", &sheet.name)?;
            sheet.vertical = border_lines(sheet_doc.vertical_borders, "vertical", &sheet.name)?;
            for merge in &sheet_doc.merges {
                merge.validate().map_err(|e| {
                    WorkbookError::Invalid(format!("merge in {}: {}", sheet.name, e))
                })?;
                sheet.grow_to(merge.last_row());
            }
            sheet.merges = sheet_doc.merges;
            book.sheets.push(sheet);
        }
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_lines_are_shared_between_neighbours() {
        let mut sheet = Sheet::new("s", 10);
        sheet
            .apply(&RangeDirective::new(CellRange::new(2, 1, 1, 3)).border(BorderSpec::outline()))
            .unwrap();
        assert!(sheet.borders(1, 2).bottom);
        assert!(sheet.borders(3, 2).top);
        assert!(sheet.borders(2, 4).left);
        assert!(!sheet.borders(2, 2).left);
    }

    #[test]
    fn insert_rows_shifts_content_below() {
        let mut sheet = Sheet::new("s", 5);
        sheet.set_value(2, 1, "keep");
        sheet.set_value(4, 1, "move");
        sheet.insert_rows_after(3, 2).unwrap();
        assert_eq!(sheet.value(2, 1), CellValue::from("keep"));
        assert_eq!(sheet.value(6, 1), CellValue::from("move"));
        assert_eq!(sheet.row_count(), 7);
    }
}
