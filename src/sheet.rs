//! Spreadsheet backend interface and the style directives written through it.
//!
//! A [`RangeDirective`] bundles what one chained range mutation would do in a
//! hosted spreadsheet (value, font, alignment, fill, number format, border,
//! merge) so the layout can be computed without touching a backend.

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Cell content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// No visible content.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Blank or numeric zero: what a spreadsheet formula treats as unset.
    pub fn is_falsy(&self) -> bool {
        match self {
            CellValue::Number(n) => *n == 0.0,
            other => other.is_blank(),
        }
    }

    /// Display text (numbers without a trailing `.0` when integral).
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Rectangular range, 1-based like spreadsheet `getRange(row, col, rows, cols)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub row: u32,
    pub col: u32,
    pub rows: u32,
    pub cols: u32,
}

impl CellRange {
    pub fn new(row: u32, col: u32, rows: u32, cols: u32) -> Self {
        CellRange {
            row,
            col,
            rows,
            cols,
        }
    }

    pub fn cell(row: u32, col: u32) -> Self {
        CellRange::new(row, col, 1, 1)
    }

    pub fn last_row(&self) -> u32 {
        self.row + self.rows - 1
    }

    pub fn last_col(&self) -> u32 {
        self.col + self.cols - 1
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.row..=self.last_row()).contains(&row) && (self.col..=self.last_col()).contains(&col)
    }

    pub fn validate(&self) -> Result<(), BackendError> {
        if self.row == 0 || self.col == 0 || self.rows == 0 || self.cols == 0 {
            return Err(BackendError::InvalidRange(format!(
                "row {}, col {}, {}x{} (rows and columns start at 1, size must be positive)",
                self.row, self.col, self.rows, self.cols
            )));
        }
        if self.row.checked_add(self.rows).is_none() || self.col.checked_add(self.cols).is_none() {
            return Err(BackendError::InvalidRange(format!(
                "row {}, col {}, {}x{} runs past the largest index",
                self.row, self.col, self.rows, self.cols
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

/// Outline border of a range.
///
/// `Some(true)` draws the edge, `Some(false)` clears it, `None` leaves it as
/// is. Only the range's outer edges are affected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorderSpec {
    pub top: Option<bool>,
    pub left: Option<bool>,
    pub bottom: Option<bool>,
    pub right: Option<bool>,
}

impl BorderSpec {
    pub fn new(top: Option<bool>, left: Option<bool>, bottom: Option<bool>, right: Option<bool>) -> Self {
        BorderSpec {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Box around the whole range.
    pub fn outline() -> Self {
        BorderSpec::new(Some(true), Some(true), Some(true), Some(true))
    }
}

/// Per-cell style. `None` fields leave the existing property untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<HorizontalAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl CellStyle {
    pub fn is_empty(&self) -> bool {
        *self == CellStyle::default()
    }

    /// Overlay `other` onto `self`; `other`'s set fields win.
    pub fn merge(&self, other: &CellStyle) -> CellStyle {
        CellStyle {
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.or(self.align),
            background: other.background.clone().or_else(|| self.background.clone()),
            number_format: other
                .number_format
                .clone()
                .or_else(|| self.number_format.clone()),
        }
    }
}

/// Values written by a directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    /// One value per cell; dimensions must match the range.
    Grid(Vec<Vec<CellValue>>),
    /// Same value in every cell, or only the top-left one of a merged range.
    Single(CellValue),
}

/// One batched write against a range.
///
/// Backends apply the parts in the order merge, values, style, border.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeDirective {
    pub range: CellRange,
    pub fill: Option<Fill>,
    pub style: CellStyle,
    pub border: Option<BorderSpec>,
    pub merge: bool,
}

impl RangeDirective {
    pub fn new(range: CellRange) -> Self {
        RangeDirective {
            range,
            fill: None,
            style: CellStyle::default(),
            border: None,
            merge: false,
        }
    }

    pub fn value(mut self, value: impl Into<CellValue>) -> Self {
        self.fill = Some(Fill::Single(value.into()));
        self
    }

    pub fn values(mut self, values: Vec<Vec<CellValue>>) -> Self {
        self.fill = Some(Fill::Grid(values));
        self
    }

    pub fn font_size(mut self, size: u32) -> Self {
        self.style.font_size = Some(size);
        self
    }

    pub fn bold(mut self) -> Self {
        self.style.bold = Some(true);
        self
    }

    pub fn align(mut self, align: HorizontalAlign) -> Self {
        self.style.align = Some(align);
        self
    }

    pub fn background(mut self, color: &str) -> Self {
        self.style.background = Some(color.to_string());
        self
    }

    pub fn number_format(mut self, format: &str) -> Self {
        self.style.number_format = Some(format.to_string());
        self
    }

    pub fn border(mut self, border: BorderSpec) -> Self {
        self.border = Some(border);
        self
    }

    pub fn merged(mut self) -> Self {
        self.merge = true;
        self
    }
}

/// Spreadsheet document the exporter writes into.
///
/// Writing past the current grid extends it; `row_count` reports the grid
/// size, `last_row` the last row holding a value.
pub trait SheetBackend {
    fn has_sheet(&self, name: &str) -> bool;

    fn cell_value(&self, sheet: &str, row: u32, col: u32) -> Result<CellValue, BackendError>;

    fn delete_sheet(&mut self, name: &str) -> Result<(), BackendError>;

    fn insert_sheet(&mut self, name: &str) -> Result<(), BackendError>;

    fn apply(&mut self, sheet: &str, directive: &RangeDirective) -> Result<(), BackendError>;

    fn last_row(&self, sheet: &str) -> Result<u32, BackendError>;

    fn row_count(&self, sheet: &str) -> Result<u32, BackendError>;

    fn insert_rows_after(&mut self, sheet: &str, after: u32, count: u32)
    -> Result<(), BackendError>;
}
