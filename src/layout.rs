//! Sheet layout: turns a month and its bucketed events into range directives.
//!
//! ```text
//! row 1   | 4月  | <calendar> 診療予定 |
//! row 2   | 月 |   | 火 |   | 水 |   | 木 |   | 金 |   |
//! row 3   |    |   |    |   |  1 |   |  2 |   |  3 |   |   <- day row
//! row 4.. | events, two per row under each day, at least 5 rows |
//! ...
//! lastRow+1 | 検査予定 (merged, 7-row bordered block) |
//! ```
//!
//! Everything here is pure; the exporter applies the directives to a backend.

use tracing::debug;

use crate::sheet::{BorderSpec, CellRange, CellValue, HorizontalAlign, RangeDirective};
use crate::types::{
    BODY_FONT_SIZE, CALENDAR_START_ROW, COLUMNS_PER_DAY, DAY_ROW_COLOR, DayBucket, EVENTS_PER_ROW,
    FOOTER_COLOR, FOOTER_LABEL, FOOTER_ROWS, MAX_COL_SIZE, MIN_EVENT_ROWS, MONTH_SUFFIX, Period,
    TEXT_FORMAT, TITLE_FONT_SIZE, TITLE_ROW, TITLE_SUFFIX, WEEKDAY_FONT_SIZE, WEEKDAY_HEADER_ROW,
    WEEKDAY_LABELS, WeekRow,
};

/// Content directives for one sheet plus the geometry the finishing pass needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub directives: Vec<RangeDirective>,
    /// Rows holding day numbers, ascending.
    pub day_rows: Vec<u32>,
    pub events_placed: usize,
}

impl SheetPlan {
    /// Grid rows the sheet must have once content is written.
    pub fn min_rows(&self) -> u32 {
        self.day_rows
            .last()
            .copied()
            .unwrap_or(WEEKDAY_HEADER_ROW)
            + MIN_EVENT_ROWS
    }
}

/// Destination sheet name: `<calendar>【<month>月】`.
pub fn sheet_name(calendar: &str, month: u32) -> String {
    format!("{}【{}{}】", calendar, month, MONTH_SUFFIX)
}

/// Cell of the `index`-th event of a day whose events start at
/// (`events_row`, `col`): two per row, wrapping downwards.
pub fn event_cell(events_row: u32, col: u32, index: usize) -> (u32, u32) {
    (
        events_row + (index / EVENTS_PER_ROW) as u32,
        col + (index % EVENTS_PER_ROW) as u32,
    )
}

/// Event rows reserved under a day row for the busiest day of the week.
pub fn reserved_event_rows(max_events: usize) -> u32 {
    (max_events.div_ceil(EVENTS_PER_ROW) as u32).max(MIN_EVENT_ROWS)
}

/// Title (row 1) and weekday labels (row 2).
pub fn header_directives(calendar: &str, period: Period) -> Vec<RangeDirective> {
    let mut directives = vec![
        RangeDirective::new(CellRange::cell(TITLE_ROW, 1))
            .value(format!("{}{} ", period.month, MONTH_SUFFIX))
            .font_size(TITLE_FONT_SIZE)
            .bold(),
        RangeDirective::new(CellRange::cell(TITLE_ROW, 2))
            .value(format!("{} {}", calendar, TITLE_SUFFIX))
            .font_size(TITLE_FONT_SIZE)
            .bold(),
    ];

    for (i, label) in WEEKDAY_LABELS.iter().enumerate() {
        let col = i as u32 * COLUMNS_PER_DAY + 1;
        directives.push(
            RangeDirective::new(CellRange::cell(WEEKDAY_HEADER_ROW, col))
                .value(*label)
                .font_size(WEEKDAY_FONT_SIZE)
                .bold()
                .align(HorizontalAlign::Right),
        );
    }

    directives
}

/// Day numbers of a week row: number + spacer per slot, blanks before day 1.
fn day_row_values(week: &WeekRow) -> Vec<CellValue> {
    let mut values = Vec::with_capacity(week.width() as usize);
    for _ in 0..week.leading_blanks {
        values.push(CellValue::Empty);
        values.push(CellValue::Empty);
    }
    for &day in &week.days {
        values.push(CellValue::from(day));
        values.push(CellValue::Empty);
    }
    values
}

/// Plan the header and every week block of a month.
pub fn plan_sheet(calendar: &str, period: Period, buckets: &DayBucket) -> SheetPlan {
    let mut directives = header_directives(calendar, period);
    let mut day_rows = Vec::new();
    let mut events_placed = 0;
    let mut row = CALENDAR_START_ROW;

    for week in period.week_rows() {
        directives.push(
            RangeDirective::new(CellRange::new(row, 1, 1, week.width()))
                .values(vec![day_row_values(&week)])
                .bold()
                .font_size(BODY_FONT_SIZE),
        );
        day_rows.push(row);
        row += 1;

        let events_row = row;
        let mut max_events = 0;
        for (col, day) in week.columns() {
            let events = buckets.events(day);
            for (index, title) in events.iter().enumerate() {
                let (target_row, target_col) = event_cell(events_row, col, index);
                directives.push(
                    RangeDirective::new(CellRange::cell(target_row, target_col))
                        .value(title.as_str())
                        .font_size(BODY_FONT_SIZE)
                        .number_format(TEXT_FORMAT),
                );
            }
            events_placed += events.len();
            max_events = max_events.max(events.len());
        }

        let reserved = reserved_event_rows(max_events);
        debug!(
            day_row = events_row - 1,
            days = ?week.days,
            reserved,
            "planned week"
        );
        row += reserved;
    }

    SheetPlan {
        directives,
        day_rows,
        events_placed,
    }
}

/// Week separators, day-column separators, then the outer box.
///
/// The box goes last so the partial borders cannot clear its edges.
pub fn border_directives(day_rows: &[u32], last_row: u32) -> Vec<RangeDirective> {
    let mut directives = Vec::new();
    let height = last_row.saturating_sub(WEEKDAY_HEADER_ROW) + 1;

    for &row in day_rows {
        directives.push(
            RangeDirective::new(CellRange::new(row, 1, 1, MAX_COL_SIZE)).border(BorderSpec::new(
                Some(true),
                Some(false),
                Some(true),
                Some(false),
            )),
        );
    }

    // Left edge of every day pair but Monday's
    for col in (1 + COLUMNS_PER_DAY..=MAX_COL_SIZE).step_by(COLUMNS_PER_DAY as usize) {
        directives.push(
            RangeDirective::new(CellRange::new(WEEKDAY_HEADER_ROW, col, height, 1)).border(
                BorderSpec::new(Some(false), Some(true), Some(false), Some(false)),
            ),
        );
    }

    directives.push(
        RangeDirective::new(CellRange::new(WEEKDAY_HEADER_ROW, 1, height, MAX_COL_SIZE))
            .border(BorderSpec::outline()),
    );

    directives
}

pub fn day_row_shading(day_rows: &[u32]) -> Vec<RangeDirective> {
    day_rows
        .iter()
        .map(|&row| {
            RangeDirective::new(CellRange::new(row, 1, 1, MAX_COL_SIZE)).background(DAY_ROW_COLOR)
        })
        .collect()
}

/// Merged label row and the bordered block below the grid.
pub fn footer_directives(last_row: u32) -> Vec<RangeDirective> {
    vec![
        RangeDirective::new(CellRange::new(last_row + 1, 1, 1, MAX_COL_SIZE))
            .merged()
            .value(FOOTER_LABEL)
            .border(BorderSpec::outline())
            .background(FOOTER_COLOR)
            .font_size(BODY_FONT_SIZE)
            .align(HorizontalAlign::Center),
        RangeDirective::new(CellRange::new(last_row + 1, 1, FOOTER_ROWS, MAX_COL_SIZE))
            .border(BorderSpec::outline()),
    ]
}

/// Borders, shading and footer, in the order they must be applied.
pub fn finishing_directives(day_rows: &[u32], last_row: u32) -> Vec<RangeDirective> {
    let mut directives = border_directives(day_rows, last_row);
    directives.extend(day_row_shading(day_rows));
    directives.extend(footer_directives(last_row));
    directives
}
