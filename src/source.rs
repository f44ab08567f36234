//! Calendar sources: the interface the exporter reads events through, an
//! in-memory implementation, and one backed by iCalendar files.

use chrono::NaiveDate;

use crate::error::SourceError;
use crate::types::{CalendarInfo, Event};

pub trait CalendarSource {
    /// All calendars, in listing order.
    fn calendars(&self) -> Result<Vec<CalendarInfo>, SourceError>;

    /// Events of `calendar` starting on any day in `start..=end`, in source
    /// order.
    fn events(
        &self,
        calendar: &CalendarInfo,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Event>, SourceError>;
}

fn in_range(event: &Event, start: NaiveDate, end: NaiveDate) -> bool {
    (start..=end).contains(&event.start.date())
}

/// Calendars held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCalendarSource {
    calendars: Vec<(CalendarInfo, Vec<Event>)>,
}

impl MemoryCalendarSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(mut self, name: &str, events: Vec<Event>) -> Self {
        self.add_calendar(name, events);
        self
    }

    pub fn add_calendar(&mut self, name: &str, events: Vec<Event>) {
        self.calendars.push((CalendarInfo::new(name), events));
    }
}

impl CalendarSource for MemoryCalendarSource {
    fn calendars(&self) -> Result<Vec<CalendarInfo>, SourceError> {
        Ok(self.calendars.iter().map(|(info, _)| info.clone()).collect())
    }

    fn events(
        &self,
        calendar: &CalendarInfo,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Event>, SourceError> {
        let (_, events) = self
            .calendars
            .iter()
            .find(|(info, _)| info == calendar)
            .ok_or_else(|| SourceError::CalendarNotFound(calendar.name.clone()))?;
        Ok(events
            .iter()
            .filter(|e| in_range(e, start, end))
            .cloned()
            .collect())
    }
}

#[cfg(feature = "ics")]
pub use ics::IcsCalendarSource;

#[cfg(feature = "ics")]
mod ics {
    use chrono::{FixedOffset, NaiveDate};
    use ics_source::IcsCalendar;
    use tracing::info;

    use super::CalendarSource;
    use crate::error::SourceError;
    use crate::types::{CalendarInfo, Event};

    /// Calendars loaded from `.ics` files, directories or http(s) URLs.
    #[derive(Debug, Clone)]
    pub struct IcsCalendarSource {
        calendars: Vec<IcsCalendar>,
        utc_offset: FixedOffset,
    }

    impl IcsCalendarSource {
        pub fn new(calendars: Vec<IcsCalendar>, utc_offset: FixedOffset) -> Self {
            IcsCalendarSource {
                calendars,
                utc_offset,
            }
        }

        /// Load every input; each may hold several calendars (directories).
        pub fn load(inputs: &[String], utc_offset: FixedOffset) -> Result<Self, SourceError> {
            let mut calendars = Vec::new();
            for input in inputs {
                let loaded = ics_source::load(input)?;
                info!(input = %input, calendars = loaded.len(), "loaded calendar input");
                calendars.extend(loaded);
            }
            Ok(IcsCalendarSource::new(calendars, utc_offset))
        }
    }

    impl CalendarSource for IcsCalendarSource {
        fn calendars(&self) -> Result<Vec<CalendarInfo>, SourceError> {
            Ok(self
                .calendars
                .iter()
                .map(|c| CalendarInfo::new(c.name.as_str()))
                .collect())
        }

        fn events(
            &self,
            calendar: &CalendarInfo,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<Event>, SourceError> {
            let ics = self
                .calendars
                .iter()
                .find(|c| c.name == calendar.name)
                .ok_or_else(|| SourceError::CalendarNotFound(calendar.name.clone()))?;
            // Occurrences of one event stay together; days keep file order
            let mut events = Vec::new();
            for event in &ics.events {
                for occurrence in event.occurrences(self.utc_offset, start, end)? {
                    events.push(Event {
                        start: occurrence,
                        title: event.summary.clone(),
                    });
                }
            }
            Ok(events)
        }
    }
}
