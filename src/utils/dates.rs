use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::error::Error;

const INVALID_DATE: &str = "Invalid date format. Use DD-MM-YYYY";

/// Parse a client supplied `DD-MM-YYYY` date.
///
/// Fails unless the input has exactly three dash-separated numeric parts
/// naming a real calendar day.
pub fn parse_event_date(date: &str) -> Result<NaiveDate, Error> {
    let parts: Vec<&str> = date.trim().split('-').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(Error::Validation(INVALID_DATE.to_string()));
    };

    let number = |part: &str| -> Result<u32, Error> {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::Validation(INVALID_DATE.to_string()));
        }
        part.parse()
            .map_err(|_| Error::Validation(INVALID_DATE.to_string()))
    };

    let year = i32::try_from(number(*year)?)
        .map_err(|_| Error::Validation(INVALID_DATE.to_string()))?;

    NaiveDate::from_ymd_opt(year, number(*month)?, number(*day)?)
        .ok_or_else(|| Error::Validation(INVALID_DATE.to_string()))
}

/// Local wall clock used for creation, scan and completion stamps
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    offset: FixedOffset,
}

impl WallClock {
    pub fn new(utc_offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}
