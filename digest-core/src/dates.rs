use crate::error::CoreError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One local calendar day expressed as a UTC interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionWindow {
    /// `YYYY-MM-DD` of the local day.
    pub date: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CollectionWindow {
    pub fn start_timestamp(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_timestamp(&self) -> i64 {
        self.end.timestamp()
    }

    pub fn start_time_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }

    pub fn end_time_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }

    pub fn contains(&self, created_utc: i64) -> bool {
        self.start_timestamp() <= created_utc && created_utc <= self.end_timestamp()
    }
}

/// The local day before `now` in `tz`.
pub fn previous_day_window(now: DateTime<Utc>, tz: Tz) -> Result<CollectionWindow, CoreError> {
    let today = now.with_timezone(&tz).date_naive();
    let yesterday = today
        .pred_opt()
        .ok_or_else(|| CoreError::invalid_input(format!("no day before {today}")))?;
    day_window(yesterday, tz)
}

/// From 00:00:00 to 23:59:59.999999 local time on `date`.
pub fn day_window(date: NaiveDate, tz: Tz) -> Result<CollectionWindow, CoreError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .and_then(|local| tz.from_local_datetime(&local).earliest())
        .ok_or_else(|| CoreError::invalid_input(format!("no local midnight on {date} in {tz}")))?;
    let next_midnight = date
        .succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .and_then(|local| tz.from_local_datetime(&local).earliest())
        .ok_or_else(|| CoreError::invalid_input(format!("no local day after {date} in {tz}")))?;

    Ok(CollectionWindow {
        date: date.format(DATE_KEY_FORMAT).to_string(),
        start: midnight.with_timezone(&Utc),
        end: (next_midnight - Duration::microseconds(1)).with_timezone(&Utc),
    })
}

pub fn parse_date_key(date: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(date, DATE_KEY_FORMAT)
        .map_err(|_| CoreError::invalid_input(format!("'{date}' is not a YYYY-MM-DD date")))
}

/// `2024-05-01` becomes `01-05-2024`. Anything unparseable is returned as is.
pub fn format_date_for_digest(date: &str) -> String {
    match NaiveDate::parse_from_str(date, DATE_KEY_FORMAT) {
        Ok(parsed) => parsed.format("%d-%m-%Y").to_string(),
        Err(_) => date.to_string(),
    }
}

/// `2024-05-01` becomes `1 May 2024`.
pub fn format_long_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, DATE_KEY_FORMAT) {
        Ok(parsed) => format!(
            "{} {} {}",
            parsed.day(),
            MONTH_NAMES[parsed.month0() as usize],
            parsed.year()
        ),
        Err(_) => date.to_string(),
    }
}
