//! ICS file generation.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, Property};

use crate::error::{HomeworkError, HomeworkResult};
use crate::homework::Homework;

/// Every homework event lasts this long, starting at the due time.
pub const EVENT_DURATION_MINUTES: i64 = 90;

const PRODID: &str = "PRODID:-//homework//homework calendar//EN";

const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Generate a calendar with one event per homework, in the given order.
///
/// `dtstamp` is written on every event; it is the only input that is not
/// taken from the homeworks, so a fixed stamp gives byte-identical output.
pub fn generate_ics(
    homeworks: &[Homework],
    name: Option<&str>,
    timezone: Option<Tz>,
    dtstamp: DateTime<Utc>,
) -> HomeworkResult<String> {
    let mut cal = Calendar::new();

    // X-WR-CALNAME - Human-readable calendar name (de facto standard)
    if let Some(name) = name {
        cal.append_property(Property::new("X-WR-CALNAME", name));
    }
    if let Some(tz) = timezone {
        cal.append_property(Property::new("X-WR-TIMEZONE", tz.name()));
    }

    let dtstamp = dtstamp.format("%Y%m%dT%H%M%SZ").to_string();

    for homework in homeworks {
        tracing::debug!("exporting homework\n{}", homework);
        cal.push(homework_event(homework, timezone, &dtstamp)?);
    }

    let cal = cal.done();
    Ok(strip_ics_bloat(&cal.to_string()))
}

/// Combine `due_date` and `due_time` into the moment the homework is due.
pub fn due_datetime(homework: &Homework) -> HomeworkResult<NaiveDateTime> {
    let invalid = || {
        HomeworkError::Export(format!(
            "homework {} has an invalid due date/time '{} {}'",
            homework.uid, homework.due_date, homework.due_time
        ))
    };

    let date = NaiveDate::parse_from_str(homework.due_date.trim(), "%Y-%m-%d")
        .map_err(|_| invalid())?;
    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(homework.due_time.trim(), fmt).ok())
        .ok_or_else(invalid)?;

    Ok(date.and_time(time))
}

fn homework_event(
    homework: &Homework,
    timezone: Option<Tz>,
    dtstamp: &str,
) -> HomeworkResult<icalendar::Event> {
    let start = due_datetime(homework)?;
    let end = start + Duration::minutes(EVENT_DURATION_MINUTES);

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&homework.uid.to_string());
    ics_event.summary(&homework.subject);
    ics_event.add_property("DTSTAMP", dtstamp);

    add_datetime_property(&mut ics_event, "DTSTART", start, timezone);
    add_datetime_property(&mut ics_event, "DTEND", end, timezone);

    ics_event.description(&format!(
        "Priority: {}\nDescription: {}",
        homework.priority, homework.description
    ));

    Ok(ics_event.done())
}

/// Due times are UTC unless a zone is configured, in which case they are
/// local times tagged with TZID.
fn add_datetime_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    datetime: NaiveDateTime,
    timezone: Option<Tz>,
) {
    match timezone {
        None => {
            ics_event.add_property(name, datetime.format("%Y%m%dT%H%M%SZ").to_string());
        }
        Some(tz) => {
            let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tz.name());
            ics_event.append_property(prop);
        }
    }
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our own
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
