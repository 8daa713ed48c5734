//! ICS generation for homework calendars.
//!
//! This module turns homework records into RFC 5545 text.

mod generate;

pub use generate::{EVENT_DURATION_MINUTES, due_datetime, generate_ics};
