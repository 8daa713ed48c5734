//! Core types for the homework calendar.
//!
//! This crate is shared by the `homework` CLI and the HTTP server:
//! - `Homework` and `HomeworkFields`, the stored record
//! - `HomeworkRepository`, the JSON file store
//! - `CalendarProjector`, the iCalendar export
//! - `Config`, loaded once at startup

pub mod config;
pub mod error;
pub mod homework;
pub mod ics;
pub mod projector;
pub mod repository;

pub use crate::config::{CalendarConfig, Config, ServerConfig};
pub use error::{HomeworkError, HomeworkResult};
pub use homework::{Homework, HomeworkFields};
pub use projector::{CalendarProjector, ExportedCalendar};
pub use repository::HomeworkRepository;
