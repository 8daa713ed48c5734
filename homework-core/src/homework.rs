//! The stored homework record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One assignment as stored in the homework database.
///
/// `due_date` and `due_time` are kept verbatim; they are only parsed when the
/// record is projected onto a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Homework {
    pub uid: u128,
    pub subject: String,
    pub due_date: String,
    pub due_time: String,
    pub priority: i64,
    pub description: String,
}

/// The mutable part of a homework record (everything but the uid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeworkFields {
    pub subject: String,
    pub due_date: String,
    pub due_time: String,
    pub priority: i64,
    pub description: String,
}

impl Homework {
    pub fn new(uid: u128, fields: HomeworkFields) -> Self {
        Homework {
            uid,
            subject: fields.subject,
            due_date: fields.due_date,
            due_time: fields.due_time,
            priority: fields.priority,
            description: fields.description,
        }
    }

    /// Create a record with a freshly generated uid.
    pub fn with_generated_uid(fields: HomeworkFields) -> Self {
        Self::new(generate_uid(), fields)
    }

    /// Overwrite every field except the uid.
    pub fn apply(&mut self, fields: &HomeworkFields) {
        self.subject = fields.subject.clone();
        self.due_date = fields.due_date.clone();
        self.due_time = fields.due_time.clone();
        self.priority = fields.priority;
        self.description = fields.description.clone();
    }

    pub fn fields(&self) -> HomeworkFields {
        HomeworkFields {
            subject: self.subject.clone(),
            due_date: self.due_date.clone(),
            due_time: self.due_time.clone(),
            priority: self.priority,
            description: self.description.clone(),
        }
    }
}

impl fmt::Display for Homework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UID: {}\nSubject: {}\nDue Date: {}\nDue Time: {}\nPriority: {}\nDescription: {}",
            self.uid, self.subject, self.due_date, self.due_time, self.priority, self.description
        )
    }
}

/// A random 128-bit identifier taken from a v4 UUID.
pub fn generate_uid() -> u128 {
    uuid::Uuid::new_v4().as_u128()
}
