//! Calendar export of the homework collection.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::CalendarConfig;
use crate::error::{HomeworkError, HomeworkResult};
use crate::homework::Homework;
use crate::ics::generate_ics;
use crate::repository::HomeworkRepository;
use tempfile::NamedTempFile;

/// A finished export: where it was written and what was written there.
#[derive(Debug, Clone)]
pub struct ExportedCalendar {
    pub path: PathBuf,
    pub ics: String,
}

#[derive(Debug, Clone)]
pub struct CalendarProjector {
    repository: HomeworkRepository,
    output_path: PathBuf,
    name: Option<String>,
    timezone: Option<Tz>,
}

impl CalendarProjector {
    pub fn new(repository: HomeworkRepository, output_path: impl Into<PathBuf>) -> Self {
        CalendarProjector {
            repository,
            output_path: output_path.into(),
            name: None,
            timezone: None,
        }
    }

    pub fn from_config(
        config: &CalendarConfig,
        repository: HomeworkRepository,
    ) -> HomeworkResult<Self> {
        let mut projector = Self::new(repository, config.file_path());
        projector.name = config.name.clone();
        projector.timezone = config.timezone()?;
        Ok(projector)
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Render the current collection and write it to the output path,
    /// replacing whatever was there.
    ///
    /// The calendar is written to a temporary file next to the output and
    /// renamed over it, so readers of the output path only ever see a
    /// complete calendar.
    pub fn export(&self) -> HomeworkResult<ExportedCalendar> {
        let homeworks = self
            .repository
            .list()
            .map_err(|e| HomeworkError::Export(format!("could not read homeworks: {}", e)))?;

        let ics = self.render(&homeworks, Utc::now())?;
        self.write_output(&ics)?;

        tracing::info!(
            path = %self.output_path.display(),
            events = homeworks.len(),
            "exported homework calendar"
        );
        Ok(ExportedCalendar {
            path: self.output_path.clone(),
            ics,
        })
    }

    /// Serialize `homeworks` without touching the disk.
    pub fn render(
        &self,
        homeworks: &[Homework],
        dtstamp: DateTime<Utc>,
    ) -> HomeworkResult<String> {
        generate_ics(homeworks, self.name.as_deref(), self.timezone, dtstamp)
    }

    fn write_output(&self, ics: &str) -> HomeworkResult<()> {
        let write_error = |e: std::io::Error| {
            HomeworkError::Export(format!(
                "failed to write {}: {}",
                self.output_path.display(),
                e
            ))
        };

        let dir = match self.output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
        tmp.write_all(ics.as_bytes()).map_err(write_error)?;
        tmp.persist(&self.output_path).map_err(|e| write_error(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homework::HomeworkFields;
    use chrono::TimeZone;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn math(uid: u128) -> Homework {
        Homework::new(
            uid,
            HomeworkFields {
                subject: "Math".to_string(),
                due_date: "2024-05-01".to_string(),
                due_time: "10:00".to_string(),
                priority: 2,
                description: "Ch.5".to_string(),
            },
        )
    }

    fn setup() -> (TempDir, HomeworkRepository, CalendarProjector) {
        let dir = tempfile::tempdir().unwrap();
        let repo = HomeworkRepository::new(dir.path().join("homeworks.json"));
        repo.init().unwrap();
        let projector = CalendarProjector::new(repo.clone(), dir.path().join("homeworks.ics"));
        (dir, repo, projector)
    }

    fn without_dtstamp(ics: &str) -> String {
        ics.lines()
            .filter(|l| !l.starts_with("DTSTAMP:"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn export_writes_calendar_and_returns_path() {
        let (dir, repo, projector) = setup();
        repo.add(math(1)).unwrap();

        let exported = projector.export().unwrap();

        assert_eq!(exported.path, dir.path().join("homeworks.ics"));
        let ics = fs::read_to_string(&exported.path).unwrap();
        assert_eq!(ics, exported.ics);
        assert!(ics.contains("SUMMARY:Math"));
        assert!(ics.contains("DTSTART:20240501T100000Z"));
        assert!(ics.contains("DTEND:20240501T113000Z"));
    }

    #[test]
    fn export_overwrites_previous_output() {
        let (_dir, repo, projector) = setup();
        fs::write(projector.output_path(), "stale content that is rather long").unwrap();
        repo.add(math(1)).unwrap();

        projector.export().unwrap();
        repo.remove(1).unwrap();
        projector.export().unwrap();

        let ics = fs::read_to_string(projector.output_path()).unwrap();
        assert!(!ics.contains("stale"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }

    #[test]
    fn export_twice_is_identical_apart_from_dtstamp() {
        let (_dir, repo, projector) = setup();
        repo.add(math(1)).unwrap();
        repo.add(math(2)).unwrap();

        projector.export().unwrap();
        let first = fs::read_to_string(projector.output_path()).unwrap();
        projector.export().unwrap();
        let second = fs::read_to_string(projector.output_path()).unwrap();

        assert_eq!(without_dtstamp(&first), without_dtstamp(&second));
    }

    #[test]
    fn render_is_deterministic_for_fixed_stamp() {
        let (_dir, _repo, projector) = setup();
        let stamp = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let homeworks = vec![math(1), math(2)];

        assert_eq!(
            projector.render(&homeworks, stamp).unwrap(),
            projector.render(&homeworks, stamp).unwrap()
        );
    }

    #[test]
    fn missing_database_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = HomeworkRepository::new(dir.path().join("absent.json"));
        let projector = CalendarProjector::new(repo, dir.path().join("out.ics"));

        assert!(matches!(projector.export(), Err(HomeworkError::Export(_))));
        assert!(!dir.path().join("out.ics").exists());
    }

    #[test]
    fn invalid_record_aborts_export() {
        let (_dir, repo, projector) = setup();
        let mut bad = math(3);
        bad.due_date = "tomorrow".to_string();
        repo.add(math(1)).unwrap();
        repo.add(bad).unwrap();

        let err = projector.export().unwrap_err();

        assert!(matches!(err, HomeworkError::Export(_)));
        assert!(err.to_string().contains("tomorrow"));
    }

    #[test]
    fn unwritable_output_is_export_error() {
        let (dir, repo, _) = setup();
        let projector = CalendarProjector::new(repo, dir.path().join("missing-dir/out.ics"));

        assert!(matches!(projector.export(), Err(HomeworkError::Export(_))));
    }

    #[test]
    fn readers_never_see_a_partial_calendar() {
        let (_dir, repo, projector) = setup();
        for uid in 0..200 {
            repo.add(math(uid)).unwrap();
        }
        projector.export().unwrap();

        let projector = Arc::new(projector);
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let projector = Arc::clone(&projector);
                thread::spawn(move || {
                    for _ in 0..10 {
                        projector.export().unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            let ics = fs::read_to_string(projector.output_path()).unwrap();
            assert_eq!(ics.matches("BEGIN:VEVENT").count(), 200);
            assert!(ics.ends_with("END:VCALENDAR\r\n"));
        }

        for writer in writers {
            writer.join().unwrap();
        }
    }

    #[test]
    fn from_config_carries_name_and_timezone() {
        let (dir, repo, _) = setup();
        let config = CalendarConfig {
            db_path: dir.path().join("homeworks.json").display().to_string(),
            file_path: dir.path().join("out.ics").display().to_string(),
            name: Some("School".to_string()),
            timezone: Some("America/New_York".to_string()),
        };
        repo.add(math(1)).unwrap();

        let projector = CalendarProjector::from_config(&config, repo).unwrap();
        projector.export().unwrap();

        let ics = fs::read_to_string(dir.path().join("out.ics")).unwrap();
        assert!(ics.contains("X-WR-CALNAME:School"));
        assert!(ics.contains("DTSTART;TZID=America/New_York:20240501T100000"));
    }
}
