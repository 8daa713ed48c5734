use std::sync::Arc;

use homework_core::{CalendarProjector, Config, HomeworkRepository, HomeworkResult};

/// Shared application state, built once in `main` and handed to every handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    repository: HomeworkRepository,
    projector: CalendarProjector,
}

impl AppState {
    pub fn new(config: Config) -> HomeworkResult<Self> {
        let repository = HomeworkRepository::from_config(&config.calendar);
        let projector = CalendarProjector::from_config(&config.calendar, repository.clone())?;

        // Verify the database can be read at startup
        repository.list()?;

        Ok(AppState {
            config: Arc::new(config),
            repository,
            projector,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &HomeworkRepository {
        &self.repository
    }

    pub fn projector(&self) -> &CalendarProjector {
        &self.projector
    }
}
