//! Homework CRUD endpoints
//!
//! Parameters come from the query string, e.g.
//! `POST /add?name=Math&due_date=2024-05-01&due_time=10:00&priority=2&description=Ch.5`.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use homework_core::{Homework, HomeworkFields};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", get(list))
        .route("/add", post(add))
        .route("/remove", post(remove))
        .route("/update", post(update))
}

/// Fields of a homework as sent by clients (`name` is the subject)
#[derive(Deserialize)]
pub struct HomeworkParams {
    pub name: String,
    pub due_date: String,
    pub due_time: String,
    pub priority: i64,
    pub description: String,
}

impl From<HomeworkParams> for HomeworkFields {
    fn from(params: HomeworkParams) -> Self {
        HomeworkFields {
            subject: params.name,
            due_date: params.due_date,
            due_time: params.due_time,
            priority: params.priority,
            description: params.description,
        }
    }
}

/// Uids are 128-bit, which the query-string decoder cannot handle directly
#[derive(Deserialize)]
pub struct UidParams {
    pub uid: String,
}

impl UidParams {
    fn parse(&self) -> Result<u128, AppError> {
        self.uid
            .trim()
            .parse()
            .map_err(|_| AppError::bad_request(format!("Invalid uid: {}", self.uid)))
    }
}

#[derive(Serialize, Deserialize)]
pub struct AddResponse {
    pub message: String,
    pub uid: u128,
}

/// Response to remove/update; `affected` is zero when no homework matched.
#[derive(Serialize, Deserialize)]
pub struct ChangeResponse {
    pub message: String,
    pub affected: usize,
}

/// GET /list - Every stored homework, in insertion order
async fn list(State(state): State<AppState>) -> Result<Json<Vec<Homework>>, AppError> {
    Ok(Json(state.repository().list()?))
}

/// POST /add - Store a new homework under a fresh uid
async fn add(
    State(state): State<AppState>,
    Query(params): Query<HomeworkParams>,
) -> Result<Json<AddResponse>, AppError> {
    let homework = Homework::with_generated_uid(params.into());
    let uid = homework.uid;

    state.repository().add(homework)?;

    Ok(Json(AddResponse {
        message: "Homework added successfully".to_string(),
        uid,
    }))
}

/// POST /remove - Remove every homework with the given uid
async fn remove(
    State(state): State<AppState>,
    Query(params): Query<UidParams>,
) -> Result<Json<ChangeResponse>, AppError> {
    let uid = params.parse()?;
    let affected = state.repository().remove(uid)?;

    Ok(Json(ChangeResponse {
        message: "Homework removed successfully".to_string(),
        affected,
    }))
}

/// Query strings are decoded flat, so the uid is repeated here rather than
/// flattening `UidParams` and `HomeworkParams` together.
#[derive(Deserialize)]
pub struct UpdateParams {
    pub uid: String,
    pub name: String,
    pub due_date: String,
    pub due_time: String,
    pub priority: i64,
    pub description: String,
}

impl UpdateParams {
    fn split(self) -> (UidParams, HomeworkParams) {
        (
            UidParams { uid: self.uid },
            HomeworkParams {
                name: self.name,
                due_date: self.due_date,
                due_time: self.due_time,
                priority: self.priority,
                description: self.description,
            },
        )
    }
}

/// POST /update - Overwrite every homework with the given uid
async fn update(
    State(state): State<AppState>,
    Query(params): Query<UpdateParams>,
) -> Result<Json<ChangeResponse>, AppError> {
    let (uid, fields) = params.split();
    let uid = uid.parse()?;
    let affected = state.repository().update(uid, &HomeworkFields::from(fields))?;

    Ok(Json(ChangeResponse {
        message: "Homework updated successfully".to_string(),
        affected,
    }))
}
