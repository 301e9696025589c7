use serde::{Deserialize, Serialize};

use crate::domain::{AttemptStatus, SolveRecord, SolverEntry, Task};

/// `GET /chals`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub game: Vec<Task>,
}

/// `GET /solves`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolvesResponse {
    pub solves: Vec<SolveRecord>,
}

/// `GET /chal/{id}/solves`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolversResponse {
    pub teams: Vec<SolverEntry>,
}

/// Form body of `POST /chal/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitForm {
    pub nonce: String,
    pub key: String,
}

pub const STATUS_INCORRECT: i64 = 0;
pub const STATUS_CORRECT: i64 = 1;

/// Response of `POST /chal/{id}`. The service documents 0 and 1; anything
/// else is kept raw so the caller can log it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: i64,
    pub message: String,
}

impl SubmitResponse {
    pub fn attempt_status(&self) -> AttemptStatus {
        if self.status == STATUS_CORRECT {
            AttemptStatus::Correct
        } else {
            AttemptStatus::Incorrect
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self.status, STATUS_INCORRECT | STATUS_CORRECT)
    }
}
