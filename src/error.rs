use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::Request;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Not found")]
    NotFound,
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::NotFound => Status::NotFound,
            AppError::UnsupportedFormat(_) | AppError::InvalidFileName(_) => Status::BadRequest,
            AppError::Serialization(_) => Status::BadRequest,
            AppError::Io(_) | AppError::Http(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            log::error!("{} {} failed: {}", req.method(), req.uri(), self);
        }

        // Don't leak paths from IO errors to the browser
        let message = match &self {
            AppError::Io(_) => "IO error".to_string(),
            AppError::Http(_) => "HTTP error".to_string(),
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "ok": false,
            "message": message,
        }));

        Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}

/// Why a piece of metadata could not be resolved.
///
/// Resolution never fails loudly: callers collapse this into the
/// "Unknown Artist" / "unknown" sentinels at the display boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    #[error("file carries no tag")]
    NoTag,

    #[error("tag has no {0} field")]
    MissingField(&'static str),

    #[error("could not read file: {0}")]
    Unreadable(String),

    #[error("remote lookup failed: {0}")]
    LookupFailed(String),

    #[error("remote lookup returned no match")]
    NoMatch,

    #[error("remote lookup disabled")]
    Disabled,
}

pub type Resolved<T> = std::result::Result<T, Unresolved>;
