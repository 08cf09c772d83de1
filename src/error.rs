//! Error types.

use log::{error, warn};

use rocket::http::{Method, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;

use serde_json::json;

use derive_more::{Display, From};

use crate::models::{PostId, PostboardId};

/// Our error type.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "Missing param '{}' for new post", param)]
    MissingPostParam { param: String },
    #[display(fmt = "Invalid param '{}' for new post: {}", param, reason)]
    InvalidPostParam { param: String, reason: String },
    #[display(fmt = "Postboard #{} not found", board_id)]
    BoardNotFound { board_id: PostboardId },
    #[display(fmt = "Post #{} not found", post_id)]
    PostNotFound { post_id: PostId },
    #[display(fmt = "No identifiers left in table {}", table)]
    IdsExhausted { table: &'static str },
    #[display(fmt = "Background task failed: {}", _0)]
    #[from]
    TaskError(rocket::tokio::task::JoinError),
    #[display(fmt = "Couldn't initialize logging: {}", _0)]
    #[from]
    LogError(log::SetLoggerError),
    #[display(fmt = "YAML error: {}", _0)]
    #[from]
    YamlError(serde_yaml::Error),
    #[display(fmt = "JSON error: {}", _0)]
    #[from]
    JsonError(serde_json::Error),
    #[display(fmt = "Database connection pool error: {}", _0)]
    #[from]
    R2d2Error(r2d2::Error),
    #[display(fmt = "Database error: {}", _0)]
    #[from]
    DatabaseError(diesel::result::Error),
    #[display(fmt = "Database migration error: {}", cause)]
    DatabaseMigrationError { cause: String },
    #[display(fmt = "Couldn't connect to the SQLite database: {}", _0)]
    #[from]
    ConnectionError(diesel::ConnectionError),
    #[display(fmt = "Server error: {}", _0)]
    #[from]
    LaunchError(rocket::Error),
    #[display(fmt = "I/O error: {}", _0)]
    #[from]
    IoError(std::io::Error),
    #[display(fmt = "I/O error: {}: {}", msg, cause)]
    IoErrorMsg { cause: std::io::Error, msg: String },
}

impl Error {
    pub fn from_io_error<S>(cause: std::io::Error, msg: S) -> Error
    where
        S: Into<String>,
    {
        Error::IoErrorMsg {
            cause,
            msg: msg.into(),
        }
    }

    pub fn missing<S>(param: S) -> Error
    where
        S: Into<String>,
    {
        Error::MissingPostParam {
            param: param.into(),
        }
    }

    pub fn invalid<S, R>(param: S, reason: R) -> Error
    where
        S: Into<String>,
        R: Into<String>,
    {
        Error::InvalidPostParam {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Error::MissingPostParam { .. } | Error::InvalidPostParam { .. } => {
                Status::BadRequest
            }
            Error::BoardNotFound { .. } | Error::PostNotFound { .. } => Status::NotFound,
            Error::R2d2Error(..) => Status::ServiceUnavailable,
            _ => Status::InternalServerError,
        }
    }
}

/// The JSON body every failed API call answers with.
pub fn failure_body<S>(message: S) -> Json<serde_json::Value>
where
    S: AsRef<str>,
{
    Json(json!({ "success": false, "message": message.as_ref() }))
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();

        let message = if status.code < 500 {
            warn!("{}", &self);
            self.to_string()
        } else {
            // Storage details stay in the log.
            error!("{} {}: {}", req.method(), req.uri(), &self);
            match req.method() {
                Method::Get => "internal error".to_string(),
                _ => "write failed".to_string(),
            }
        };

        (status, failure_body(message)).respond_to(req)
    }
}

impl std::error::Error for Error {}

/// Our result type.
pub type Result<T> = std::result::Result<T, Error>;
