use thiserror::Error;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::Request;
use rocket::Response;
use rocket::http::ContentType;
use std::io::Cursor;
use serde_json::json;
use serde::Serialize;
use rocket_okapi::JsonSchema;

// SQLSTATE MySQL attaches to deadlock rollbacks
const SERIALIZATION_FAILURE: &str = "40001";

#[derive(Error, Debug, Serialize, JsonSchema)]
pub enum AppError {
    #[error("Database error")]
    DatabaseError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

// Convert sqlx::Error into the booking error taxonomy.
// A lost race on a uniqueness constraint or a deadlock is reported as a conflict,
// the caller may retry the whole operation.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(
                "Concurrent update lost the race on a unique constraint, retry the operation"
                    .into(),
            ),
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE) =>
            {
                AppError::Conflict("Transaction aborted by a concurrent update, retry".into())
            }
            _ => AppError::DatabaseError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

// Define a type alias for the result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::ValidationError(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::DatabaseError(_) => Status::InternalServerError,
            AppError::AuthError(_) => Status::Unauthorized,
            AppError::Conflict(_) => Status::Conflict,
            AppError::Unprocessable(_) => Status::UnprocessableEntity,
            AppError::BadRequest(_) => Status::BadRequest,
        }
    }
}

// Format all errors from the route level into a JSON http response
#[rocket::async_trait]
impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();

        let json = json!({
            "error": self.to_string()
        });

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(None, Cursor::new(json.to_string()))
            .ok()
    }
}
