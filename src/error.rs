//! Error handling

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::dataset::DatasetError;
use crate::model::ModelError;
use crate::submission::SubmissionError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Request errors
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Upload rejected: {message}")]
    UploadRejected { status: StatusCode, message: String },

    #[error("{0}")]
    ValidationError(String),

    // Model state errors
    #[error("Model not trained. Please train the model first.")]
    ModelNotTrained,

    #[error("{0}")]
    NotFound(String),

    // Generic errors
    #[error("{0}")]
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoFileUploaded => StatusCode::BAD_REQUEST,
            AppError::UploadRejected { status, .. } => *status,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ModelNotTrained => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("Internal error: {}", message);
        } else {
            tracing::warn!("Request failed ({}): {}", status.as_u16(), message);
        }

        let body = Json(json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<DatasetError> for AppError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::Empty | DatasetError::MissingPressure => AppError::ValidationError(err.to_string()),
            DatasetError::Csv(_) | DatasetError::Io { .. } => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Dataset(e) => e.into(),
            ModelError::InsufficientData(_) | ModelError::NoTargets => AppError::ValidationError(err.to_string()),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Empty | SubmissionError::TooManyRows { .. } => {
                AppError::ValidationError(err.to_string())
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::UploadRejected {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("worker task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NoFileUploaded.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ModelNotTrained.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InternalError("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_dataset_errors_map() {
        assert_eq!(AppError::from(DatasetError::MissingPressure).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(ModelError::Dataset(DatasetError::Empty)).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(ModelError::NotFitted).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_submission_errors_map() {
        let too_many = SubmissionError::TooManyRows {
            min_id: 0,
            max_id: u64::MAX,
            limit: 10,
        };
        assert_eq!(AppError::from(too_many).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(SubmissionError::Empty).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_message_passthrough() {
        let err = AppError::from(DatasetError::MissingPressure);
        assert_eq!(err.to_string(), "the dataset must have a \"pressure\" column");
    }
}
