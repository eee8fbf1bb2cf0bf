use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use trellis_dispatch::DispatchFailure;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Dispatch {
        kind: DispatchFailure,
        message: String,
    },
}

#[derive(Serialize)]
struct JsonError {
    message: String,
    r#type: String,
}

#[derive(Serialize)]
struct JsonErrorWrapper {
    error: JsonError,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Dispatch { kind, .. } => match kind {
                DispatchFailure::UnknownModel => StatusCode::BAD_REQUEST,
                DispatchFailure::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
                DispatchFailure::Timeout => StatusCode::GATEWAY_TIMEOUT,
                DispatchFailure::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                DispatchFailure::AuthRejected
                | DispatchFailure::MalformedResponse
                | DispatchFailure::Upstream => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let AppError::Dispatch { kind, message } = self;
        let body = JsonErrorWrapper {
            error: JsonError {
                message: message.clone(),
                r#type: kind.as_str().to_string(),
            },
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
