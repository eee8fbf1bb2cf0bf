use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trellis_core::{ChatRequest, RequestOrigin};
use trellis_dispatch::DispatchOutcome;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub thread_id: String,
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub response: String,
    pub model: String,
    pub thread_id: String,
    pub timestamp: DateTime<Utc>,
}

pub async fn send(
    state: web::Data<AppState>,
    body: web::Json<ChatBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let mut request = ChatRequest::new(
        RequestOrigin::Http,
        body.thread_id.clone(),
        body.user_id.unwrap_or_else(|| "api".to_string()),
        body.message,
    );
    if let Some(model) = body.model {
        request = request.with_alias(model);
    }

    match state.dispatcher.dispatch(request).await {
        DispatchOutcome::Reply(reply) => Ok(HttpResponse::Ok().json(ChatResponseBody {
            response: reply.text,
            model: reply.model_id,
            thread_id: body.thread_id,
            timestamp: Utc::now(),
        })),
        DispatchOutcome::Failed { kind, message } => Err(AppError::Dispatch { kind, message }),
    }
}
