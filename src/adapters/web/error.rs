//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::adapters::html_report_adapter::render_page;
use crate::domain::error::TradelogicError;

use super::is_htmx_request;
use super::templates::ErrorTemplate;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
    /// Render the bare error fragment instead of a full page.
    pub fragment: bool,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fragment: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Match the response shape to the request: fragment for HTMX.
    pub fn for_request(mut self, headers: &HeaderMap) -> Self {
        self.fragment = is_htmx_request(headers);
        self
    }
}

pub fn status_from_error(err: &TradelogicError) -> StatusCode {
    match err {
        TradelogicError::ConfigMissing { .. }
        | TradelogicError::ConfigInvalid { .. }
        | TradelogicError::ConfigParse { .. }
        | TradelogicError::InvalidWindow { .. } => StatusCode::BAD_REQUEST,
        TradelogicError::InsufficientData { .. } | TradelogicError::InvalidPriceSeries { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TradelogicError::DataSource { .. } => StatusCode::BAD_GATEWAY,
        TradelogicError::UnknownLesson { .. } => StatusCode::NOT_FOUND,
        TradelogicError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TradelogicError> for WebError {
    fn from(err: TradelogicError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, message = %self.message, "request failed");
        }

        let template = ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        let content = match template.render() {
            Ok(html) => html,
            Err(_) => return (self.status, self.message).into_response(),
        };

        if self.fragment {
            return (self.status, Html(content)).into_response();
        }
        match render_page("Error", &content) {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, Html(content)).into_response(),
        }
    }
}
