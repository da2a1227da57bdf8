//! HTTP request handlers for web adapter.

use std::str::FromStr;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Form,
};
use chrono::NaiveDate;

use crate::adapters::html_report_adapter::{render_error, render_page, render_report_fragment};
use crate::domain::backtest::validate_window;
use crate::domain::lesson::Lesson;
use crate::domain::runner::{parse_ticker, run_for_request, BacktestRequest};
use crate::ports::config_port::DATE_FORMAT;

use super::templates::{DashboardTemplate, LessonTemplate, LessonsTemplate, lesson_links};
use super::{is_htmx_request, AppState, WebError};

/// Fragment for HTMX, otherwise the fragment wrapped in the base page.
fn respond(headers: &HeaderMap, title: &str, content: String) -> Result<Response, WebError> {
    if is_htmx_request(headers) {
        Ok(Html(content).into_response())
    } else {
        Ok(Html(render_page(title, &content)?).into_response())
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let content = DashboardTemplate::from_defaults(&state.defaults)
        .render()
        .map_err(render_error)?;
    respond(&headers, "Tradelogic", content)
}

#[derive(Debug, serde::Deserialize)]
pub struct BacktestForm {
    pub ticker: String,
    pub short_window: String,
    pub long_window: String,
    pub start_date: String,
    pub end_date: String,
}

fn parse_window(name: &str, raw: &str) -> Result<usize, WebError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| WebError::bad_request(format!("{} must be a whole number", name)))?;
    Ok(validate_window(name, value)?)
}

fn parse_date(name: &str, raw: &str) -> Result<NaiveDate, WebError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| WebError::bad_request(format!("invalid {} format, expected YYYY-MM-DD", name)))
}

impl BacktestForm {
    pub fn into_request(self) -> Result<BacktestRequest, WebError> {
        Ok(BacktestRequest {
            ticker: parse_ticker(&self.ticker)?,
            short_window: parse_window("short_window", &self.short_window)?,
            long_window: parse_window("long_window", &self.long_window)?,
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
        })
    }
}

pub async fn run_backtest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<BacktestForm>,
) -> Result<Response, WebError> {
    let request = form.into_request().map_err(|e| e.for_request(&headers))?;

    // Price sources block (HTTP, SQLite), so keep them off the runtime threads.
    let source = Arc::clone(&state.price_source);
    let outcome = tokio::task::spawn_blocking(move || {
        let result = run_for_request(&*source, &request)?;
        render_report_fragment(&result).map(|html| (result.ticker, html))
    })
    .await
    .map_err(|e| WebError::internal(format!("backtest task failed: {}", e)).for_request(&headers))?;

    let (ticker, content) = outcome.map_err(|e| WebError::from(e).for_request(&headers))?;
    respond(&headers, &format!("{} backtest report", ticker), content)
}

pub async fn lessons(headers: HeaderMap) -> Result<Response, WebError> {
    let content = LessonsTemplate {
        lessons: lesson_links(),
    }
    .render()
    .map_err(render_error)?;
    respond(&headers, "Lessons", content)
}

pub async fn lesson(Path(slug): Path<String>, headers: HeaderMap) -> Result<Response, WebError> {
    let lesson = Lesson::from_str(&slug).map_err(|e| WebError::from(e).for_request(&headers))?;
    let content = LessonTemplate::from(lesson).render().map_err(render_error)?;
    respond(&headers, lesson.title(), content)
}

pub async fn not_found() -> WebError {
    WebError::not_found("page not found")
}
