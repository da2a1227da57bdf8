//! HTML report adapter implementing ReportPort.
//!
//! The report body is a standalone fragment so the web dashboard can serve it
//! to HTMX requests; files and full page loads wrap it in [`BasePage`].

use std::fs;
use std::path::Path;

use askama::Template;

use crate::adapters::chart_svg::{generate_price_svg, generate_returns_svg};
use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradelogicError;
use crate::domain::metrics::{format_percent, Metrics};
use crate::ports::report_port::ReportPort;

pub struct MetricRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Template)]
#[template(path = "report_body.html")]
pub struct ReportTemplate {
    pub ticker: String,
    pub short_window: usize,
    pub long_window: usize,
    pub start_date: String,
    pub end_date: String,
    pub strategy_return: String,
    pub price_svg: String,
    pub returns_svg: String,
    pub metrics: Vec<MetricRow>,
}

impl ReportTemplate {
    pub fn from_result(result: &BacktestResult) -> Self {
        let metrics = Metrics::compute(result);
        let date_or_dash = |d: Option<&chrono::NaiveDate>| {
            d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
        };

        let rows = vec![
            MetricRow {
                label: "Strategy log return",
                value: format_percent(metrics.strategy_return),
            },
            MetricRow {
                label: "Buy and hold log return",
                value: format_percent(metrics.market_return),
            },
            MetricRow {
                label: "Excess return",
                value: format_percent(metrics.excess_return),
            },
            MetricRow {
                label: "Strategy simple return",
                value: format_percent(metrics.strategy_simple_return),
            },
            MetricRow {
                label: "Buy and hold simple return",
                value: format_percent(metrics.market_simple_return),
            },
            MetricRow {
                label: "Annualized strategy return",
                value: format_percent(metrics.annualized_strategy_return),
            },
            MetricRow {
                label: "Annualized buy and hold return",
                value: format_percent(metrics.annualized_market_return),
            },
            MetricRow {
                label: "Max drawdown",
                value: format_percent(-metrics.max_drawdown),
            },
            MetricRow {
                label: "Position changes",
                value: metrics.position_changes.to_string(),
            },
            MetricRow {
                label: "Days long / short / flat",
                value: format!(
                    "{} / {} / {}",
                    metrics.days_long, metrics.days_short, metrics.days_flat
                ),
            },
            MetricRow {
                label: "Trading days",
                value: metrics.trading_days.to_string(),
            },
        ];

        Self {
            ticker: result.ticker.clone(),
            short_window: result.short_window,
            long_window: result.long_window,
            start_date: date_or_dash(result.dates.first()),
            end_date: date_or_dash(result.dates.last()),
            strategy_return: format_percent(result.final_strategy_return),
            price_svg: generate_price_svg(result),
            returns_svg: generate_returns_svg(result),
            metrics: rows,
        }
    }
}

#[derive(Template)]
#[template(path = "base.html")]
pub struct BasePage<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

pub(crate) fn render_error(e: askama::Error) -> TradelogicError {
    TradelogicError::Io(std::io::Error::other(e.to_string()))
}

/// Report body only, without the surrounding page.
pub fn render_report_fragment(result: &BacktestResult) -> Result<String, TradelogicError> {
    ReportTemplate::from_result(result).render().map_err(render_error)
}

pub fn render_page(title: &str, content: &str) -> Result<String, TradelogicError> {
    BasePage { title, content }.render().map_err(render_error)
}

pub fn render_report_page(result: &BacktestResult) -> Result<String, TradelogicError> {
    let content = render_report_fragment(result)?;
    render_page(&format!("{} backtest report", result.ticker), &content)
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), TradelogicError> {
        let html = render_report_page(result)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)?;

        tracing::info!(path = output_path, "report written");
        Ok(())
    }
}
