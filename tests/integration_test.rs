//! End-to-end engine tests: source -> runner -> result -> report.

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use tradelogic::adapters::html_report_adapter::HtmlReportAdapter;
use tradelogic::domain::backtest::{run_backtest, BacktestResult};
use tradelogic::domain::error::TradelogicError;
use tradelogic::domain::metrics::{format_percent, Metrics};
use tradelogic::domain::runner::{run_for_request, BacktestRequest};
use tradelogic::domain::signal::Signal;
use tradelogic::ports::report_port::ReportPort;

fn request(ticker: &str, short: usize, long: usize, start: &str, end: &str) -> BacktestRequest {
    BacktestRequest {
        ticker: ticker.to_string(),
        short_window: short,
        long_window: long,
        start_date: date(start),
        end_date: date(end),
    }
}

mod worked_example {
    use super::*;

    fn result() -> BacktestResult {
        let series = make_series("DEMO", "2024-01-01", &[100.0, 102.0, 101.0, 105.0, 110.0]);
        run_backtest(&series, 2, 3).unwrap()
    }

    #[test]
    fn moving_averages() {
        let r = result();
        let short: Vec<Option<f64>> = r.short_ma.values.clone();
        assert_eq!(short[0], None);
        assert_relative_eq!(short[1].unwrap(), 101.0);
        assert_relative_eq!(short[2].unwrap(), 101.5);
        assert_relative_eq!(short[3].unwrap(), 103.0);
        assert_relative_eq!(short[4].unwrap(), 107.5);

        let long = &r.long_ma.values;
        assert_eq!(long[0], None);
        assert_eq!(long[1], None);
        assert_relative_eq!(long[2].unwrap(), 101.0);
        assert_relative_eq!(long[3].unwrap(), 308.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(long[4].unwrap(), 316.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn signals_and_positions() {
        let r = result();
        let values: Vec<i8> = r.signals.iter().map(|s| s.value()).collect();
        assert_eq!(values, vec![0, 0, 1, 1, 1]);
        assert_eq!(
            r.positions,
            vec![
                None,
                Some(Signal::Flat),
                Some(Signal::Flat),
                Some(Signal::Long),
                Some(Signal::Long)
            ]
        );
    }

    #[test]
    fn final_returns() {
        let r = result();
        assert_relative_eq!(r.final_strategy_return, (110.0_f64 / 101.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(r.final_market_return, (1.1_f64).ln(), epsilon = 1e-12);
        assert_eq!(format_percent(r.final_market_return), "9.53%");
    }
}

mod runner_pipeline {
    use super::*;

    #[test]
    fn runs_through_mock_source_with_range_filter() {
        let series = make_series("AAPL", "2024-01-01", &wave_closes(60, 100.0));
        let source = MockPriceSource::new().with_series(series);

        let result = run_for_request(&source, &request("AAPL", 5, 20, "2024-01-11", "2024-02-19"))
            .unwrap();

        assert_eq!(source.fetch_count(), 1);
        assert_eq!(result.len(), 40);
        assert_eq!(result.dates.first().copied(), Some(date("2024-01-11")));
        assert_eq!(result.dates.last().copied(), Some(date("2024-02-19")));
        assert_eq!(result.short_ma.first_valid(), Some(4));
        assert_eq!(result.long_ma.first_valid(), Some(19));
    }

    #[test]
    fn unknown_ticker_is_insufficient_data() {
        let source = MockPriceSource::new();
        let err = run_for_request(&source, &request("NOPE", 2, 3, "2024-01-01", "2024-12-31"))
            .unwrap_err();
        assert!(matches!(
            err,
            TradelogicError::InsufficientData { observations: 0, minimum: 2, .. }
        ));
    }

    #[test]
    fn inverted_range_is_insufficient_data() {
        let series = make_series("AAPL", "2024-01-01", &[1.0, 2.0, 3.0]);
        let source = MockPriceSource::new().with_series(series);
        let err = run_for_request(&source, &request("AAPL", 1, 2, "2024-12-31", "2024-01-01"))
            .unwrap_err();
        assert!(matches!(err, TradelogicError::InsufficientData { .. }));
    }

    #[test]
    fn zero_window_never_fetches() {
        let source = MockPriceSource::new();
        let err = run_for_request(&source, &request("AAPL", 0, 3, "2024-01-01", "2024-12-31"))
            .unwrap_err();
        assert!(matches!(err, TradelogicError::InvalidWindow { .. }));
        assert_eq!(source.fetch_count(), 0);
    }

    #[test]
    fn source_errors_propagate() {
        let source = MockPriceSource::new().with_error("AAPL", "connection refused");
        let err = run_for_request(&source, &request("AAPL", 2, 3, "2024-01-01", "2024-12-31"))
            .unwrap_err();
        assert!(matches!(err, TradelogicError::DataSource { reason } if reason.contains("refused")));
    }

    #[test]
    fn report_written_from_runner_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.html");
        let series = make_series("AAPL", "2024-01-01", &wave_closes(40, 50.0));
        let source = MockPriceSource::new().with_series(series);

        let result = run_for_request(&source, &request("AAPL", 3, 10, "2024-01-01", "2024-12-31"))
            .unwrap();
        HtmlReportAdapter::new()
            .write(&result, path.to_str().unwrap())
            .unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains(&format!(
            "Strategy return: {}",
            format_percent(result.final_strategy_return)
        )));
        assert_eq!(html.matches("<svg").count(), 2);
    }
}

mod metrics_consistency {
    use super::*;

    #[test]
    fn day_counts_cover_all_defined_positions() {
        let series = make_series("AAPL", "2024-01-01", &wave_closes(80, 100.0));
        let result = run_backtest(&series, 3, 12).unwrap();
        let m = Metrics::compute(&result);

        assert_eq!(m.days_long + m.days_short + m.days_flat, result.len() - 1);
        assert!(m.days_long > 0);
        assert!(m.days_short > 0);
        assert!(m.max_drawdown >= 0.0 && m.max_drawdown < 1.0);
    }
}

fn closes_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1000.0, 2..120)
}

proptest! {
    #[test]
    fn moving_averages_defined_after_warmup(
        closes in closes_strategy(),
        short in 1usize..15,
        long in 1usize..40,
    ) {
        let series = make_series("PROP", "2020-01-01", &closes);
        let r = run_backtest(&series, short, long).unwrap();

        for (window, ma) in [(short, &r.short_ma), (long, &r.long_ma)] {
            for (t, v) in ma.values.iter().enumerate() {
                prop_assert_eq!(v.is_some(), t + 1 >= window);
            }
        }
    }

    #[test]
    fn signal_is_flat_when_averages_absent_or_equal(
        closes in closes_strategy(),
        short in 1usize..15,
        long in 1usize..40,
    ) {
        let series = make_series("PROP", "2020-01-01", &closes);
        let r = run_backtest(&series, short, long).unwrap();

        for t in 0..r.len() {
            let s = r.signals[t];
            prop_assert!([-1, 0, 1].contains(&s.value()));
            match (r.short_ma.values[t], r.long_ma.values[t]) {
                (Some(a), Some(b)) if a > b => prop_assert_eq!(s, Signal::Long),
                (Some(a), Some(b)) if a < b => prop_assert_eq!(s, Signal::Short),
                _ => prop_assert_eq!(s, Signal::Flat),
            }
        }
    }

    #[test]
    fn positions_lag_signals_by_one(
        closes in closes_strategy(),
        short in 1usize..15,
        long in 1usize..40,
    ) {
        let series = make_series("PROP", "2020-01-01", &closes);
        let r = run_backtest(&series, short, long).unwrap();

        prop_assert_eq!(r.positions[0], None);
        for t in 1..r.len() {
            prop_assert_eq!(r.positions[t], Some(r.signals[t - 1]));
        }
    }

    #[test]
    fn market_return_independent_of_windows(
        closes in closes_strategy(),
        short in 1usize..15,
        long in 1usize..40,
    ) {
        let series = make_series("PROP", "2020-01-01", &closes);
        let r = run_backtest(&series, short, long).unwrap();
        let baseline = run_backtest(&series, 1, 1).unwrap();

        let expected: f64 = closes.windows(2).map(|w| (w[1] / w[0]).ln()).sum();
        prop_assert!((r.final_market_return - expected).abs() < 1e-9);
        prop_assert_eq!(r.final_market_return.to_bits(), baseline.final_market_return.to_bits());
    }

    #[test]
    fn reruns_are_bit_identical(
        closes in closes_strategy(),
        short in 1usize..15,
        long in 1usize..40,
    ) {
        let series = make_series("PROP", "2020-01-01", &closes);
        let a = run_backtest(&series, short, long).unwrap();
        let b = run_backtest(&series, short, long).unwrap();

        prop_assert_eq!(a.final_strategy_return.to_bits(), b.final_strategy_return.to_bits());
        prop_assert_eq!(&a, &b);
    }
}

#[test]
fn single_price_is_insufficient() {
    let series = make_series("ONE", "2024-01-01", &[100.0]);
    assert!(matches!(
        run_backtest(&series, 1, 1),
        Err(TradelogicError::InsufficientData { observations: 1, .. })
    ));
}
