//! Inline SVG line charts for the report and the dashboard.

use chrono::NaiveDate;

use crate::domain::backtest::BacktestResult;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 320.0;
const PADDING: f64 = 50.0;

pub const PRICE_COLOR: &str = "#2563eb";
pub const SHORT_MA_COLOR: &str = "#f59e0b";
pub const LONG_MA_COLOR: &str = "#10b981";
pub const STRATEGY_COLOR: &str = "#7c3aed";
pub const MARKET_COLOR: &str = "#6b7280";

pub struct ChartLine<'a> {
    pub label: String,
    pub color: &'static str,
    pub dashed: bool,
    pub values: &'a [Option<f64>],
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// One path per line, broken wherever a value is absent. Returns an empty
/// string when there is nothing to plot.
pub fn generate_line_chart_svg(
    title: &str,
    dates: &[NaiveDate],
    lines: &[ChartLine],
    value_suffix: &str,
) -> String {
    let defined = lines.iter().flat_map(|l| l.values.iter().flatten().copied());
    let (min, max) = defined.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if dates.is_empty() || !min.is_finite() || !max.is_finite() {
        return String::new();
    }

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;
    let range = max - min;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if dates.len() > 1 {
        plot_width / (dates.len() - 1) as f64
    } else {
        0.0
    };

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w:.0} {h:.0}" width="100%" role="img" aria-label="{t}">"#,
        w = WIDTH,
        h = HEIGHT,
        t = escape(title)
    );
    svg.push_str(&format!(
        r##"<rect x="0" y="0" width="{w:.0}" height="{h:.0}" fill="#ffffff"/>"##,
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str(&format!(
        r##"<line x1="{p:.0}" y1="{p:.0}" x2="{p:.0}" y2="{b:.0}" stroke="#9ca3af"/><line x1="{p:.0}" y1="{b:.0}" x2="{r:.0}" y2="{b:.0}" stroke="#9ca3af"/>"##,
        p = PADDING,
        b = HEIGHT - PADDING,
        r = WIDTH - PADDING
    ));

    for line in lines {
        let mut d = String::new();
        let mut pen_down = false;
        for (i, value) in line.values.iter().enumerate().take(dates.len()) {
            match value {
                Some(v) => {
                    let x = PADDING + i as f64 * scale_x;
                    let y = HEIGHT - PADDING - (v - min) * scale_y;
                    d.push_str(&format!("{}{:.1},{:.1} ", if pen_down { "L" } else { "M" }, x, y));
                    pen_down = true;
                }
                None => pen_down = false,
            }
        }
        if d.is_empty() {
            continue;
        }
        let dash = if line.dashed { r#" stroke-dasharray="6 4""# } else { "" };
        svg.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="1.5"{}/>"#,
            d.trim_end(),
            line.color,
            dash
        ));
    }

    svg.push_str(&format!(
        r##"<text x="{x:.0}" y="{y:.0}" font-size="11" text-anchor="end" fill="#374151">{v:.2}{s}</text>"##,
        x = PADDING - 4.0,
        y = PADDING + 4.0,
        v = max,
        s = value_suffix
    ));
    svg.push_str(&format!(
        r##"<text x="{x:.0}" y="{y:.0}" font-size="11" text-anchor="end" fill="#374151">{v:.2}{s}</text>"##,
        x = PADDING - 4.0,
        y = HEIGHT - PADDING,
        v = min,
        s = value_suffix
    ));
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        svg.push_str(&format!(
            r##"<text x="{x:.0}" y="{y:.0}" font-size="11" fill="#374151">{d}</text>"##,
            x = PADDING,
            y = HEIGHT - PADDING + 16.0,
            d = first
        ));
        svg.push_str(&format!(
            r##"<text x="{x:.0}" y="{y:.0}" font-size="11" text-anchor="end" fill="#374151">{d}</text>"##,
            x = WIDTH - PADDING,
            y = HEIGHT - PADDING + 16.0,
            d = last
        ));
    }

    for (i, line) in lines.iter().enumerate() {
        let x = PADDING + 10.0 + i as f64 * 170.0;
        svg.push_str(&format!(
            r##"<rect x="{x:.0}" y="14" width="12" height="4" fill="{c}"/><text x="{tx:.0}" y="20" font-size="12" fill="#111827">{l}</text>"##,
            x = x,
            c = line.color,
            tx = x + 16.0,
            l = escape(&line.label)
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Closing price with both moving averages overlaid.
pub fn generate_price_svg(result: &BacktestResult) -> String {
    let closes: Vec<Option<f64>> = result.closes.iter().copied().map(Some).collect();
    let lines = [
        ChartLine {
            label: "Price".to_string(),
            color: PRICE_COLOR,
            dashed: false,
            values: &closes,
        },
        ChartLine {
            label: result.short_ma.to_string(),
            color: SHORT_MA_COLOR,
            dashed: true,
            values: &result.short_ma.values,
        },
        ChartLine {
            label: result.long_ma.to_string(),
            color: LONG_MA_COLOR,
            dashed: true,
            values: &result.long_ma.values,
        },
    ];
    generate_line_chart_svg(
        &format!("{} price and moving averages", result.ticker),
        &result.dates,
        &lines,
        "",
    )
}

/// Cumulative strategy vs buy-and-hold log return, in percent.
pub fn generate_returns_svg(result: &BacktestResult) -> String {
    let pct = |series: &[Option<f64>]| -> Vec<Option<f64>> {
        series.iter().map(|v| v.map(|x| x * 100.0)).collect()
    };
    let strategy = pct(&result.cumulative_strategy);
    let market = pct(&result.cumulative_market);
    let lines = [
        ChartLine {
            label: "Strategy".to_string(),
            color: STRATEGY_COLOR,
            dashed: false,
            values: &strategy,
        },
        ChartLine {
            label: "Buy and hold".to_string(),
            color: MARKET_COLOR,
            dashed: false,
            values: &market,
        },
    ];
    generate_line_chart_svg("Cumulative return comparison", &result.dates, &lines, "%")
}
