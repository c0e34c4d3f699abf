//! SVG rendering of result tables.
//!
//! One panel per numeric signal, stacked vertically and sharing the time
//! axis. Each sample is drawn as a point marker on a polyline.

use std::fmt::Write as _;

use crate::result::ResultTable;

const WIDTH: f64 = 800.0;
const PANEL_HEIGHT: f64 = 160.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const PANEL_GAP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;
const LINE_COLOR: &str = "#1f77b4";

/// Render `table` as an SVG document titled `title`.
///
/// Signals that are not entirely numeric are left out. A table without
/// numeric signals still yields a valid, empty plot.
pub fn render_svg(table: &ResultTable, title: &str) -> String {
    let signals: Vec<(&str, Vec<f64>)> = table
        .signals()
        .iter()
        .filter_map(|s| table.numeric(s).map(|v| (s.as_str(), v)))
        .collect();

    let panels = signals.len().max(1) as f64;
    let height = MARGIN_TOP + panels * PANEL_HEIGHT + (panels - 1.0) * PANEL_GAP + MARGIN_BOTTOM;
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let (t0, t1) = bounds(table.times());

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}" font-family="sans-serif" font-size="11">"#
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="18" text-anchor="middle" font-size="14">{}</text>"#,
        WIDTH / 2.0,
        escape(title)
    );

    for (i, (name, values)) in signals.iter().enumerate() {
        let top = MARGIN_TOP + i as f64 * (PANEL_HEIGHT + PANEL_GAP);
        let (v0, v1) = bounds(values);
        let x = |t: f64| MARGIN_LEFT + scale(t, t0, t1) * plot_width;
        let y = |v: f64| top + PANEL_HEIGHT - scale(v, v0, v1) * PANEL_HEIGHT;

        let _ = writeln!(
            svg,
            r##"  <rect x="{MARGIN_LEFT}" y="{top}" width="{plot_width}" height="{PANEL_HEIGHT}" fill="none" stroke="#cccccc"/>"##
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 8.0,
            top + PANEL_HEIGHT / 2.0,
            escape(name)
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 8.0,
            top + 10.0,
            format_tick(v1)
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 8.0,
            top + PANEL_HEIGHT,
            format_tick(v0)
        );

        let points: Vec<String> = table
            .times()
            .iter()
            .zip(values)
            .map(|(t, v)| format!("{:.2},{:.2}", x(*t), y(*v)))
            .collect();
        let _ = writeln!(
            svg,
            r#"  <polyline fill="none" stroke="{LINE_COLOR}" stroke-width="1.5" points="{}"/>"#,
            points.join(" ")
        );
        for (t, v) in table.times().iter().zip(values) {
            let _ = writeln!(
                svg,
                r#"  <circle cx="{:.2}" cy="{:.2}" r="2" fill="{LINE_COLOR}"/>"#,
                x(*t),
                y(*v)
            );
        }
    }

    let axis_y = height - MARGIN_BOTTOM + 16.0;
    let _ = writeln!(
        svg,
        r#"  <text x="{MARGIN_LEFT}" y="{axis_y}">{}</text>"#,
        format_tick(t0)
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="{axis_y}" text-anchor="end">{}</text>"#,
        WIDTH - MARGIN_RIGHT,
        format_tick(t1)
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="{}" text-anchor="middle">time</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        axis_y + 14.0
    );
    svg.push_str("</svg>\n");
    svg
}

/// Minimum and maximum, widened when the range is empty.
fn bounds(values: &[f64]) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    (lo, hi)
}

fn scale(v: f64, lo: f64, hi: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

fn format_tick(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
