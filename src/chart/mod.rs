//! Chart rendering.
//!
//! Derives plot series from tournament records and leaderboards and renders
//! them as standalone SVG documents.

use crate::models::{LeaderboardRow, TournamentRecord};

const LINE_WIDTH: f64 = 1200.0;
const LINE_HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 70.0;
const BAR_HEIGHT: f64 = 28.0;
const BAR_GAP: f64 = 8.0;
const BAR_PALETTE: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

/// A plotted point: 1-based tournament round and its value.
pub type Point = (usize, f64);

/// Presentation settings of a line chart.
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color: String,
    /// Draw smaller values at the top
    pub invert_y: bool,
}

impl LineChart {
    /// Club participants per tournament.
    pub fn participation() -> Self {
        Self {
            title: "Club participants".to_string(),
            x_label: "Tournament round".to_string(),
            y_label: "Players".to_string(),
            color: "green".to_string(),
            invert_y: false,
        }
    }

    /// League the club played in per tournament; first league on top.
    pub fn league() -> Self {
        Self {
            title: "League history".to_string(),
            x_label: "Tournament round".to_string(),
            y_label: "League".to_string(),
            color: "blue".to_string(),
            invert_y: true,
        }
    }
}

/// League number encoded in a tournament name.
///
/// The league digit sits in the second-to-last character; any other
/// character there yields `fallback`.
pub fn league_ordinal(name: &str, fallback: u32) -> u32 {
    name.chars()
        .rev()
        .nth(1)
        .and_then(|c| c.to_digit(10))
        .unwrap_or(fallback)
}

/// Participant count per tournament, oldest first.
pub fn participation_series(records: &[TournamentRecord]) -> Vec<Point> {
    records
        .iter()
        .rev()
        .enumerate()
        .map(|(i, r)| (i + 1, r.participant_count() as f64))
        .collect()
}

/// League per tournament, oldest first.
pub fn league_series(records: &[TournamentRecord], fallback: u32) -> Vec<Point> {
    records
        .iter()
        .rev()
        .enumerate()
        .map(|(i, r)| (i + 1, f64::from(league_ordinal(&r.name, fallback))))
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn svg_open(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n",
        w = width,
        h = height
    )
}

fn text(x: f64, y: f64, size: u32, anchor: &str, extra: &str, content: &str) -> String {
    format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"{}\" text-anchor=\"{}\" {}>{}</text>\n",
        x,
        y,
        size,
        anchor,
        extra,
        escape(content)
    )
}

/// Render a dashed line chart with round markers.
pub fn render_line_chart(chart: &LineChart, points: &[Point]) -> String {
    let plot_w = LINE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = LINE_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let rounds = points.iter().map(|p| p.0).max().unwrap_or(1).max(1);
    let (mut lo, mut hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.1), hi.max(p.1))
        });
    if !lo.is_finite() {
        lo = 0.0;
        hi = 1.0;
    }
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }

    let x_of = |round: usize| {
        if rounds == 1 {
            MARGIN_LEFT + plot_w / 2.0
        } else {
            MARGIN_LEFT + plot_w * (round - 1) as f64 / (rounds - 1) as f64
        }
    };
    let y_of = |value: f64| {
        let frac = (value - lo) / (hi - lo);
        if chart.invert_y {
            MARGIN_TOP + plot_h * frac
        } else {
            MARGIN_TOP + plot_h * (1.0 - frac)
        }
    };

    let mut svg = svg_open(LINE_WIDTH, LINE_HEIGHT);
    svg.push_str(&text(
        LINE_WIDTH / 2.0,
        40.0,
        28,
        "middle",
        "font-weight=\"bold\"",
        &chart.title,
    ));

    // axes
    svg.push_str(&format!(
        "<polyline points=\"{l},{t} {l},{b} {r},{b}\" fill=\"none\" stroke=\"#333\"/>\n",
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = MARGIN_TOP + plot_h,
        r = MARGIN_LEFT + plot_w
    ));

    // y ticks at both ends and the middle
    for value in [lo, (lo + hi) / 2.0, hi] {
        svg.push_str(&text(
            MARGIN_LEFT - 10.0,
            y_of(value) + 5.0,
            14,
            "end",
            "",
            &format!("{:.1}", value),
        ));
    }

    svg.push_str(&text(
        MARGIN_LEFT + plot_w / 2.0,
        LINE_HEIGHT - 20.0,
        18,
        "middle",
        "font-weight=\"bold\"",
        &chart.x_label,
    ));
    svg.push_str(&text(
        25.0,
        MARGIN_TOP + plot_h / 2.0,
        18,
        "middle",
        &format!(
            "font-weight=\"bold\" transform=\"rotate(-90 25 {:.1})\"",
            MARGIN_TOP + plot_h / 2.0
        ),
        &chart.y_label,
    ));

    if !points.is_empty() {
        let coords: Vec<String> = points
            .iter()
            .map(|&(round, value)| format!("{:.1},{:.1}", x_of(round), y_of(value)))
            .collect();
        svg.push_str(&format!(
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" stroke-dasharray=\"8 5\"/>\n",
            coords.join(" "),
            escape(&chart.color)
        ));
        for &(round, value) in points {
            svg.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"4\" fill=\"{}\"/>\n",
                x_of(round),
                y_of(value),
                escape(&chart.color)
            ));
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Render a horizontal bar chart of total scores, one labelled bar per row.
pub fn render_bar_chart(title: &str, rows: &[LeaderboardRow]) -> String {
    let name_col = 180.0;
    let bar_area = 900.0;
    let width = name_col + bar_area + 80.0;
    let height = MARGIN_TOP + rows.len() as f64 * (BAR_HEIGHT + BAR_GAP) + 20.0;
    let max_score = rows.iter().map(|r| r.total_score).max().unwrap_or(0).max(1) as f64;

    let mut svg = svg_open(width, height);
    svg.push_str(&text(width / 2.0, 40.0, 25, "middle", "", title));

    for (i, row) in rows.iter().enumerate() {
        let y = MARGIN_TOP + i as f64 * (BAR_HEIGHT + BAR_GAP);
        let bar_w = bar_area * row.total_score as f64 / max_score;
        let color = BAR_PALETTE[i % BAR_PALETTE.len()];

        svg.push_str(&text(
            name_col - 10.0,
            y + BAR_HEIGHT * 0.7,
            15,
            "end",
            "",
            &row.player,
        ));
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>\n",
            name_col, y, bar_w, BAR_HEIGHT, color
        ));
        svg.push_str(&text(
            name_col + bar_w + 0.02 * bar_area,
            y + BAR_HEIGHT * 0.7,
            15,
            "middle",
            "font-weight=\"bold\"",
            &row.total_score.to_string(),
        ));
    }

    svg.push_str("</svg>\n");
    svg
}
