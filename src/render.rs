//! Server-side HTML rendering of a [`RenderPayload`]
//!
//! Charts are plain inline SVG: one polyline per group, scaled to the
//! payload's own time and value bounds.

use crate::actors::messages::{Panel, RenderPayload};
use crate::metrics::ChartSpec;
use crate::probe::{ProbeOutcome, ProbeResult};

const PAGE_TITLE: &str = "DNS Metrics Dashboard";

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 260.0;
const MARGIN: f64 = 40.0;

const PALETTE: [&str; 6] = ["#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3"];

const STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#222}\
svg{background:#fafafa;border:1px solid #ddd}\
.failed{color:#b00}\
ul.logs{font-family:monospace;font-size:0.85em}\
footer{color:#888;font-size:0.8em}";

/// Reloads the page as soon as the next payload is streamed
const RELOAD_SCRIPT: &str = "<script>\
new WebSocket((location.protocol==='https:'?'wss://':'ws://')+location.host+'/api/v1/stream')\
.onmessage=()=>location.reload();</script>";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Full page; the browser reloads it every `refresh_secs`
pub fn render_page(payload: Option<&RenderPayload>, refresh_secs: u64) -> String {
    let mut html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"{refresh_secs}\">\
         <title>{PAGE_TITLE}</title><style>{STYLE}</style></head><body><h1>{PAGE_TITLE}</h1>"
    );

    match payload {
        None => html.push_str("<p>Waiting for the first refresh&hellip;</p>"),
        Some(payload) => {
            html.push_str(&chart_section("dns-queries-graph", "DNS queries", &payload.dns));
            html.push_str(&chart_section(
                "traefik-requests-graph",
                "Traefik requests",
                &payload.traefik,
            ));
            html.push_str(&log_section(&payload.logs));
            html.push_str(&format!(
                "<div id=\"accessibility\"><p>{}</p>{}</div>",
                escape(&payload.status),
                probe_detail(&payload.probe)
            ));
            html.push_str(&format!(
                "<footer>tick {} &middot; generated {}</footer>",
                payload.tick,
                payload.generated_at.to_rfc3339()
            ));
        }
    }

    html.push_str(RELOAD_SCRIPT);
    html.push_str("</body></html>");
    html
}

fn chart_section(id: &str, fallback_title: &str, panel: &Panel<ChartSpec>) -> String {
    match panel {
        Panel::Ready { data } => format!(
            "<section id=\"{id}\"><h2>{}</h2>{}</section>",
            escape(&data.title),
            chart_svg(data)
        ),
        Panel::Failed { message } => format!(
            "<section id=\"{id}\"><h2>{fallback_title}</h2><p class=\"failed\">{}</p></section>",
            escape(message)
        ),
    }
}

fn log_section(panel: &Panel<Vec<String>>) -> String {
    match panel {
        Panel::Ready { data } => {
            let items: String = data
                .iter()
                .map(|line| format!("<li>{}</li>", escape(line)))
                .collect();
            format!("<div id=\"traefik-logs\"><ul class=\"logs\">{items}</ul></div>")
        }
        Panel::Failed { message } => format!(
            "<div id=\"traefik-logs\"><p class=\"failed\">{}</p></div>",
            escape(message)
        ),
    }
}

fn probe_detail(probe: &ProbeResult) -> String {
    let outcome = match &probe.outcome {
        ProbeOutcome::Reachable => "echo reply received".to_string(),
        ProbeOutcome::Unreachable { exit_code } => format!("no reply (exit code {exit_code})"),
        ProbeOutcome::ExecutionFailed { error } => format!("probe failed: {}", escape(error)),
    };
    format!(
        "<p><small>Probed {} at {}: {outcome}</small></p>",
        probe.address,
        probe.checked_at.to_rfc3339()
    )
}

/// SVG line chart with one polyline per label group
pub fn chart_svg(chart: &ChartSpec) -> String {
    let finite: Vec<(f64, f64)> = chart
        .samples
        .iter()
        .filter(|s| s.timestamp.is_finite() && s.value.is_finite())
        .map(|s| (s.timestamp, s.value))
        .collect();

    if finite.is_empty() {
        return "<p>No data</p>".to_string();
    }

    let (t_min, t_max) = bounds(finite.iter().map(|(t, _)| *t));
    let (v_min, v_max) = bounds(finite.iter().map(|(_, v)| *v).chain([0.0]));

    let x = |t: f64| {
        if t_max > t_min {
            MARGIN + (t - t_min) / (t_max - t_min) * (WIDTH - 2.0 * MARGIN)
        } else {
            WIDTH / 2.0
        }
    };
    let y = |v: f64| {
        if v_max > v_min {
            HEIGHT - MARGIN - (v - v_min) / (v_max - v_min) * (HEIGHT - 2.0 * MARGIN)
        } else {
            HEIGHT / 2.0
        }
    };

    let mut svg = format!(
        "<svg viewBox=\"0 0 {WIDTH} {HEIGHT}\" width=\"{WIDTH}\" height=\"{HEIGHT}\" role=\"img\">\
         <line x1=\"{MARGIN}\" y1=\"{bottom}\" x2=\"{right}\" y2=\"{bottom}\" stroke=\"#999\"/>\
         <line x1=\"{MARGIN}\" y1=\"{MARGIN}\" x2=\"{MARGIN}\" y2=\"{bottom}\" stroke=\"#999\"/>\
         <text x=\"4\" y=\"{MARGIN}\" font-size=\"10\">{v_max:.2}</text>\
         <text x=\"4\" y=\"{bottom}\" font-size=\"10\">{v_min:.2}</text>",
        bottom = HEIGHT - MARGIN,
        right = WIDTH - MARGIN,
    );

    for (index, (name, samples)) in chart.groups().into_iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let mut points: Vec<(f64, f64)> = samples
            .iter()
            .filter(|s| s.timestamp.is_finite() && s.value.is_finite())
            .map(|s| (x(s.timestamp), y(s.value)))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let path: Vec<String> = points.iter().map(|(px, py)| format!("{px:.1},{py:.1}")).collect();
        svg.push_str(&format!(
            "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"2\" points=\"{}\"/>",
            path.join(" ")
        ));
        for (px, py) in &points {
            svg.push_str(&format!(
                "<circle cx=\"{px:.1}\" cy=\"{py:.1}\" r=\"3\" fill=\"{color}\"/>"
            ));
        }
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"{color}\">{}</text>",
            WIDTH - MARGIN - 140.0,
            MARGIN + 14.0 * index as f64,
            escape(&name)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
