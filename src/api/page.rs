//! Server-rendered markup for the analyzer page

use std::fmt::Write;

use crate::models::ViewModel;
use crate::pipeline::format::{format_count, format_duration, format_number, format_percent};
use crate::pipeline::{Snapshot, ViewState};

const TITLE: &str = "Real Traffic Analyzer";

/// Minimal HTML escaping for text and attribute values
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render(snapshot: &Snapshot) -> String {
    let mut body = String::new();
    render_form(&mut body, snapshot);

    match &snapshot.view {
        ViewState::Idle | ViewState::Loading => {}
        ViewState::Failed(message) => render_error(&mut body, message),
        ViewState::Ready(view) => render_result(&mut body, view),
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{TITLE}</title>
<link rel="stylesheet" href="/assets/app.css">
</head>
<body>
<header>
<h1>{TITLE}</h1>
<p class="subtitle">Web traffic metrics through the Plausible analytics proxy</p>
</header>
<main>
{body}</main>
</body>
</html>
"#
    )
}

fn render_form(out: &mut String, snapshot: &Snapshot) {
    let disabled = if snapshot.trigger_enabled { "" } else { " disabled" };
    let label = if snapshot.view.is_loading() {
        "Analyzing..."
    } else {
        "Analyze Traffic"
    };

    let _ = writeln!(
        out,
        r#"<form method="post" action="/analyze" class="analyze-form">
<input type="text" name="domain" value="{}" placeholder="Enter a domain (e.g. example.com)" required>
<button type="submit"{disabled}>{label}</button>
</form>"#,
        escape(&snapshot.domain)
    );

    if matches!(snapshot.readiness, Some(flags) if !flags.plausible_api_key_configured) {
        out.push_str(
            "<p class=\"notice\">The analytics backend has no upstream API key configured.</p>\n",
        );
    }
}

fn render_error(out: &mut String, message: &str) {
    let _ = writeln!(
        out,
        r#"<div class="error" role="alert">
<p class="error-title">Analysis Error</p>
<p>{}</p>
</div>"#,
        escape(message)
    );
}

fn render_card(out: &mut String, title: &str, value: &str) {
    let _ = writeln!(
        out,
        r#"<div class="card"><p class="card-title">{title}</p><p class="card-value">{}</p></div>"#,
        escape(value)
    );
}

fn render_result(out: &mut String, view: &ViewModel) {
    let _ = writeln!(
        out,
        "<section class=\"results\">\n<h2>Results for {}</h2>\n<div class=\"cards\">",
        escape(&view.domain)
    );
    render_card(out, "Unique Visitors", &format_count(view.visitors));
    render_card(out, "Pageviews", &format_count(view.pageviews));
    render_card(out, "Bounce Rate", &format_percent(view.bounce_rate));
    render_card(out, "Avg. Visit Duration", &format_duration(view.visit_duration));
    out.push_str("</div>\n");

    if !view.traffic_sources.is_empty() {
        out.push_str("<h3>Top Traffic Sources</h3>\n<ul class=\"sources\">\n");
        for source in &view.traffic_sources {
            let _ = writeln!(
                out,
                "<li>{} — {}</li>",
                escape(&source.channel),
                format_number(source.value)
            );
        }
        out.push_str("</ul>\n");
    }

    let _ = writeln!(
        out,
        "<p class=\"data-source\">Data provided by: {}</p>\n</section>",
        escape(&view.data_source)
    );
}
