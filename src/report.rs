//! Plain-text rendering for the command line

use std::fmt::Write;

use crate::models::{BackendHealth, ViewModel};
use crate::pipeline::format::{format_count, format_duration, format_number, format_percent};

pub fn render_view(view: &ViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Results for {}", view.domain);
    let _ = writeln!(out, "{}", "-".repeat(40));
    let _ = writeln!(out, "{:<22} {}", "Unique Visitors", format_count(view.visitors));
    let _ = writeln!(out, "{:<22} {}", "Pageviews", format_count(view.pageviews));
    let _ = writeln!(out, "{:<22} {}", "Bounce Rate", format_percent(view.bounce_rate));
    let _ = writeln!(
        out,
        "{:<22} {}",
        "Avg. Visit Duration",
        format_duration(view.visit_duration)
    );

    if !view.traffic_sources.is_empty() {
        let _ = writeln!(out, "\nTop Traffic Sources");
        for source in &view.traffic_sources {
            let _ = writeln!(out, "  {} — {}", source.channel, format_number(source.value));
        }
    }

    let _ = writeln!(out, "\nData provided by: {}", view.data_source);
    out
}

pub fn render_health(health: &BackendHealth) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<28} {}", "Status", health.status);
    if let Some(ref version) = health.version {
        let _ = writeln!(out, "{:<28} {}", "Version", version);
    }
    if let Some(ref timestamp) = health.timestamp {
        let _ = writeln!(out, "{:<28} {}", "Timestamp", timestamp);
    }
    if let Some(configured) = health.similarweb_api_configured {
        let _ = writeln!(
            out,
            "{:<28} {}",
            "SimilarWeb API configured",
            if configured { "yes" } else { "no" }
        );
    }
    out
}
