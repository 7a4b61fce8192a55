//! Domain input handling

/// Trimmed domain, or `None` when there is nothing to analyze.
pub fn validate(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Reduce a pasted URL to a bare host: drop scheme, path and a leading `www.`,
/// then lowercase.
pub fn normalize(domain: &str) -> String {
    let mut host = domain.trim();

    for scheme in ["https://", "http://"] {
        if host.len() >= scheme.len() && host[..scheme.len()].eq_ignore_ascii_case(scheme) {
            host = &host[scheme.len()..];
            break;
        }
    }

    if let Some(end) = host.find(['/', '?', '#']) {
        host = &host[..end];
    }

    let lowered = host.to_lowercase();
    match lowered.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}
