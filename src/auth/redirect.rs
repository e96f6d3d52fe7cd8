//! Post-login redirect validation.

use url::Url;

/// Decide whether `target` is safe to redirect a freshly logged-in browser to.
///
/// Relative paths are always allowed. Absolute and scheme-relative URLs must
/// use http or https and point at a host listed in `allowed_hosts`; an entry
/// may carry an explicit port (`host:port`), in which case the port must match
/// too. Host comparison is case-insensitive.
pub fn is_safe_url(target: &str, allowed_hosts: &[String]) -> bool {
    let target = target.trim();
    if target.is_empty() {
        return false;
    }
    if target.chars().any(char::is_control) {
        return false;
    }
    // Browsers treat backslashes like slashes, so `/\evil.com` is scheme-relative.
    let normalized = target.replace('\\', "/");
    if normalized.starts_with("///") {
        return false;
    }

    let absolute = if normalized.starts_with("//") {
        format!("http:{normalized}")
    } else if has_scheme(&normalized) {
        normalized
    } else {
        return true;
    };

    let Ok(url) = Url::parse(&absolute) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let port = url.port();

    allowed_hosts.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        match entry.rsplit_once(':') {
            Some((h, p)) if p.chars().all(|c| c.is_ascii_digit()) && !p.is_empty() => {
                h == host && port.map(|port| port.to_string()).as_deref() == Some(p)
            }
            _ => entry == host,
        }
    })
}

/// `scheme:` prefix per RFC 3986 (ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":").
fn has_scheme(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !scheme.contains('/')
}
