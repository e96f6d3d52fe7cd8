//! Declarative validation rules.

use std::net::IpAddr;

use url::{Host, Url};

/// One step of a field's validation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Blank input fails with the given message and stops the chain.
    Required(&'static str),
    /// Blank input stops the chain without an error.
    Optional,
    /// Character count must be within `min..=max`.
    Length { min: usize, max: usize },
    /// An absolute URL with a scheme, a host, and a dotted domain or IP.
    Url,
    /// Input must parse as an integer.
    Numeric,
}

/// Whether the chain continues after a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub const INVALID_URL: &str = "Invalid URL.";
pub const INVALID_INTEGER: &str = "Not a valid integer value.";

impl Rule {
    pub fn check(&self, raw: &str, errors: &mut Vec<String>) -> Flow {
        let blank = raw.trim().is_empty();
        match *self {
            Rule::Required(message) => {
                if blank {
                    errors.push(message.to_string());
                    return Flow::Stop;
                }
            }
            Rule::Optional => {
                if blank {
                    errors.clear();
                    return Flow::Stop;
                }
            }
            Rule::Length { min, max } => {
                let len = raw.chars().count();
                if len < min || len > max {
                    errors.push(format!("Field must be between {min} and {max} characters long."));
                }
            }
            Rule::Url => {
                if !is_valid_url(raw.trim()) {
                    errors.push(INVALID_URL.to_string());
                }
            }
            Rule::Numeric => {
                if raw.trim().parse::<i64>().is_err() {
                    errors.push(INVALID_INTEGER.to_string());
                }
            }
        }
        Flow::Continue
    }
}

/// Run a chain of rules over `raw`, returning the collected messages.
pub fn run(rules: &[Rule], raw: &str) -> (Vec<String>, Flow) {
    let mut errors = Vec::new();
    for rule in rules {
        if rule.check(raw, &mut errors) == Flow::Stop {
            return (errors, Flow::Stop);
        }
    }
    (errors, Flow::Continue)
}

fn is_valid_url(raw: &str) -> bool {
    // Url::parse accepts "host:port" as scheme + path; insist on "://".
    if !raw.contains("://") {
        return false;
    }
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    match url.host() {
        Some(Host::Domain(domain)) => {
            if domain.parse::<IpAddr>().is_ok() {
                return true;
            }
            let Some((_, tld)) = domain.trim_end_matches('.').rsplit_once('.') else {
                return false;
            };
            (!tld.is_empty() && tld.chars().all(|c| c.is_ascii_alphabetic() || c == '-'))
                || tld.starts_with("xn--")
        }
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    }
}
