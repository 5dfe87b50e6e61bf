// CyberBrowser URL Resolver
// Turns omnibox / home-view input into a URL: verbatim URLs, bare hosts, or a search query
// substituted into the selected engine's template.

use url::form_urlencoded;
use url::Url;

use crate::types::settings::QUERY_PLACEHOLDER;

/// What a piece of user input resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInput {
    /// Nothing but whitespace was entered.
    Empty,
    /// Input already carried a scheme and is used as-is.
    Verbatim(String),
    /// Input looked like a host name and was prefixed with `http://`.
    BareHost(String),
    /// Input was treated as a search query.
    Search(String),
}

impl ResolvedInput {
    /// The URL to load, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            ResolvedInput::Empty => None,
            ResolvedInput::Verbatim(u) | ResolvedInput::BareHost(u) | ResolvedInput::Search(u) => {
                Some(u)
            }
        }
    }

    pub fn into_url(self) -> Option<String> {
        self.url().map(str::to_string)
    }
}

/// Resolves user input against a search template containing a single `{}`.
pub fn resolve_input(input: &str, template: &str) -> ResolvedInput {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ResolvedInput::Empty;
    }
    if has_scheme_prefix(trimmed) || trimmed.starts_with("about:") {
        return ResolvedInput::Verbatim(trimmed.to_string());
    }
    if trimmed.contains('.') && !trimmed.chars().any(char::is_whitespace) {
        return ResolvedInput::BareHost(format!("http://{}", trimmed));
    }
    ResolvedInput::Search(search_url(trimmed, template))
}

/// Substitutes the form-encoded query (spaces become `+`) into `template`.
pub fn search_url(query: &str, template: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    if template.contains(QUERY_PLACEHOLDER) {
        template.replacen(QUERY_PLACEHOLDER, &encoded, 1)
    } else {
        format!("{}{}", template, encoded)
    }
}

/// True when `input` starts with `<scheme>://` where scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
pub fn has_scheme_prefix(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Host component of `url`, without a leading `www.`.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.trim_start_matches("www.").to_string())
}
