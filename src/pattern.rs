//! Route patterns and their compilation.
//!
//! A pattern is compiled exactly once, at registration time, into a
//! [`regex::Regex`] plus an ordered list of parameter names. Dispatch never
//! parses pattern syntax — it only runs compiled matchers.
//!
//! # Template syntax
//!
//! - literal segments match verbatim: `/about`
//! - `:name` matches one non-`/` segment, captured as `name`
//! - `:name(regex)` additionally requires the captured text to satisfy
//!   `regex`; a failed constraint makes the *registration* non-matching,
//!   not the request — the dispatcher keeps scanning
//! - a segment may hold two parameters split by a literal, as in
//!   `/flights/:from-:to`, each capturing independently
//! - a trailing slash on the request path is tolerated: `/about/` matches
//!   the pattern `/about`
//!
//! A bare [`regex::Regex`] (instead of a string) is a raw pattern: it is
//! searched against the full path and captures nothing.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::Error;

/// How a compiled template is anchored against the request path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Anchor {
    /// The whole path must match (routes).
    Full,
    /// The path must start with the template, ending at a segment boundary
    /// (scoped middleware). `/user` matches `/user` and `/user/42`, never
    /// `/username`.
    Prefix,
}

/// A compiled route pattern.
///
/// Built from a string template or a raw [`Regex`] via the registration
/// methods on [`Router`](crate::Router); you normally never name this type.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    kind: Kind,
}

#[derive(Clone)]
enum Kind {
    Template {
        regex: Regex,
        /// Capture names in template order; group `p{i}` holds `params[i]`.
        params: Vec<String>,
        anchor: Anchor,
    },
    Raw(Regex),
}

impl Pattern {
    /// Compiles a string template. Fails fast on malformed syntax.
    pub(crate) fn template(source: &str, anchor: Anchor) -> Result<Self, Error> {
        let (regex, params) = compile_template(source, anchor)?;
        Ok(Self {
            source: source.to_owned(),
            kind: Kind::Template { regex, params, anchor },
        })
    }

    /// Wraps a raw regex. Matches by search against the full path.
    pub(crate) fn raw(regex: Regex) -> Self {
        Self { source: regex.as_str().to_owned(), kind: Kind::Raw(regex) }
    }

    /// Matches `path`, returning captured parameters on success.
    ///
    /// Raw patterns capture nothing and return an empty map.
    pub(crate) fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        match &self.kind {
            Kind::Raw(regex) => regex.is_match(path).then(HashMap::new),
            Kind::Template { regex, params, anchor } => {
                let caps = regex.captures(path)?;
                if *anchor == Anchor::Prefix {
                    // The match must stop at a segment boundary: `/user`
                    // scopes `/user/42` but not `/username`.
                    let end = caps.get(0)?.end();
                    if end != path.len() && path.as_bytes()[end] != b'/' {
                        return None;
                    }
                }
                let mut bound = HashMap::with_capacity(params.len());
                for (i, name) in params.iter().enumerate() {
                    if let Some(m) = caps.name(&format!("p{i}")) {
                        bound.insert(name.clone(), m.as_str().to_owned());
                    }
                }
                Some(bound)
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({})", self.source)
    }
}

// ── Conversion into a pattern ────────────────────────────────────────────────

/// Anything accepted as a route pattern: a string template or a raw
/// [`Regex`].
///
/// Sealed — the two representations above are the whole story.
pub trait IntoPattern: private::Sealed {
    #[doc(hidden)]
    fn into_pattern(self) -> Result<Pattern, Error>;
}

mod private {
    pub trait Sealed {}
}

impl private::Sealed for &str {}
impl private::Sealed for String {}
impl private::Sealed for Regex {}
impl private::Sealed for Pattern {}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<Pattern, Error> {
        Pattern::template(self, Anchor::Full)
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<Pattern, Error> {
        Pattern::template(&self, Anchor::Full)
    }
}

impl IntoPattern for Regex {
    fn into_pattern(self) -> Result<Pattern, Error> {
        Ok(Pattern::raw(self))
    }
}

/// Used by `RouteScope`, which compiles once and re-registers per method.
impl IntoPattern for Pattern {
    fn into_pattern(self) -> Result<Pattern, Error> {
        Ok(self)
    }
}

// ── Template compiler ────────────────────────────────────────────────────────

/// Default sub-pattern for an unconstrained `:name`.
///
/// Full matches are non-greedy so compound segments split at the first
/// literal (`/flights/:from-:to` on `A-B-C` binds `from = "A"`). Prefix
/// matches are greedy: with no trailing anchor a non-greedy capture would
/// stop after one character.
fn default_subpattern(anchor: Anchor) -> &'static str {
    match anchor {
        Anchor::Full => "[^/]+?",
        Anchor::Prefix => "[^/]+",
    }
}

fn compile_template(source: &str, anchor: Anchor) -> Result<(Regex, Vec<String>), Error> {
    // Prefix templates drop trailing slashes so `/` scopes every path.
    let template = match anchor {
        Anchor::Full => source,
        Anchor::Prefix => source.trim_end_matches('/'),
    };

    let bytes = template.as_bytes();
    let mut pattern = String::from("^");
    let mut params: Vec<String> = Vec::new();
    let mut i = 0;
    let mut lit_start = 0;

    while i < bytes.len() {
        if bytes[i] != b':' {
            i += 1;
            continue;
        }

        if i > lit_start {
            pattern.push_str(&regex::escape(&template[lit_start..i]));
        }
        i += 1;

        let name_start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        if i == name_start {
            return Err(Error::pattern(source, "`:` must be followed by a parameter name"));
        }
        let name = &template[name_start..i];

        let constraint = if i < bytes.len() && bytes[i] == b'(' {
            let open = i;
            let mut depth = 0usize;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => {
                        i += 2;
                        continue;
                    }
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            if depth != 0 {
                return Err(Error::pattern(source, "unbalanced `(` in parameter constraint"));
            }
            Some(&template[open + 1..i - 1])
        } else {
            None
        };

        pattern.push_str(&format!(
            "(?P<p{}>{})",
            params.len(),
            constraint.unwrap_or(default_subpattern(anchor)),
        ));
        params.push(name.to_owned());
        lit_start = i;
    }

    if lit_start < bytes.len() {
        pattern.push_str(&regex::escape(&template[lit_start..]));
    }
    if anchor == Anchor::Full {
        pattern.push_str("/?$");
    }

    let regex = Regex::new(&pattern)
        .map_err(|e| Error::pattern(source, e.to_string()))?;
    Ok((regex, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(source: &str) -> Pattern {
        Pattern::template(source, Anchor::Full).unwrap()
    }

    fn prefix(source: &str) -> Pattern {
        Pattern::template(source, Anchor::Prefix).unwrap()
    }

    #[test]
    fn literal_matches_verbatim() {
        let p = full("/about");
        assert!(p.matches("/about").is_some());
        assert!(p.matches("/about/").is_some());
        assert!(p.matches("/abouts").is_none());
        assert!(p.matches("/about/us").is_none());
    }

    #[test]
    fn literal_with_regex_metacharacters() {
        let p = full("/random.txt");
        assert!(p.matches("/random.txt").is_some());
        // The dot is escaped, not a wildcard.
        assert!(p.matches("/randomxtxt").is_none());
    }

    #[test]
    fn named_params_capture_in_order() {
        let p = full("/users/:userId/books/:bookId");
        let params = p.matches("/users/42/books/7").unwrap();
        assert_eq!(params["userId"], "42");
        assert_eq!(params["bookId"], "7");
    }

    #[test]
    fn param_does_not_cross_segments() {
        let p = full("/users/:id");
        assert!(p.matches("/users/42/books").is_none());
    }

    #[test]
    fn compound_segment_splits_at_first_literal() {
        let p = full("/flights/:from-:to");
        let params = p.matches("/flights/LAX-JFK").unwrap();
        assert_eq!(params["from"], "LAX");
        assert_eq!(params["to"], "JFK");

        let params = p.matches("/flights/A-B-C").unwrap();
        assert_eq!(params["from"], "A");
        assert_eq!(params["to"], "B-C");
    }

    #[test]
    fn regex_constraint_gates_the_match() {
        let p = full(r"/user/:userId(\d+)");
        let params = p.matches("/user/123").unwrap();
        assert_eq!(params["userId"], "123");
        assert!(p.matches("/user/abc").is_none());
    }

    #[test]
    fn constraint_with_nested_groups() {
        let p = full(r"/files/:name((?:img|doc)-\d+)");
        assert_eq!(p.matches("/files/img-9").unwrap()["name"], "img-9");
        assert!(p.matches("/files/vid-9").is_none());
    }

    #[test]
    fn raw_regex_searches_the_path() {
        let p = Pattern::raw(Regex::new("a").unwrap());
        assert!(p.matches("/apple").is_some());
        assert!(p.matches("/random").is_some());
        assert!(p.matches("/book").is_none());
        assert!(p.matches("/apple").unwrap().is_empty());
    }

    #[test]
    fn prefix_stops_at_segment_boundaries() {
        let p = prefix("/birds");
        assert!(p.matches("/birds").is_some());
        assert!(p.matches("/birds/about").is_some());
        assert!(p.matches("/birdseed").is_none());
    }

    #[test]
    fn prefix_root_scopes_everything() {
        let p = prefix("/");
        assert!(p.matches("/").is_some());
        assert!(p.matches("/anything/at/all").is_some());
    }

    #[test]
    fn prefix_binds_params() {
        let p = prefix("/user/:id");
        let params = p.matches("/user/42/books").unwrap();
        assert_eq!(params["id"], "42");
    }

    #[test]
    fn empty_param_name_is_rejected() {
        let err = Pattern::template("/users/:", Anchor::Full).unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }

    #[test]
    fn unbalanced_constraint_is_rejected() {
        let err = Pattern::template(r"/user/:id(\d+", Anchor::Full).unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }

    #[test]
    fn invalid_constraint_regex_is_rejected() {
        let err = Pattern::template("/user/:id([)", Anchor::Full).unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }
}
