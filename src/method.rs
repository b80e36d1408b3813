//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 standard methods. Parsing is case-insensitive —
//! the routing core compares methods semantically, not byte-for-byte.
//! Unknown method strings are rejected at the server level with
//! `405 Method Not Allowed` before they ever reach a handler.
//!
//! Route registrations may also be method-wildcards (`Router::all`), which
//! is represented as `Option<Method>` internally — `None` matches any method
//! at that position in the registration order.

use std::fmt;
use std::str::FromStr;

/// A known HTTP method (RFC 9110 §9).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }
}

/// Parses a method string, case-insensitively: `"get"`, `"Get"` and `"GET"`
/// all yield [`Method::Get`].
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const KNOWN: [(&str, Method); 9] = [
            ("CONNECT", Method::Connect),
            ("DELETE",  Method::Delete),
            ("GET",     Method::Get),
            ("HEAD",    Method::Head),
            ("OPTIONS", Method::Options),
            ("PATCH",   Method::Patch),
            ("POST",    Method::Post),
            ("PUT",     Method::Put),
            ("TRACE",   Method::Trace),
        ];
        KNOWN
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, m)| *m)
            .ok_or(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
