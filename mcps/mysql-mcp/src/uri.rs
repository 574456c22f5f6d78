//! Schema resource URIs
//!
//! A table's schema is addressed as `<base>/<table>/schema`. The base is the
//! connection URL with credentials, query and fragment removed and the scheme
//! pinned to `mysql`, so the URI names a table without carrying anything
//! needed to log in.
//!
//! The table name is always a single percent-encoded path segment, which
//! makes [`ResourceBase::format`] and [`parse_table_name`] inverses.

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

/// Final path segment of every schema resource URI
pub const SCHEMA_SUFFIX: &str = "schema";

/// Scheme of resource URIs
pub const RESOURCE_SCHEME: &str = "mysql";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("not a valid URL: {0}")]
    Malformed(#[from] url::ParseError),

    #[error("URL has no path segments")]
    NoPath,

    #[error("expected `<table>/schema` at the end of the path, found {0} segment(s)")]
    TooFewSegments(usize),

    #[error("expected final segment `schema`, found `{0}`")]
    WrongSuffix(String),

    #[error("table name segment is empty")]
    EmptyTableName,

    #[error("table name is not valid UTF-8 after decoding")]
    InvalidEncoding,

    #[error("cannot derive a resource base from `{0}` URLs")]
    UnsupportedScheme(String),
}

/// Base URL that schema resource URIs are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBase {
    url: Url,
}

impl ResourceBase {
    /// Derive the base from a database connection URL
    pub fn from_connection_url(connection_url: &str) -> Result<Self, UriError> {
        let mut url = Url::parse(connection_url)?;
        if url.cannot_be_a_base() || !url.has_host() {
            return Err(UriError::UnsupportedScheme(url.scheme().to_string()));
        }

        let scheme = url.scheme().to_string();
        url.set_scheme(RESOURCE_SCHEME)
            .map_err(|_| UriError::UnsupportedScheme(scheme.clone()))?;
        url.set_username("")
            .map_err(|_| UriError::UnsupportedScheme(scheme.clone()))?;
        url.set_password(None)
            .map_err(|_| UriError::UnsupportedScheme(scheme))?;
        url.set_query(None);
        url.set_fragment(None);
        if url.path().is_empty() {
            url.set_path("/");
        }

        Ok(Self { url })
    }

    /// URI of the schema resource for `table`
    pub fn format(&self, table: &str) -> String {
        let mut url = self.url.clone();
        // Checked in from_connection_url: the URL has a host and a path.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(table).push(SCHEMA_SUFFIX);
        }
        url.into()
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// Extract the table name from a schema resource URI
///
/// Only the last two path segments are inspected; the base part of the URI
/// is not compared against the server's own base.
pub fn parse_table_name(uri: &str) -> Result<String, UriError> {
    let url = Url::parse(uri)?;
    let segments: Vec<&str> = url.path_segments().ok_or(UriError::NoPath)?.collect();

    let [.., table, suffix] = segments.as_slice() else {
        return Err(UriError::TooFewSegments(segments.len()));
    };

    if *suffix != SCHEMA_SUFFIX {
        return Err(UriError::WrongSuffix(suffix.to_string()));
    }
    if table.is_empty() {
        return Err(UriError::EmptyTableName);
    }

    percent_decode_str(table)
        .decode_utf8()
        .map(|name| name.into_owned())
        .map_err(|_| UriError::InvalidEncoding)
}
