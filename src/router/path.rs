//! Path patterns for HTTP mocks.
//!
//! Templates use `:name` segments (`/users/:id/posts`). They match
//! case-insensitively and tolerate a single trailing slash. Captured segment
//! values are URL-decoded. Regex patterns are used as written; named groups
//! capture by name and unnamed groups by their zero-based order among the
//! unnamed ones.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::{MockServerError, Result};

/// Parameters captured from a request path.
pub type PathParams = HashMap<String, String>;

/// A compiled mock path.
#[derive(Clone)]
pub enum PathPattern {
    Template {
        source: String,
        regex: Regex,
        keys: Vec<String>,
    },
    Regex(Regex),
}

impl PathPattern {
    /// Compile a `:name` template.
    pub fn template(source: &str) -> Result<Self> {
        let mut pattern = String::from("(?i)^");
        let mut keys = Vec::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            if c == ':' && chars.peek().is_some_and(|next| is_key_char(*next)) {
                let mut key = String::new();
                while let Some(next) = chars.peek().copied().filter(|next| is_key_char(*next)) {
                    key.push(next);
                    chars.next();
                }
                keys.push(key);
                pattern.push_str("([^/#?]+?)");
            } else {
                pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
            }
        }
        pattern.push_str("/?$");

        let regex = compile(source, &pattern)?;
        Ok(Self::Template {
            source: source.to_string(),
            regex,
            keys,
        })
    }

    /// Compile a regular expression pattern.
    pub fn regex(source: &str) -> Result<Self> {
        compile(source, source).map(Self::Regex)
    }

    /// Registry key identifying this pattern; templates and regexes with the
    /// same text stay distinct.
    pub fn key(&self) -> String {
        match self {
            Self::Template { source, .. } => source.clone(),
            Self::Regex(regex) => format!("/{}/", regex.as_str()),
        }
    }

    /// Match `path`, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        match self {
            Self::Template { regex, keys, .. } => {
                let captures = regex.captures(path)?;
                let params = keys
                    .iter()
                    .zip(captures.iter().skip(1))
                    .filter_map(|(key, value)| Some((key.clone(), decode(value?.as_str()))))
                    .collect();
                Some(params)
            }
            Self::Regex(regex) => {
                let captures = regex.captures(path)?;
                let mut params = PathParams::new();
                let mut unnamed = 0;
                for (i, name) in regex.capture_names().enumerate().skip(1) {
                    let key = match name {
                        Some(name) => name.to_string(),
                        None => {
                            unnamed += 1;
                            (unnamed - 1).to_string()
                        }
                    };
                    if let Some(value) = captures.get(i) {
                        params.insert(key, decode(value.as_str()));
                    }
                }
                Some(params)
            }
        }
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template { source, .. } => f.debug_tuple("Template").field(source).finish(),
            Self::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn compile(source: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source_err| MockServerError::InvalidPath {
        pattern: source.to_string(),
        source: source_err,
    })
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
