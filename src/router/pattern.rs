//! Path template compilation and positional matching.
//!
//! A template such as `/users/:id/files/*` is split into segments once, at
//! registration. Each segment is one of:
//!
//! | Segment  | Matches                    | Captured             |
//! |----------|----------------------------|----------------------|
//! | `users`  | exactly `users`            | *(nothing)*          |
//! | `:id`    | any single segment         | `id → <segment>`     |
//! | `*`      | any single segment         | *(nothing)*          |
//!
//! Request paths are split with [`split_path`], the same function used for
//! templates, so segment counts line up one-to-one.

use std::collections::HashMap;

use crate::context::PathParams;

use super::table::RouteError;

const PARAM_PREFIX: char = ':';
const WILDCARD: &str = "*";

/// Split a path on `/`.
///
/// Leading and interior empty segments are kept, trailing empty segments are
/// dropped, and an empty input yields a single empty segment. `"/users/42/"`
/// therefore splits to `["", "users", "42"]` and `"/"` to `[]`.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return vec![""];
    }
    let mut segments: Vec<&str> = path.split('/').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments
}

/// Returns `true` when `path` must be compiled into a [`PathPattern`] rather
/// than stored as an exact route.
pub(crate) fn is_template(path: &str) -> bool {
    path.contains(PARAM_PREFIX) || path.contains(WILDCARD)
}

// One compiled template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled path template.
///
/// Immutable after [`compile`](Self::compile) and safe to share between
/// threads.
///
/// # Examples
///
/// ```
/// use waymark::router::pattern::{PathPattern, split_path};
///
/// let pattern = PathPattern::compile("/users/:id/posts/:post").unwrap();
/// let params = pattern.matches(&split_path("/users/42/posts/7")).unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("post"), Some("7"));
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    params: HashMap<String, usize>,
}

impl PathPattern {
    /// Compile `template` into a pattern.
    ///
    /// # Errors
    ///
    /// - [`RouteError::EmptyPath`] — the template is empty.
    /// - [`RouteError::EmptyParameterName`] — a segment is a bare `:`.
    /// - [`RouteError::DuplicateParameter`] — the same `:name` appears twice.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        if template.is_empty() {
            return Err(RouteError::EmptyPath);
        }

        let raw = split_path(template);
        let mut segments = Vec::with_capacity(raw.len());
        let mut params = HashMap::new();

        for (index, part) in raw.into_iter().enumerate() {
            if part == WILDCARD {
                segments.push(Segment::Wildcard);
            } else if let Some(name) = part.strip_prefix(PARAM_PREFIX) {
                if name.is_empty() {
                    return Err(RouteError::EmptyParameterName {
                        template: template.to_owned(),
                    });
                }
                if params.insert(name.to_owned(), index).is_some() {
                    return Err(RouteError::DuplicateParameter {
                        template: template.to_owned(),
                        name: name.to_owned(),
                    });
                }
                segments.push(Segment::Param(name.to_owned()));
            } else {
                segments.push(Segment::Literal(part.to_owned()));
            }
        }

        Ok(Self {
            template: template.to_owned(),
            segments,
            params,
        })
    }

    /// Match pre-split request segments against this pattern.
    ///
    /// Returns `None` when the segment counts differ or any literal segment
    /// differs. On success returns the captured parameters, which is empty
    /// (but present) when the template has no named parameters.
    pub fn matches(&self, request: &[&str]) -> Option<PathParams> {
        if request.len() != self.segments.len() {
            return None;
        }

        let literals_match = self
            .segments
            .iter()
            .zip(request)
            .all(|(segment, value)| match segment {
                Segment::Literal(expected) => expected == value,
                Segment::Param(_) | Segment::Wildcard => true,
            });
        if !literals_match {
            return None;
        }

        let mut params = PathParams::with_capacity(self.params.len());
        for (name, &index) in &self.params {
            params.insert(name.clone(), request[index].to_owned());
        }
        Some(params)
    }

    /// The template string this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Number of segments, including leading empty ones.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the template produced no segments (e.g. `"/"`).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if the segment at `index` is a named parameter.
    pub fn is_param(&self, index: usize) -> bool {
        matches!(self.segments.get(index), Some(Segment::Param(_)))
    }

    /// Returns `true` if the segment at `index` is a wildcard.
    pub fn is_wildcard(&self, index: usize) -> bool {
        matches!(self.segments.get(index), Some(Segment::Wildcard))
    }

    /// Iterate over the parameter names and their segment positions.
    pub fn param_names(&self) -> impl Iterator<Item = (&str, usize)> {
        self.params.iter().map(|(name, &index)| (name.as_str(), index))
    }
}
