//! Typed addresses into the state tree.
//!
//! The textual form is slash-delimited (`/impressions/<uuid>/inputValues/Key Data`).
//! Keys that themselves contain `/` are wrapped in double quotes, e.g.
//! `/localVisAssets/"colormaps/blue"/artifactType`, which is also how the
//! server splits request paths.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::{ClientError, ClientResult};

/// A sequence of key segments from the state root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatePath {
    segments: Vec<String>,
}

impl StatePath {
    /// The root of the state document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from already-split segments. Empty segments are dropped.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// Parse the slash-delimited form.
    ///
    /// Empty segments are ignored, so `/a//b/` and `a/b` are the same path.
    pub fn parse(text: &str) -> ClientResult<Self> {
        if text.matches('"').count() % 2 != 0 {
            return Err(ClientError::InvalidPath(format!("unbalanced quote in {text:?}")));
        }

        let mut segments = Vec::new();
        for (i, part) in text.split('"').enumerate() {
            if i % 2 == 0 {
                segments.extend(part.split('/').filter(|s| !s.is_empty()).map(String::from));
            } else if !part.is_empty() {
                segments.push(part.to_string());
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last key, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path one level down.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        let key = key.into();
        if !key.is_empty() {
            segments.push(key);
        }
        Self { segments }
    }

    /// Path one level up; `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &StatePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Segments as they must appear in an API URL: quoted when they contain `/`.
    pub fn url_segments(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.segments.iter().map(|s| quote_segment(s))
    }
}

fn quote_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('/') {
        Cow::Owned(format!("\"{segment}\""))
    } else {
        Cow::Borrowed(segment)
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in self.url_segments() {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for StatePath {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<S: Into<String>> FromIterator<S> for StatePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_segments(iter)
    }
}

impl Serialize for StatePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StatePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        StatePath::parse(&text).map_err(serde::de::Error::custom)
    }
}
