//! The fixed tag vocabulary and tag mutation actions.

use std::fmt;
use std::str::FromStr;

use crate::error::ViewerError;

/// A workflow label that can be attached to a markdown file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Done,
    InProgress,
    Next,
    Important,
    Revisit,
    Archive,
}

impl Tag {
    pub const ALL: [Tag; 6] = [
        Tag::Done,
        Tag::InProgress,
        Tag::Next,
        Tag::Important,
        Tag::Revisit,
        Tag::Archive,
    ];

    /// The on-disk and wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Done => "DONE",
            Tag::InProgress => "IN-PROGRESS",
            Tag::Next => "NEXT",
            Tag::Important => "IMPORTANT",
            Tag::Revisit => "REVISIT",
            Tag::Archive => "ARCHIVE",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = ViewerError;

    /// Exact, case-sensitive match against the vocabulary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ViewerError::InvalidTag(s.to_string()))
    }
}

/// What `POST /api/tag` does to a file's tag list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAction {
    Add,
    Remove,
    Clear,
}

impl FromStr for TagAction {
    type Err = ViewerError;

    /// An empty action means `add`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "add" => Ok(TagAction::Add),
            "remove" => Ok(TagAction::Remove),
            "clear" => Ok(TagAction::Clear),
            other => Err(ViewerError::InvalidAction(other.to_string())),
        }
    }
}
