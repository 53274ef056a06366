//! Workflow status of texts, sections and books

use crate::error::BookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Writing status; ordered from least to most finished
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Started,
    Outline,
    Incomplete,
    Draft,
    Written,
    Revised,
    Done,
    Proofs,
    Final,
}

impl Status {
    /// All statuses in order
    pub const ALL: [Status; 9] = [
        Status::Started,
        Status::Outline,
        Status::Incomplete,
        Status::Draft,
        Status::Written,
        Status::Revised,
        Status::Done,
        Status::Proofs,
        Status::Final,
    ];

    /// Lowercase name as stored in frontmatter
    pub fn name(&self) -> &'static str {
        match self {
            Status::Started => "started",
            Status::Outline => "outline",
            Status::Incomplete => "incomplete",
            Status::Draft => "draft",
            Status::Written => "written",
            Status::Revised => "revised",
            Status::Done => "done",
            Status::Proofs => "proofs",
            Status::Final => "final",
        }
    }

    /// Display colour (CSS colour name)
    pub fn color(&self) -> &'static str {
        match self {
            Status::Started => "gray",
            Status::Outline => "salmon",
            Status::Incomplete => "tomato",
            Status::Draft => "crimson",
            Status::Written => "dodgerblue",
            Status::Revised => "blue",
            Status::Done => "forestgreen",
            Status::Proofs => "yellowgreen",
            Status::Final => "black",
        }
    }

    /// Look up a status by its name
    pub fn lookup(name: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Status {
    /// Capitalized name, as shown to readers
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for Status {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::lookup(&s.trim().to_lowercase())
            .ok_or_else(|| BookError::InvalidStatus(s.to_string()))
    }
}
