//! `$orderby` clauses

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A single sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = String;

    /// Parses `field`, `field asc` or `field desc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| "Empty orderby clause".to_string())?;

        let direction = match parts.next().map(|d| d.to_ascii_lowercase()) {
            None => Direction::Asc,
            Some(d) if d == "asc" => Direction::Asc,
            Some(d) if d == "desc" => Direction::Desc,
            Some(d) => return Err(format!("Invalid sort direction '{}'", d)),
        };

        if parts.next().is_some() {
            return Err(format!("Unexpected trailing input in orderby clause '{}'", s));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}
