use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// School subject a note belongs to.
///
/// The set is closed: every persisted note carries exactly one of these
/// categories, and records with anything else are dropped on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Math,
    English,
    Chinese,
    Physics,
    Chemistry,
}

impl Subject {
    /// All subjects in display order.
    pub const ALL: [Subject; 5] = [
        Subject::Math,
        Subject::English,
        Subject::Chinese,
        Subject::Physics,
        Subject::Chemistry,
    ];

    /// Returns the lowercase token used in the JSON store and the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::English => "english",
            Self::Chinese => "chinese",
            Self::Physics => "physics",
            Self::Chemistry => "chemistry",
        }
    }

    /// Returns the Chinese display label shown to the student.
    pub fn label(self) -> &'static str {
        match self {
            Self::Math => "数学",
            Self::English => "英语",
            Self::Chinese => "语文",
            Self::Physics => "物理",
            Self::Chemistry => "化学",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognized subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSubject(pub String);

impl fmt::Display for UnknownSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown subject: {}", self.0)
    }
}

impl std::error::Error for UnknownSubject {}

impl FromStr for Subject {
    type Err = UnknownSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "math" => Ok(Self::Math),
            "english" => Ok(Self::English),
            "chinese" => Ok(Self::Chinese),
            "physics" => Ok(Self::Physics),
            "chemistry" => Ok(Self::Chemistry),
            other => Err(UnknownSubject(other.to_string())),
        }
    }
}
