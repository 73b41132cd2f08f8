//! Visibility of streams and chat spaces
//!
//! The resolvers never look at the raw visibility value directly. They ask
//! for its [`VisibilityClass`], which is what the join rules branch on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse visibility category the join rules branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityClass {
    /// Anyone can join
    Public,
    /// Private, protected or confidential: joining needs approval
    Restricted,
}

/// Visibility of a stream (event/broadcast)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamVisibility {
    Public,
    Private,
    Protected,
    Confidential,
    Unlisted,
}

impl StreamVisibility {
    /// Parse visibility from its database string
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PUBLIC" => Some(Self::Public),
            "PRIVATE" => Some(Self::Private),
            "PROTECTED" => Some(Self::Protected),
            "CONFIDENTIAL" => Some(Self::Confidential),
            "UNLISTED" => Some(Self::Unlisted),
            _ => None,
        }
    }

    pub fn to_db(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Protected => "PROTECTED",
            Self::Confidential => "CONFIDENTIAL",
            Self::Unlisted => "UNLISTED",
        }
    }

    /// Classify for the join rules.
    ///
    /// `Unlisted` belongs to neither class: the stream resolver has no rule
    /// for it, so it falls through to the catch-all.
    pub fn class(&self) -> Option<VisibilityClass> {
        match self {
            Self::Public => Some(VisibilityClass::Public),
            Self::Private | Self::Protected | Self::Confidential => {
                Some(VisibilityClass::Restricted)
            }
            Self::Unlisted => None,
        }
    }

    pub fn is_private_or_protected(&self) -> bool {
        self.class() == Some(VisibilityClass::Restricted)
    }

    pub fn is_public(&self) -> bool {
        self.class() == Some(VisibilityClass::Public)
    }
}

impl fmt::Display for StreamVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db())
    }
}

impl std::str::FromStr for StreamVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db(s).ok_or_else(|| format!("Invalid stream visibility: {}", s))
    }
}

/// Visibility of a chat space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatSpaceVisibility {
    Public,
    Private,
}

impl ChatSpaceVisibility {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PUBLIC" => Some(Self::Public),
            "PRIVATE" => Some(Self::Private),
            _ => None,
        }
    }

    pub fn to_db(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
        }
    }

    pub fn class(&self) -> VisibilityClass {
        match self {
            Self::Public => VisibilityClass::Public,
            Self::Private => VisibilityClass::Restricted,
        }
    }
}

impl fmt::Display for ChatSpaceVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db())
    }
}

impl std::str::FromStr for ChatSpaceVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db(s).ok_or_else(|| format!("Invalid chat space visibility: {}", s))
    }
}
