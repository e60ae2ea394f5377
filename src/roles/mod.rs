//! Persona catalog
//!
//! The set of roles is closed: every persona has a [`RoleId`] variant and a
//! matching entry in [`ROLES`]. Lookups go through the id, never through
//! the record itself.
//!
//! # Example
//!
//! ```
//! use roles_chat::roles::{self, RoleId};
//!
//! let tutor = roles::select_role("tutor").unwrap();
//! assert_eq!(tutor.id, RoleId::Tutor);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a built-in persona
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleId {
    Assistant,
    Creative,
    Tutor,
    Developer,
    Therapist,
    Motivator,
}

impl RoleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleId::Assistant => "assistant",
            RoleId::Creative => "creative",
            RoleId::Tutor => "tutor",
            RoleId::Developer => "developer",
            RoleId::Therapist => "therapist",
            RoleId::Motivator => "motivator",
        }
    }

    /// Position of this role in [`ROLES`]
    fn index(&self) -> usize {
        match self {
            RoleId::Assistant => 0,
            RoleId::Creative => 1,
            RoleId::Tutor => 2,
            RoleId::Developer => 3,
            RoleId::Therapist => 4,
            RoleId::Motivator => 5,
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleId {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assistant" => Ok(RoleId::Assistant),
            "creative" => Ok(RoleId::Creative),
            "tutor" => Ok(RoleId::Tutor),
            "developer" => Ok(RoleId::Developer),
            "therapist" => Ok(RoleId::Therapist),
            "motivator" => Ok(RoleId::Motivator),
            _ => Err(RoleError::NotFound(s.to_string())),
        }
    }
}

/// A persona preset: system prompt plus display metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    pub id: RoleId,

    /// Display name
    pub name: &'static str,

    /// One-line description shown on the role card and in the greeting
    pub description: &'static str,

    /// System prompt sent ahead of every conversation
    pub system_prompt: &'static str,

    /// Icon hint for UIs
    pub icon: &'static str,

    /// Accent color hint for UIs
    pub color: &'static str,
}

impl Role {
    /// Look up the record for an id
    pub fn get(id: RoleId) -> &'static Role {
        &ROLES[id.index()]
    }
}

/// Errors from role lookup
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("Role not found: {0}")]
    NotFound(String),
}

/// All roles, in display order
pub static ROLES: [Role; 6] = [
    Role {
        id: RoleId::Assistant,
        name: "Universal Assistant",
        description: "A friendly AI for general questions and tasks.",
        system_prompt: "You are a friendly and helpful assistant, ready to help with any question.",
        icon: "bot",
        color: "blue",
    },
    Role {
        id: RoleId::Creative,
        name: "Creative Partner",
        description: "Generates ideas, stories and creative content.",
        system_prompt: "You are a creative partner who specializes in generating unique ideas, stories and creative content.",
        icon: "palette",
        color: "purple",
    },
    Role {
        id: RoleId::Tutor,
        name: "Tutor",
        description: "Explains complex topics in simple language.",
        system_prompt: "You are a patient tutor who explains complex concepts in simple, clear language.",
        icon: "lightbulb",
        color: "yellow",
    },
    Role {
        id: RoleId::Developer,
        name: "Developer",
        description: "Helps with code and technical questions.",
        system_prompt: "You are an experienced developer, ready to help with programming, debugging and technical decisions.",
        icon: "code",
        color: "green",
    },
    Role {
        id: RoleId::Therapist,
        name: "Psychologist",
        description: "Offers support and emotional advice.",
        system_prompt: "You are an understanding psychologist who provides emotional support and useful advice.",
        icon: "heart",
        color: "pink",
    },
    Role {
        id: RoleId::Motivator,
        name: "Motivator",
        description: "Inspires and supports you in reaching your goals.",
        system_prompt: "You are an energetic motivator who inspires people to reach their goals and overcome obstacles.",
        icon: "zap",
        color: "orange",
    },
];

/// All roles in definition order
pub fn list_roles() -> &'static [Role] {
    &ROLES
}

/// Resolve a role by its string id
pub fn select_role(id: &str) -> Result<&'static Role, RoleError> {
    id.parse::<RoleId>().map(Role::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        let ids: Vec<&str> = list_roles().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            ["assistant", "creative", "tutor", "developer", "therapist", "motivator"]
        );
    }

    #[test]
    fn test_index_matches_table() {
        for role in list_roles() {
            assert_eq!(Role::get(role.id), role);
        }
    }

    #[test]
    fn test_select_role() {
        let role = select_role("developer").unwrap();
        assert_eq!(role.name, "Developer");

        let role = select_role(" Tutor ").unwrap();
        assert_eq!(role.id, RoleId::Tutor);
    }

    #[test]
    fn test_select_unknown_role() {
        let err = select_role("pirate").unwrap_err();
        assert!(matches!(err, RoleError::NotFound(ref id) if id == "pirate"));
    }

    #[test]
    fn test_role_id_serde() {
        let json = serde_json::to_string(&RoleId::Motivator).unwrap();
        assert_eq!(json, "\"motivator\"");
        assert_eq!(RoleId::Motivator.to_string(), "motivator");
    }
}
