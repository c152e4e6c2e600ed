/// Shared types used across the codebase
use serde::{Deserialize, Serialize};

/// Gender variants recognized by the profile model and the body-fat formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Accepted wire values, in order, for validation messages
pub const GENDERS: [&str; 2] = ["male", "female"];

impl Gender {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}
