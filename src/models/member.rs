//! Member (subject) profiles
//!
//! The patient profile being assessed. Created by user action, never mutated
//! after creation except by re-selection; exactly one member is active per
//! session at any time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A patient profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: Uuid,
    pub name: String,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            member_id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
