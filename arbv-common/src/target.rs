//! Target identifiers
//!
//! A target is one recognizable page marker in the configured set. Ids are
//! the printed page numbers: small, stable, and unique within one book.

use serde::{Deserialize, Serialize};

/// Identifier of one configured target (page number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub u32);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TargetId {
    fn from(id: u32) -> Self {
        TargetId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_id_display() {
        assert_eq!(TargetId(3).to_string(), "3");
    }

    #[test]
    fn test_target_id_serde_transparent() {
        let json = serde_json::to_string(&TargetId(7)).unwrap();
        assert_eq!(json, "7");

        let id: TargetId = serde_json::from_str("7").unwrap();
        assert_eq!(id, TargetId(7));
    }
}
