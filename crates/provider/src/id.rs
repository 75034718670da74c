//! Composite resource IDs for cluster-scoped resources.
//!
//! Sub-resources such as database users have no server-assigned ID of
//! their own. Their Terraform ID is `<parent_id>:<name>`, built and
//! split here so the format lives in exactly one place.

use cirrus_common::{Error, Result};

const SEPARATOR: char = ':';

/// Build a composite ID from a parent ID and a child name.
pub fn construct(parent_id: &str, name: &str) -> String {
    format!("{parent_id}{SEPARATOR}{name}")
}

/// Split a composite ID back into `(parent_id, name)`.
///
/// Only the first separator splits, so names may themselves contain
/// the separator character.
pub fn deconstruct(id: &str) -> Result<(String, String)> {
    match id.split_once(SEPARATOR) {
        Some((parent, name)) if !parent.is_empty() && !name.is_empty() => {
            Ok((parent.to_string(), name.to_string()))
        }
        _ => Err(Error::InvalidConfig(format!(
            "malformed resource ID {id:?}: expected <parent_id>{SEPARATOR}<name>"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let id = construct("c9qm1ab2", "app_user");
        assert_eq!(id, "c9qm1ab2:app_user");
        let (parent, name) = deconstruct(&id).unwrap();
        assert_eq!(parent, "c9qm1ab2");
        assert_eq!(name, "app_user");
    }

    #[test]
    fn first_separator_wins() {
        let (parent, name) = deconstruct("cluster:user:with:colons").unwrap();
        assert_eq!(parent, "cluster");
        assert_eq!(name, "user:with:colons");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(deconstruct("no-separator").is_err());
        assert!(deconstruct(":name").is_err());
        assert!(deconstruct("parent:").is_err());
        assert!(deconstruct("").is_err());
    }
}
