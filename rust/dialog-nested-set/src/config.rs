use serde::{Deserialize, Serialize};

/// How a rebuild orders siblings, since parent references alone carry no
/// sibling order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildOrder {
    /// Ascending id; stable regardless of the current intervals
    #[default]
    Id,
    /// Ascending current `lft`, ties broken by id; keeps the existing sibling
    /// order when only depths or right bounds are suspect
    Lft,
}

/// Configuration for a [crate::NestedSet]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedSetConfig {
    /// Sibling order used by [crate::TreeRebuilder::rebuild_tree]
    pub rebuild_order: RebuildOrder,

    /// Verify every invariant inside each mutation's transaction before it
    /// commits, rolling back if anything is broken
    pub verify_after_mutation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_fills_missing_fields_with_defaults() {
        let config: NestedSetConfig =
            serde_json::from_str(r#"{ "rebuild_order": "lft" }"#).unwrap();

        assert_eq!(
            config,
            NestedSetConfig {
                rebuild_order: RebuildOrder::Lft,
                verify_after_mutation: false,
            }
        );
    }
}
