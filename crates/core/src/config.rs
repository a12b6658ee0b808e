use crate::model::{KindMapping, KindTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use symgraph_api::{NodeKind, SymbolKind};

/// What to do with relationships left pointing at nodes that an incremental
/// update removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleEdgePolicy {
    /// Drop them and log a warning.
    #[default]
    Prune,
    /// Fail the update.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Ask `textDocument/definition` when a declaration query comes back empty.
    pub declaration_fallback: bool,
    pub collect_references: bool,
    /// Turn document links between indexed files into IMPORTS edges.
    pub link_documents: bool,
    pub stale_edges: StaleEdgePolicy,
    /// LSP symbol kind code -> node kind; `null` drops the kind.
    pub kind_overrides: BTreeMap<u32, Option<NodeKind>>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            declaration_fallback: false,
            collect_references: true,
            link_documents: true,
            stale_edges: StaleEdgePolicy::Prune,
            kind_overrides: BTreeMap::new(),
        }
    }
}

impl IndexerConfig {
    pub fn kind_table(&self) -> KindTable {
        self.kind_overrides
            .iter()
            .fold(KindTable::new(), |table, (&code, mapping)| {
                let mapping = match mapping {
                    Some(kind) => KindMapping::Mapped(*kind),
                    None => KindMapping::Unmapped,
                };
                table.with_override(SymbolKind::from_code(code), mapping)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexerConfig::default();
        assert!(!config.declaration_fallback);
        assert!(config.collect_references);
        assert!(config.link_documents);
        assert_eq!(config.stale_edges, StaleEdgePolicy::Prune);
    }

    #[test]
    fn test_overrides_reach_kind_table() {
        let config: IndexerConfig = serde_json::from_str(
            r#"{"stale_edges": "reject", "kind_overrides": {"5": "STRUCT", "13": null}}"#,
        )
        .unwrap();
        assert_eq!(config.stale_edges, StaleEdgePolicy::Reject);

        let table = config.kind_table();
        assert_eq!(
            table.lookup(SymbolKind::Class),
            KindMapping::Mapped(NodeKind::Struct)
        );
        assert_eq!(table.lookup(SymbolKind::Variable), KindMapping::Unmapped);
        assert_eq!(
            table.lookup(SymbolKind::Function),
            KindMapping::Mapped(NodeKind::Function)
        );
    }
}
