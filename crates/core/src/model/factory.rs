use super::id::NodeId;
use super::kind::{KindMapping, KindTable};
use super::node::Node;
use std::path::Path;
use std::sync::Arc;
use symgraph_api::{Location, SymbolKind};

/// Builds typed nodes from resolved symbols.
pub struct NodeFactory<'a> {
    kinds: &'a KindTable,
}

impl<'a> NodeFactory<'a> {
    pub fn new(kinds: &'a KindTable) -> Self {
        Self { kinds }
    }

    /// `None` when the symbol kind has no node type.
    ///
    /// Identity comes from the declaration, never from the document the
    /// symbol was reported in.
    pub fn create(
        &self,
        kind: SymbolKind,
        name: &str,
        qualified_name: &str,
        declaration: &Location,
        scope: &Arc<Path>,
    ) -> Option<Node> {
        let KindMapping::Mapped(node_kind) = self.kinds.lookup(kind) else {
            return None;
        };
        Some(Node::new(
            NodeId::derive(&declaration.uri, qualified_name, node_kind),
            node_kind,
            name,
            &declaration.uri,
            Some(declaration.range),
            scope.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symgraph_api::{NodeKind, Position, Range};

    fn declaration(uri: &str) -> Location {
        Location::new(uri, Range::new(Position::new(2, 0), Position::new(6, 1)))
    }

    #[test]
    fn test_identity_uses_declaration_uri() {
        let table = KindTable::new();
        let factory = NodeFactory::new(&table);
        let scope: Arc<Path> = Path::new("/repo/app.ts").into();

        let node = factory
            .create(
                SymbolKind::Class,
                "Widget",
                "Widget",
                &declaration("file:///repo/widget.ts"),
                &scope,
            )
            .unwrap();
        assert_eq!(node.kind(), NodeKind::Class);
        assert_eq!(node.path(), Path::new("/repo/widget.ts"));
        assert_eq!(
            node.id(),
            &NodeId::derive("file:///repo/widget.ts", "Widget", NodeKind::Class)
        );
    }

    #[test]
    fn test_unmapped_kind_yields_no_node() {
        let table = KindTable::new();
        let factory = NodeFactory::new(&table);
        let scope: Arc<Path> = Path::new("/repo/data.json").into();
        assert!(
            factory
                .create(
                    SymbolKind::Unrecognized(77),
                    "x",
                    "x",
                    &declaration("file:///repo/data.json"),
                    &scope,
                )
                .is_none()
        );
    }
}
