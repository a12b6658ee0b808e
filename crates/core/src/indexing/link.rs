use super::file_indexer::{PendingLink, PendingReference};
use crate::graph::GraphBuilder;
use crate::model::Relationship;
use crate::util::uri_to_path;
use symgraph_api::RelationshipType;
use tracing::debug;

/// Resolve references and document links against the merged graph.
///
/// Each reference becomes an edge from the innermost node enclosing the
/// reference site to the referenced node. Sites in files that were not
/// indexed, and references a node makes to itself, are dropped.
pub(crate) fn link(
    builder: &mut GraphBuilder,
    references: &[PendingReference],
    links: &[PendingLink],
) -> usize {
    let mut edges = Vec::new();

    for reference in references {
        if !builder.contains_node(&reference.target) {
            continue;
        }
        let Some(path) = uri_to_path(&reference.location.uri) else {
            debug!(uri = %reference.location.uri, "reference outside the file system");
            continue;
        };
        let Some(caller) = builder.node_at(&path, reference.location.range.start) else {
            debug!(path = %path.display(), "reference from unindexed file");
            continue;
        };
        if caller.id() == &reference.target {
            continue;
        }
        let kind = if reference.target_kind.is_callable() {
            RelationshipType::Calls
        } else {
            RelationshipType::Uses
        };
        edges.push(Relationship::new(
            caller.id().clone(),
            reference.target.clone(),
            kind,
            reference.scope.clone(),
        ));
    }

    for link in links {
        let Some(target) = uri_to_path(&link.target_uri)
            .and_then(|path| builder.file_node(&path).map(|node| node.id().clone()))
        else {
            continue;
        };
        if target == link.source || !builder.contains_node(&link.source) {
            continue;
        }
        edges.push(Relationship::new(
            link.source.clone(),
            target,
            RelationshipType::Imports,
            link.scope.clone(),
        ));
    }

    let linked = edges.len();
    for edge in edges {
        builder.add_relationship(edge);
    }
    linked
}
