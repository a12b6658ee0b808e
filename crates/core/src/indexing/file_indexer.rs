//! Turns one document's symbols into nodes and relationships.

use crate::config::IndexerConfig;
use crate::model::{KindMapping, KindTable, Node, NodeFactory, NodeId, Relationship};
use std::path::Path;
use std::sync::Arc;
use symgraph_api::{ApiResult, Location, NodeKind, RelationshipType, Symbol, SymbolSource};
use tracing::{debug, warn};

/// A reference to `target` found at `location`, resolved once the whole
/// batch is merged.
#[derive(Debug, Clone)]
pub struct PendingReference {
    pub target: NodeId,
    pub target_kind: NodeKind,
    pub location: Location,
    pub scope: Arc<Path>,
}

#[derive(Debug, Clone)]
pub struct PendingLink {
    pub source: NodeId,
    pub target_uri: String,
    pub scope: Arc<Path>,
}

#[derive(Debug, Default)]
pub struct FileIndex {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    pub references: Vec<PendingReference>,
    pub links: Vec<PendingLink>,
    /// Symbols left out: unmapped kind or no resolvable declaration.
    pub skipped_symbols: usize,
}

impl FileIndex {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct Visit<'s> {
    symbol: &'s Symbol,
    parent: Option<usize>,
    /// Container chain inside the document, e.g. `Outer.inner`.
    qualified: String,
}

/// Pre-order, parents before children.
fn flatten(symbols: &[Symbol]) -> Vec<Visit<'_>> {
    let mut visits: Vec<Visit<'_>> = Vec::new();
    let mut stack: Vec<(&Symbol, Option<usize>)> = symbols.iter().rev().map(|s| (s, None)).collect();
    while let Some((symbol, parent)) = stack.pop() {
        let qualified = match parent {
            Some(p) => format!("{}.{}", visits[p].qualified, symbol.name),
            None => symbol.name.clone(),
        };
        let idx = visits.len();
        visits.push(Visit {
            symbol,
            parent,
            qualified,
        });
        stack.extend(symbol.children.iter().rev().map(|c| (c, Some(idx))));
    }
    visits
}

fn kept_ancestor(visits: &[Visit<'_>], kept: &[Option<NodeId>], idx: usize) -> Option<NodeId> {
    let mut cursor = visits[idx].parent;
    while let Some(p) = cursor {
        if let Some(id) = &kept[p] {
            return Some(id.clone());
        }
        cursor = visits[p].parent;
    }
    None
}

/// Per-query failures only cost the symbol; a dead backend stops the file.
fn tolerate<T>(result: ApiResult<T>, symbol: &Symbol) -> ApiResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(symbol = %symbol.name, error = %e, "query failed for symbol");
            Ok(None)
        }
    }
}

pub struct FileIndexer<'a> {
    kinds: &'a KindTable,
    config: &'a IndexerConfig,
}

impl<'a> FileIndexer<'a> {
    pub fn new(kinds: &'a KindTable, config: &'a IndexerConfig) -> Self {
        Self { kinds, config }
    }

    /// Index one opened document.
    ///
    /// A document without symbols, or whose symbols all get skipped,
    /// contributes nothing, not even a File node.
    pub async fn index<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        path: &Path,
        uri: &str,
    ) -> ApiResult<FileIndex> {
        let symbols = source.document_symbols(uri).await?;
        let mut index = FileIndex::default();
        if symbols.is_empty() {
            debug!(path = %path.display(), "no symbols");
            return Ok(index);
        }

        let scope: Arc<Path> = Arc::from(path);
        let file = Node::file(scope.clone(), uri);
        let factory = NodeFactory::new(self.kinds);
        let visits = flatten(&symbols);
        let mut kept: Vec<Option<NodeId>> = Vec::with_capacity(visits.len());

        for (idx, visit) in visits.iter().enumerate() {
            let symbol = visit.symbol;
            if self.kinds.lookup(symbol.kind) == KindMapping::Unmapped {
                debug!(symbol = %symbol.name, kind = ?symbol.kind, "unmapped symbol kind");
                index.skipped_symbols += 1;
                kept.push(None);
                continue;
            }

            let Some(declaration) = self.resolve(source, uri, symbol).await? else {
                warn!(symbol = %symbol.name, uri, "no declaration, skipping symbol");
                index.skipped_symbols += 1;
                kept.push(None);
                continue;
            };

            let local = declaration.uri == uri;
            let qualified = if local {
                visit.qualified.as_str()
            } else {
                symbol.name.as_str()
            };
            // local nodes span the whole symbol so reference sites resolve to them
            let extent = if local {
                Location::new(declaration.uri.clone(), symbol.range)
            } else {
                declaration.clone()
            };
            let Some(node) = factory.create(symbol.kind, &symbol.name, qualified, &extent, &scope)
            else {
                kept.push(None);
                continue;
            };
            let id = node.id().clone();

            if local {
                let parent = kept_ancestor(&visits, &kept, idx).unwrap_or_else(|| file.id().clone());
                let rel_type = if node.kind().is_value() {
                    RelationshipType::Declares
                } else {
                    RelationshipType::Contains
                };
                if parent != id {
                    index
                        .relationships
                        .push(Relationship::new(parent, id.clone(), rel_type, scope.clone()));
                }
                // references to foreign declarations are collected by their own file
                if self.config.collect_references {
                    let position = symbol.query_position();
                    let found = source.references_of(uri, position, &declaration).await;
                    for location in tolerate(found, symbol)?.unwrap_or_default() {
                        index.references.push(PendingReference {
                            target: id.clone(),
                            target_kind: node.kind(),
                            location,
                            scope: scope.clone(),
                        });
                    }
                }
            } else {
                index.relationships.push(Relationship::new(
                    file.id().clone(),
                    id.clone(),
                    RelationshipType::Imports,
                    scope.clone(),
                ));
            }

            index.nodes.push(node);
            kept.push(Some(id));
        }

        if index.nodes.is_empty() {
            debug!(path = %path.display(), "no symbol could be resolved");
            return Ok(FileIndex {
                skipped_symbols: index.skipped_symbols,
                ..FileIndex::default()
            });
        }

        if self.config.link_documents {
            self.collect_links(source, uri, file.id(), &scope, &mut index)
                .await?;
        }

        index.nodes.insert(0, file);
        Ok(index)
    }

    async fn resolve<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        uri: &str,
        symbol: &Symbol,
    ) -> ApiResult<Option<Location>> {
        let position = symbol.query_position();
        let found = source.declaration_of(uri, position).await;
        if let Some(Some(declaration)) = tolerate(found, symbol)? {
            return Ok(Some(declaration));
        }
        if !self.config.declaration_fallback {
            return Ok(None);
        }
        let found = source.definition_of(uri, position).await;
        Ok(tolerate(found, symbol)?.flatten())
    }

    async fn collect_links<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        uri: &str,
        file: &NodeId,
        scope: &Arc<Path>,
        index: &mut FileIndex,
    ) -> ApiResult<()> {
        let links = match source.document_links(uri).await {
            Ok(links) => links,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(uri, error = %e, "document links unavailable");
                return Ok(());
            }
        };
        index.links.extend(links.into_iter().filter_map(|link| {
            link.target.map(|target_uri| PendingLink {
                source: file.clone(),
                target_uri,
                scope: scope.clone(),
            })
        }));
        Ok(())
    }
}
