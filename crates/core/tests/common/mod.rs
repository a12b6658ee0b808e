#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use symgraph_api::{
    ApiError, ApiResult, DocumentLink, GraphStore, Location, NodeRecord, Position, Range,
    RelationshipRecord, Symbol, SymbolKind, SymbolSource,
};
use symgraph_core::store::StoredGraph;
use symgraph_core::util::path_to_uri;

pub fn uri(path: &Path) -> String {
    path_to_uri(path).unwrap()
}

pub fn range(start_line: u32, end_line: u32) -> Range {
    Range::new(Position::new(start_line, 0), Position::new(end_line, 1))
}

pub fn symbol(path: &Path, name: &str, kind: SymbolKind, range: Range) -> Symbol {
    Symbol {
        name: name.into(),
        kind,
        uri: uri(path),
        range,
        selection_range: None,
        children: vec![],
    }
}

pub fn with_children(mut parent: Symbol, children: Vec<Symbol>) -> Symbol {
    parent.children = children;
    parent
}

/// Scripted symbol source. Declarations default to the symbol itself.
#[derive(Default)]
pub struct FakeSource {
    symbols: HashMap<String, Vec<Symbol>>,
    declarations: HashMap<(String, Position), Location>,
    undeclared: HashSet<(String, Position)>,
    references: HashMap<(String, Position), Vec<Location>>,
    links: HashMap<String, Vec<DocumentLink>>,
    failing: HashSet<String>,
    unavailable: HashSet<String>,
    pub opened: Vec<String>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&mut self, path: &Path, symbols: Vec<Symbol>) -> &mut Self {
        self.symbols.insert(uri(path), symbols);
        self
    }

    pub fn declared_at(&mut self, symbol: &Symbol, declaration: Location) -> &mut Self {
        self.declarations
            .insert((symbol.uri.clone(), symbol.query_position()), declaration);
        self
    }

    pub fn undeclared(&mut self, symbol: &Symbol) -> &mut Self {
        self.undeclared
            .insert((symbol.uri.clone(), symbol.query_position()));
        self
    }

    pub fn referenced_from(&mut self, symbol: &Symbol, sites: Vec<Location>) -> &mut Self {
        self.references
            .insert((symbol.uri.clone(), symbol.query_position()), sites);
        self
    }

    pub fn links(&mut self, path: &Path, targets: &[&Path]) -> &mut Self {
        let links = targets
            .iter()
            .map(|target| DocumentLink {
                range: Range::default(),
                target: Some(uri(target)),
            })
            .collect();
        self.links.insert(uri(path), links);
        self
    }

    /// Symbol queries for `path` fail with a per-query error.
    pub fn failing(&mut self, path: &Path) -> &mut Self {
        self.failing.insert(uri(path));
        self
    }

    /// Symbol queries for `path` report the backend as gone.
    pub fn unavailable(&mut self, path: &Path) -> &mut Self {
        self.unavailable.insert(uri(path));
        self
    }

    fn find(&self, uri: &str, position: Position) -> Option<&Symbol> {
        fn walk<'s>(symbols: &'s [Symbol], position: Position) -> Option<&'s Symbol> {
            symbols.iter().find_map(|s| {
                if s.query_position() == position {
                    Some(s)
                } else {
                    walk(&s.children, position)
                }
            })
        }
        walk(self.symbols.get(uri)?, position)
    }
}

#[async_trait]
impl SymbolSource for FakeSource {
    async fn open_document(&mut self, uri: &str, _text: &str, _extension: &str) -> ApiResult<()> {
        self.opened.push(uri.to_string());
        Ok(())
    }

    async fn document_symbols(&mut self, uri: &str) -> ApiResult<Vec<Symbol>> {
        if self.unavailable.contains(uri) {
            return Err(ApiError::Unavailable("connection lost".into()));
        }
        if self.failing.contains(uri) {
            return Err(ApiError::query("textDocument/documentSymbol", "internal error"));
        }
        Ok(self.symbols.get(uri).cloned().unwrap_or_default())
    }

    async fn declaration_of(&mut self, uri: &str, position: Position) -> ApiResult<Option<Location>> {
        let key = (uri.to_string(), position);
        if self.undeclared.contains(&key) {
            return Ok(None);
        }
        if let Some(declaration) = self.declarations.get(&key) {
            return Ok(Some(declaration.clone()));
        }
        Ok(self
            .find(uri, position)
            .map(|s| Location::new(uri, s.selection_range.unwrap_or(s.range))))
    }

    async fn definition_of(&mut self, uri: &str, position: Position) -> ApiResult<Option<Location>> {
        Ok(self
            .find(uri, position)
            .map(|s| Location::new(uri, s.range)))
    }

    async fn references_of(
        &mut self,
        uri: &str,
        position: Position,
        _declaration: &Location,
    ) -> ApiResult<Vec<Location>> {
        Ok(self
            .references
            .get(&(uri.to_string(), position))
            .cloned()
            .unwrap_or_default())
    }

    async fn document_links(&mut self, uri: &str) -> ApiResult<Vec<DocumentLink>> {
        Ok(self.links.get(uri).cloned().unwrap_or_default())
    }
}

/// In-memory store that records the calls it receives.
#[derive(Default)]
pub struct MemoryStore {
    pub graph: Mutex<StoredGraph>,
    pub calls: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn snapshot(&self) -> StoredGraph {
        self.graph.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn save(&self, nodes: &[NodeRecord], relationships: &[RelationshipRecord]) -> ApiResult<()> {
        self.calls.lock().unwrap().push("save".into());
        self.graph.lock().unwrap().upsert(nodes, relationships);
        Ok(())
    }

    async fn delete_path(&self, path: &Path) -> ApiResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("delete {}", path.display()));
        self.graph.lock().unwrap().delete_scope(path);
        Ok(())
    }
}

/// Write `files` (relative name, contents) under `root`.
pub fn write_files(root: &Path, files: &[&str]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|name| {
            let path = root.join(name);
            std::fs::write(&path, format!("// {name}\n")).unwrap();
            path
        })
        .collect()
}
