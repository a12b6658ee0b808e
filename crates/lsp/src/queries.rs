//! Typed LSP queries on top of [`LspSession`].

use crate::error::Result;
use crate::protocol::{
    self, DocumentSymbolReply, LocationReply, WireDocumentLink, WireSymbolInformation, methods,
    range_from_wire,
};
use crate::session::LspSession;
use crate::transport::Connector;
use async_trait::async_trait;
use symgraph_api::{
    ApiResult, DocumentLink, Language, Location, Position, Range, Symbol, SymbolKind, SymbolSource,
};
use tracing::debug;

impl<C: Connector> LspSession<C> {
    /// Symbols of one document, nested by containment. `null` reads as none.
    pub async fn document_symbols(&mut self, uri: &str) -> Result<Vec<Symbol>> {
        let result = self
            .send_request(
                methods::DOCUMENT_SYMBOL,
                Some(protocol::text_document_params(uri)),
            )
            .await?
            .into_result()?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        let symbols = match serde_json::from_value::<DocumentSymbolReply>(result)? {
            DocumentSymbolReply::Nested(items) => {
                items.into_iter().map(|s| s.into_symbol(uri)).collect()
            }
            DocumentSymbolReply::Flat(items) => nest_flat_symbols(uri, items),
        };
        debug!(uri, count = symbols.len(), "document symbols");
        Ok(symbols)
    }

    pub async fn declaration_of(&mut self, uri: &str, position: Position) -> Result<Option<Location>> {
        self.first_location(methods::DECLARATION, uri, position)
            .await
    }

    pub async fn definition_of(&mut self, uri: &str, position: Position) -> Result<Option<Location>> {
        self.first_location(methods::DEFINITION, uri, position)
            .await
    }

    /// References to the symbol at `position`, without its declaration.
    ///
    /// Some servers ignore `includeDeclaration`, so the declaration and the
    /// queried location itself are filtered here as well.
    pub async fn references_of(
        &mut self,
        uri: &str,
        position: Position,
        declaration: &Location,
    ) -> Result<Vec<Location>> {
        let result = self
            .send_request(
                methods::REFERENCES,
                Some(protocol::reference_params(uri, position)),
            )
            .await?
            .into_result()?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        let references = serde_json::from_value::<LocationReply>(result)?
            .into_locations()
            .into_iter()
            .filter(|loc| loc != declaration)
            .filter(|loc| !(loc.uri == uri && loc.range.contains(position)))
            .collect();
        Ok(references)
    }

    /// One chain per position, innermost range first.
    pub async fn selection_ranges(
        &mut self,
        uri: &str,
        positions: &[Position],
    ) -> Result<Vec<Vec<Range>>> {
        let result = self
            .send_request(
                methods::SELECTION_RANGE,
                Some(protocol::selection_range_params(uri, positions)),
            )
            .await?
            .into_result()?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        let chains = serde_json::from_value::<Vec<lsp_types::SelectionRange>>(result)?
            .into_iter()
            .map(|selection| {
                let mut chain = Vec::new();
                let mut current = Some(selection);
                while let Some(node) = current {
                    chain.push(range_from_wire(node.range));
                    current = node.parent.map(|parent| *parent);
                }
                chain
            })
            .collect();
        Ok(chains)
    }

    pub async fn document_links(&mut self, uri: &str) -> Result<Vec<DocumentLink>> {
        let result = self
            .send_request(
                methods::DOCUMENT_LINK,
                Some(protocol::text_document_params(uri)),
            )
            .await?
            .into_result()?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        let links = serde_json::from_value::<Vec<WireDocumentLink>>(result)?
            .into_iter()
            .map(DocumentLink::from)
            .collect();
        Ok(links)
    }

    pub async fn did_open(&mut self, uri: &str, text: &str, extension: &str) -> Result<()> {
        let language = Language::from_extension(extension);
        let params = protocol::did_open_params(uri, language.as_str(), 1, text);
        self.send_notification(methods::DID_OPEN, Some(params)).await
    }

    async fn first_location(
        &mut self,
        method: &str,
        uri: &str,
        position: Position,
    ) -> Result<Option<Location>> {
        let result = self
            .send_request(
                method,
                Some(protocol::text_document_position_params(uri, position)),
            )
            .await?
            .into_result()?;
        if result.is_null() {
            return Ok(None);
        }
        let location = serde_json::from_value::<LocationReply>(result)?
            .into_locations()
            .into_iter()
            .next();
        Ok(location)
    }
}

/// Rebuild nesting for `SymbolInformation[]` replies: a symbol's parent is the
/// innermost symbol named by its `containerName` whose range strictly encloses it.
fn nest_flat_symbols(uri: &str, items: Vec<WireSymbolInformation>) -> Vec<Symbol> {
    let containers: Vec<Option<String>> = items.iter().map(|i| i.container_name.clone()).collect();
    let mut slots: Vec<Option<Symbol>> = items
        .into_iter()
        .map(|info| {
            Some(Symbol {
                name: info.name,
                kind: SymbolKind::from_code(info.kind),
                uri: uri.to_string(),
                range: range_from_wire(info.location.range),
                selection_range: None,
                children: Vec::new(),
            })
        })
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    let mut roots = Vec::new();
    for (idx, container) in containers.iter().enumerate() {
        let parent = container.as_deref().and_then(|name| {
            let child_range = slots[idx].as_ref()?.range;
            slots
                .iter()
                .enumerate()
                .filter_map(|(j, s)| s.as_ref().map(|s| (j, s)))
                .filter(|(j, s)| {
                    *j != idx
                        && s.name == name
                        && s.range != child_range
                        && s.range.encloses(&child_range)
                })
                .min_by_key(|(_, s)| s.range.extent())
                .map(|(j, _)| j)
        });
        match parent {
            Some(parent) => children[parent].push(idx),
            None => roots.push(idx),
        }
    }

    roots
        .into_iter()
        .filter_map(|idx| assemble(idx, &mut slots, &children))
        .collect()
}

fn assemble(idx: usize, slots: &mut [Option<Symbol>], children: &[Vec<usize>]) -> Option<Symbol> {
    let mut symbol = slots[idx].take()?;
    symbol.children = children[idx]
        .iter()
        .filter_map(|&child| assemble(child, slots, children))
        .collect();
    Some(symbol)
}

#[async_trait]
impl<C: Connector> SymbolSource for LspSession<C> {
    async fn open_document(&mut self, uri: &str, text: &str, extension: &str) -> ApiResult<()> {
        self.did_open(uri, text, extension)
            .await
            .map_err(|e| e.into_api(methods::DID_OPEN))
    }

    async fn document_symbols(&mut self, uri: &str) -> ApiResult<Vec<Symbol>> {
        LspSession::document_symbols(self, uri)
            .await
            .map_err(|e| e.into_api(methods::DOCUMENT_SYMBOL))
    }

    async fn declaration_of(&mut self, uri: &str, position: Position) -> ApiResult<Option<Location>> {
        LspSession::declaration_of(self, uri, position)
            .await
            .map_err(|e| e.into_api(methods::DECLARATION))
    }

    async fn definition_of(&mut self, uri: &str, position: Position) -> ApiResult<Option<Location>> {
        LspSession::definition_of(self, uri, position)
            .await
            .map_err(|e| e.into_api(methods::DEFINITION))
    }

    async fn references_of(
        &mut self,
        uri: &str,
        position: Position,
        declaration: &Location,
    ) -> ApiResult<Vec<Location>> {
        LspSession::references_of(self, uri, position, declaration)
            .await
            .map_err(|e| e.into_api(methods::REFERENCES))
    }

    async fn document_links(&mut self, uri: &str) -> ApiResult<Vec<DocumentLink>> {
        LspSession::document_links(self, uri)
            .await
            .map_err(|e| e.into_api(methods::DOCUMENT_LINK))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::testing::{Event, ScriptedConnector, response};
    use serde_json::{Value, json};

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Value {
        json!({"start": {"line": sl, "character": sc}, "end": {"line": el, "character": ec}})
    }

    async fn session_with(replies: Vec<Value>) -> (LspSession<ScriptedConnector>, ScriptedConnector) {
        let events = replies
            .into_iter()
            .enumerate()
            .map(|(i, result)| Event::frame(response(i as u64 + 1, result)))
            .collect();
        let connector = ScriptedConnector::new(vec![Ok(events)]);
        let mut session =
            LspSession::with_connector(SessionConfig::new("file:///repo"), connector.clone());
        session.connect().await.unwrap();
        (session, connector)
    }

    #[tokio::test]
    async fn test_null_document_symbols_is_empty() {
        let (mut session, _) = session_with(vec![Value::Null]).await;
        let symbols = session.document_symbols("file:///repo/empty.ts").await.unwrap();
        assert!(symbols.is_empty());
    }

    #[tokio::test]
    async fn test_nested_document_symbols_keep_children() {
        let reply = json!([{
            "name": "Greeter",
            "kind": 5,
            "range": range(0, 0, 4, 1),
            "selectionRange": range(0, 6, 0, 13),
            "children": [{
                "name": "greet",
                "kind": 6,
                "range": range(1, 2, 3, 3),
                "selectionRange": range(1, 2, 1, 7)
            }]
        }]);
        let (mut session, _) = session_with(vec![reply]).await;
        let symbols = session.document_symbols("file:///repo/a.ts").await.unwrap();

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].kind, SymbolKind::Class);
        assert_eq!(symbols[0].query_position(), Position::new(0, 6));
        assert_eq!(symbols[0].children[0].name, "greet");
        assert_eq!(symbols[0].children[0].kind, SymbolKind::Method);
    }

    #[tokio::test]
    async fn test_flat_symbols_are_renested() {
        let uri = "file:///repo/a.py";
        let reply = json!([
            {"name": "Shape", "kind": 5, "location": {"uri": uri, "range": range(0, 0, 9, 0)}},
            {"name": "area", "kind": 6, "containerName": "Shape",
             "location": {"uri": uri, "range": range(2, 4, 4, 0)}},
            {"name": "helper", "kind": 12, "containerName": "Missing",
             "location": {"uri": uri, "range": range(11, 0, 12, 0)}}
        ]);
        let (mut session, _) = session_with(vec![reply]).await;
        let symbols = session.document_symbols(uri).await.unwrap();

        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Shape", "helper"]);
        assert_eq!(symbols[0].children.len(), 1);
        assert_eq!(symbols[0].children[0].name, "area");
        assert_eq!(symbols[0].children[0].selection_range, None);
    }

    #[tokio::test]
    async fn test_declaration_takes_first_location() {
        let reply = json!([
            {"uri": "file:///repo/b.ts", "range": range(3, 0, 3, 9)},
            {"uri": "file:///repo/c.ts", "range": range(1, 0, 1, 9)}
        ]);
        let (mut session, _) = session_with(vec![reply, Value::Null]).await;

        let found = session
            .declaration_of("file:///repo/a.ts", Position::new(0, 4))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.uri, "file:///repo/b.ts");

        let missing = session
            .declaration_of("file:///repo/a.ts", Position::new(9, 9))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_references_drop_declaration_and_query_site() {
        let uri = "file:///repo/a.ts";
        let declaration = Location::new(uri, Range::new(Position::new(0, 9), Position::new(0, 14)));
        let reply = json!([
            {"uri": uri, "range": range(0, 9, 0, 14)},
            {"uri": uri, "range": range(5, 2, 5, 7)},
            {"uri": "file:///repo/b.ts", "range": range(2, 0, 2, 5)}
        ]);
        let (mut session, connector) = session_with(vec![reply]).await;

        let refs = session
            .references_of(uri, Position::new(0, 9), &declaration)
            .await
            .unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r != &declaration));

        let sent = connector.sent_values(0);
        assert_eq!(sent[0]["params"]["context"]["includeDeclaration"], false);
    }

    #[tokio::test]
    async fn test_selection_ranges_are_flattened_innermost_first() {
        let reply = json!([{
            "range": range(1, 4, 1, 9),
            "parent": {"range": range(1, 0, 2, 0), "parent": {"range": range(0, 0, 9, 0)}}
        }]);
        let (mut session, _) = session_with(vec![reply]).await;
        let chains = session
            .selection_ranges("file:///repo/a.ts", &[Position::new(1, 5)])
            .await
            .unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 3);
        assert_eq!(chains[0][0].start, Position::new(1, 4));
        assert_eq!(chains[0][2].end, Position::new(9, 0));
    }

    #[tokio::test]
    async fn test_document_links() {
        let reply = json!([
            {"range": range(0, 20, 0, 30), "target": "file:///repo/util.ts"},
            {"range": range(1, 20, 1, 30)}
        ]);
        let (mut session, _) = session_with(vec![reply]).await;
        let links = session.document_links("file:///repo/a.ts").await.unwrap();
        assert_eq!(links[0].target.as_deref(), Some("file:///repo/util.ts"));
        assert_eq!(links[1].target, None);
    }

    #[tokio::test]
    async fn test_did_open_uses_language_id() {
        let (mut session, connector) = session_with(vec![]).await;
        session
            .did_open("file:///repo/view.tsx", "export {}", ".tsx")
            .await
            .unwrap();
        session
            .did_open("file:///repo/notes.txt", "", "txt")
            .await
            .unwrap();

        let sent = connector.sent_values(0);
        assert_eq!(sent[0]["method"], "textDocument/didOpen");
        assert_eq!(sent[0]["params"]["textDocument"]["languageId"], "typescriptreact");
        assert_eq!(sent[0]["params"]["textDocument"]["version"], 1);
        assert_eq!(sent[1]["params"]["textDocument"]["languageId"], "plaintext");
    }

    #[tokio::test]
    async fn test_rpc_error_maps_to_query_error() {
        let connector = ScriptedConnector::new(vec![Ok(vec![Event::frame(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32603, "message": "crashed"}
        }))])]);
        let mut session =
            LspSession::with_connector(SessionConfig::new("file:///repo"), connector);
        session.connect().await.unwrap();

        let err = SymbolSource::document_symbols(&mut session, "file:///repo/a.ts")
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
    }
}
