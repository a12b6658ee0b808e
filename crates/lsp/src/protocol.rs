//! JSON-RPC envelopes and the LSP payload shapes this client uses.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use symgraph_api::{DocumentLink, Location, Position, Range, Symbol, SymbolKind};

pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "initialized";
    pub const SHUTDOWN: &str = "shutdown";
    pub const EXIT: &str = "exit";
    pub const DID_OPEN: &str = "textDocument/didOpen";
    pub const DOCUMENT_SYMBOL: &str = "textDocument/documentSymbol";
    pub const DECLARATION: &str = "textDocument/declaration";
    pub const DEFINITION: &str = "textDocument/definition";
    pub const REFERENCES: &str = "textDocument/references";
    pub const SELECTION_RANGE: &str = "textDocument/selectionRange";
    pub const DOCUMENT_LINK: &str = "textDocument/documentLink";
    pub const LOG_MESSAGE: &str = "window/logMessage";
}

pub const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> Request<'a> {
    pub fn new(id: u64, method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Notification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> Notification<'a> {
    pub fn new(method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ResponseError>,
}

impl Response {
    /// The `result` member, or the server's `error` as [`SessionError::Rpc`].
    /// A missing result reads as `null`.
    pub fn into_result(self) -> Result<Value, SessionError> {
        match self.error {
            Some(err) => Err(SessionError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[derive(Debug)]
pub enum IncomingFrame {
    Response(Response),
    /// Server-to-client request; needs an answer or the server may stall.
    ServerRequest { id: Value, method: String },
    Notification {
        method: String,
        params: Option<Value>,
    },
}

/// Classifies one text frame. `None` for anything that is not JSON-RPC.
pub fn parse_incoming(text: &str) -> Option<IncomingFrame> {
    let frame: Value = serde_json::from_str(text).ok()?;
    let id = frame.get("id").filter(|id| !id.is_null());
    let method = frame
        .get("method")
        .and_then(|m| m.as_str())
        .map(String::from);
    let has_result_or_error = frame.get("result").is_some() || frame.get("error").is_some();

    match (id, method, has_result_or_error) {
        (Some(_), None, true) => serde_json::from_value(frame)
            .ok()
            .map(IncomingFrame::Response),
        (Some(id), Some(method), _) => Some(IncomingFrame::ServerRequest {
            id: id.clone(),
            method,
        }),
        (None, Some(method), _) => Some(IncomingFrame::Notification {
            method,
            params: frame.get("params").cloned(),
        }),
        _ => None,
    }
}

pub fn method_not_found(id: &Value, method: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": METHOD_NOT_FOUND,
            "message": format!("Method not found: {method}")
        }
    })
}

/// Query-only client: no capabilities, and the server-side features that
/// would push unsolicited work (diagnostics, hover, snippets) switched off.
pub fn initialize_params(root_uri: Option<&str>) -> Value {
    json!({
        "processId": std::process::id(),
        "rootUri": root_uri,
        "capabilities": {},
        "initializationOptions": {
            "completion": {
                "disableSnippets": true,
                "resolveEagerly": false,
                "ignorePatterns": []
            },
            "diagnostics": {
                "enable": false,
                "didOpen": false,
                "didChange": false,
                "didSave": false
            },
            "hover": {
                "enable": false
            }
        }
    })
}

pub fn did_open_params(uri: &str, language_id: &str, version: i32, text: &str) -> Value {
    json!({
        "textDocument": {
            "uri": uri,
            "languageId": language_id,
            "version": version,
            "text": text
        }
    })
}

pub fn text_document_params(uri: &str) -> Value {
    json!({ "textDocument": { "uri": uri } })
}

pub fn text_document_position_params(uri: &str, position: Position) -> Value {
    json!({
        "textDocument": { "uri": uri },
        "position": { "line": position.line, "character": position.character }
    })
}

pub fn reference_params(uri: &str, position: Position) -> Value {
    json!({
        "textDocument": { "uri": uri },
        "position": { "line": position.line, "character": position.character },
        "context": { "includeDeclaration": false }
    })
}

pub fn selection_range_params(uri: &str, positions: &[Position]) -> Value {
    let positions: Vec<Value> = positions
        .iter()
        .map(|p| json!({ "line": p.line, "character": p.character }))
        .collect();
    json!({
        "textDocument": { "uri": uri },
        "positions": positions
    })
}

// Reply shapes. URIs stay plain strings; only the geometry comes from lsp-types.

pub(crate) fn range_from_wire(range: lsp_types::Range) -> Range {
    Range::new(
        Position::new(range.start.line, range.start.character),
        Position::new(range.end.line, range.end.character),
    )
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DocumentSymbolReply {
    Nested(Vec<WireDocumentSymbol>),
    Flat(Vec<WireSymbolInformation>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDocumentSymbol {
    pub name: String,
    pub kind: u32,
    pub range: lsp_types::Range,
    pub selection_range: lsp_types::Range,
    #[serde(default)]
    pub children: Option<Vec<WireDocumentSymbol>>,
}

impl WireDocumentSymbol {
    pub fn into_symbol(self, uri: &str) -> Symbol {
        Symbol {
            name: self.name,
            kind: SymbolKind::from_code(self.kind),
            uri: uri.to_string(),
            range: range_from_wire(self.range),
            selection_range: Some(range_from_wire(self.selection_range)),
            children: self
                .children
                .unwrap_or_default()
                .into_iter()
                .map(|child| child.into_symbol(uri))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireSymbolInformation {
    pub name: String,
    pub kind: u32,
    pub location: WireLocation,
    #[serde(default)]
    pub container_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLocation {
    pub uri: String,
    pub range: lsp_types::Range,
}

impl From<WireLocation> for Location {
    fn from(loc: WireLocation) -> Self {
        Location::new(loc.uri, range_from_wire(loc.range))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireLocationLink {
    pub target_uri: String,
    pub target_range: lsp_types::Range,
    pub target_selection_range: lsp_types::Range,
}

impl From<WireLocationLink> for Location {
    fn from(link: WireLocationLink) -> Self {
        Location::new(link.target_uri, range_from_wire(link.target_selection_range))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LocationReply {
    One(WireLocation),
    Many(Vec<WireLocation>),
    Links(Vec<WireLocationLink>),
}

impl LocationReply {
    pub fn into_locations(self) -> Vec<Location> {
        match self {
            LocationReply::One(loc) => vec![loc.into()],
            LocationReply::Many(locs) => locs.into_iter().map(Location::from).collect(),
            LocationReply::Links(links) => links.into_iter().map(Location::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDocumentLink {
    pub range: lsp_types::Range,
    #[serde(default)]
    pub target: Option<String>,
}

impl From<WireDocumentLink> for DocumentLink {
    fn from(link: WireDocumentLink) -> Self {
        DocumentLink {
            range: range_from_wire(link.range),
            target: link.target,
        }
    }
}
