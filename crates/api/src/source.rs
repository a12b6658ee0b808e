use crate::error::ApiResult;
use crate::models::{DocumentLink, Location, Position, SourceFile, Symbol};
use async_trait::async_trait;

/// Answers symbol questions about documents; usually a language server session.
///
/// Methods take `&mut self`: one source serves one caller at a time.
#[async_trait]
pub trait SymbolSource: Send {
    /// Make the document known to the backend before querying it.
    async fn open_document(&mut self, uri: &str, text: &str, extension: &str) -> ApiResult<()>;

    /// Symbols declared in the document. An empty document yields an empty list.
    async fn document_symbols(&mut self, uri: &str) -> ApiResult<Vec<Symbol>>;

    async fn declaration_of(&mut self, uri: &str, position: Position)
    -> ApiResult<Option<Location>>;

    async fn definition_of(&mut self, uri: &str, position: Position) -> ApiResult<Option<Location>>;

    /// Locations referencing the symbol at `position`, never including `declaration`.
    async fn references_of(
        &mut self,
        uri: &str,
        position: Position,
        declaration: &Location,
    ) -> ApiResult<Vec<Location>>;

    async fn document_links(&mut self, uri: &str) -> ApiResult<Vec<DocumentLink>>;
}

/// Produces the ordered list of files to index.
pub trait FileSource: Send + Sync {
    fn files(&self) -> ApiResult<Vec<SourceFile>>;
}
