use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Zero-based line/character position inside a document.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema,
)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, JsonSchema)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos >= self.start && pos <= self.end
    }

    pub fn encloses(&self, other: &Range) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    /// Rough extent used to pick the innermost of several enclosing ranges.
    pub fn extent(&self) -> (u32, u32) {
        (
            self.end.line.saturating_sub(self.start.line),
            self.end.character.saturating_sub(self.start.character),
        )
    }
}

/// LSP symbol kinds. Codes the protocol may add later land in `Unrecognized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Package,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Key,
    Null,
    EnumMember,
    Struct,
    Event,
    Operator,
    TypeParameter,
    Unrecognized(u32),
}

impl SymbolKind {
    const BY_CODE: [SymbolKind; 26] = [
        SymbolKind::File,
        SymbolKind::Module,
        SymbolKind::Namespace,
        SymbolKind::Package,
        SymbolKind::Class,
        SymbolKind::Method,
        SymbolKind::Property,
        SymbolKind::Field,
        SymbolKind::Constructor,
        SymbolKind::Enum,
        SymbolKind::Interface,
        SymbolKind::Function,
        SymbolKind::Variable,
        SymbolKind::Constant,
        SymbolKind::String,
        SymbolKind::Number,
        SymbolKind::Boolean,
        SymbolKind::Array,
        SymbolKind::Object,
        SymbolKind::Key,
        SymbolKind::Null,
        SymbolKind::EnumMember,
        SymbolKind::Struct,
        SymbolKind::Event,
        SymbolKind::Operator,
        SymbolKind::TypeParameter,
    ];

    /// Maps the numeric wire value (1-based) onto the enum.
    pub fn from_code(code: u32) -> Self {
        code.checked_sub(1)
            .and_then(|i| Self::BY_CODE.get(i as usize).copied())
            .unwrap_or(SymbolKind::Unrecognized(code))
    }

    pub fn code(&self) -> u32 {
        match self {
            SymbolKind::Unrecognized(code) => *code,
            known => Self::BY_CODE
                .iter()
                .position(|k| k == known)
                .map(|i| i as u32 + 1)
                .unwrap_or(0),
        }
    }
}

/// A named declaration reported by a document-symbol query.
///
/// Nesting is kept as reported: children are the symbols the server placed
/// inside this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Document the symbol was reported for.
    pub uri: String,
    pub range: Range,
    pub selection_range: Option<Range>,
    pub children: Vec<Symbol>,
}

impl Symbol {
    /// Position used for declaration and reference lookups.
    pub fn query_position(&self) -> Position {
        self.selection_range
            .map(|r| r.start)
            .unwrap_or(self.range.start)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

impl Location {
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self {
            uri: uri.into(),
            range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    pub range: Range,
    pub target: Option<String>,
}
