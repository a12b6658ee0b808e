use std::collections::HashMap;
use symgraph_api::{NodeKind, SymbolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindMapping {
    Mapped(NodeKind),
    /// No node is produced for this symbol kind.
    Unmapped,
}

/// Symbol kind -> node kind lookup with per-kind overrides.
#[derive(Debug, Clone, Default)]
pub struct KindTable {
    overrides: HashMap<SymbolKind, KindMapping>,
}

impl KindTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, kind: SymbolKind, mapping: KindMapping) -> Self {
        self.overrides.insert(kind, mapping);
        self
    }

    pub fn lookup(&self, kind: SymbolKind) -> KindMapping {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_mapping(kind))
    }
}

fn default_mapping(kind: SymbolKind) -> KindMapping {
    use KindMapping::{Mapped, Unmapped};
    match kind {
        SymbolKind::File | SymbolKind::Module | SymbolKind::Namespace | SymbolKind::Package => {
            Mapped(NodeKind::Module)
        }
        SymbolKind::Class => Mapped(NodeKind::Class),
        SymbolKind::Interface => Mapped(NodeKind::Interface),
        SymbolKind::Enum => Mapped(NodeKind::Enum),
        SymbolKind::Struct => Mapped(NodeKind::Struct),
        SymbolKind::Function => Mapped(NodeKind::Function),
        SymbolKind::Method => Mapped(NodeKind::Method),
        SymbolKind::Constructor => Mapped(NodeKind::Constructor),
        SymbolKind::Field => Mapped(NodeKind::Field),
        SymbolKind::Property => Mapped(NodeKind::Property),
        SymbolKind::Variable => Mapped(NodeKind::Variable),
        SymbolKind::Constant => Mapped(NodeKind::Constant),
        SymbolKind::EnumMember => Mapped(NodeKind::EnumMember),
        SymbolKind::TypeParameter => Mapped(NodeKind::TypeParameter),
        // literal-ish kinds reported for data files, plus anything newer than us
        SymbolKind::String
        | SymbolKind::Number
        | SymbolKind::Boolean
        | SymbolKind::Array
        | SymbolKind::Object
        | SymbolKind::Key
        | SymbolKind::Null
        | SymbolKind::Event
        | SymbolKind::Operator
        | SymbolKind::Unrecognized(_) => Unmapped,
    }
}
