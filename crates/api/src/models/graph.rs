use super::symbol::Range;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    File,
    Module,
    Class,
    Interface,
    Enum,
    Struct,
    Function,
    Method,
    Constructor,
    Field,
    Property,
    Variable,
    Constant,
    EnumMember,
    TypeParameter,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::File => "FILE",
            NodeKind::Module => "MODULE",
            NodeKind::Class => "CLASS",
            NodeKind::Interface => "INTERFACE",
            NodeKind::Enum => "ENUM",
            NodeKind::Struct => "STRUCT",
            NodeKind::Function => "FUNCTION",
            NodeKind::Method => "METHOD",
            NodeKind::Constructor => "CONSTRUCTOR",
            NodeKind::Field => "FIELD",
            NodeKind::Property => "PROPERTY",
            NodeKind::Variable => "VARIABLE",
            NodeKind::Constant => "CONSTANT",
            NodeKind::EnumMember => "ENUM_MEMBER",
            NodeKind::TypeParameter => "TYPE_PARAMETER",
        }
    }

    /// Targets of a reference from these kinds are invocations.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            NodeKind::Function | NodeKind::Method | NodeKind::Constructor
        )
    }

    /// Kinds that hold a value rather than define structure.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            NodeKind::Field
                | NodeKind::Property
                | NodeKind::Variable
                | NodeKind::Constant
                | NodeKind::EnumMember
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    // Structural relationships
    Contains,
    Declares,
    // Usage/Reference
    Calls,
    Uses,
    Imports,
    // Inheritance
    Inherits,
}

impl RelationshipType {
    pub fn label(&self) -> &'static str {
        match self {
            RelationshipType::Contains => "CONTAINS",
            RelationshipType::Declares => "DECLARES",
            RelationshipType::Calls => "CALLS",
            RelationshipType::Uses => "USES",
            RelationshipType::Imports => "IMPORTS",
            RelationshipType::Inherits => "INHERITS",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Flat node shape handed to the persistence layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct NodeRecord {
    pub id: String,
    pub label: NodeKind,
    pub name: String,
    /// File the declaration lives in.
    pub path: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    /// File whose indexing produced this node.
    pub scope: String,
    /// Every file that produced this node, in the order they did. Empty
    /// when `scope` is the only one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

/// Flat relationship shape handed to the persistence layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRecord {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub rel_type: RelationshipType,
    pub scope: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_record_wire_names() {
        let record = RelationshipRecord {
            source_id: "a".into(),
            target_id: "b".into(),
            rel_type: RelationshipType::Uses,
            scope: "/src/a.ts".into(),
            owners: vec![],
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sourceId"], "a");
        assert_eq!(json["targetId"], "b");
        assert_eq!(json["type"], "USES");
    }

    #[test]
    fn test_node_record_serializes_label() {
        let record = NodeRecord {
            id: "0011223344556677".into(),
            label: NodeKind::EnumMember,
            name: "Red".into(),
            path: "/src/color.ts".into(),
            uri: "file:///src/color.ts".into(),
            range: None,
            scope: "/src/color.ts".into(),
            owners: vec![],
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["label"], NodeKind::EnumMember.label());
        assert!(json.get("range").is_none());
        assert!(json.get("owners").is_none());

        let shared: NodeRecord = serde_json::from_value(serde_json::json!({
            "id": "0011223344556677",
            "label": "FUNCTION",
            "name": "helper",
            "path": "/vendor/lib.d.ts",
            "uri": "file:///vendor/lib.d.ts",
            "scope": "/src/a.ts",
            "owners": ["/src/a.ts", "/src/b.ts"]
        }))
        .unwrap();
        assert_eq!(shared.owners.len(), 2);
    }

    #[test]
    fn test_kind_predicates() {
        assert!(NodeKind::Method.is_callable());
        assert!(!NodeKind::Class.is_callable());
        assert!(NodeKind::Field.is_value());
        assert!(!NodeKind::Function.is_value());
    }
}
