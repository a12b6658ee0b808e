pub mod factory;
pub mod id;
pub mod kind;
pub mod node;
pub mod relationship;

pub use factory::NodeFactory;
pub use id::NodeId;
pub use kind::{KindMapping, KindTable};
pub use node::Node;
pub use relationship::{Relationship, RelationshipKey};
