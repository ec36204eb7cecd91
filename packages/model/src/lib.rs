pub mod error;
pub mod id_generator;
pub mod node;
pub mod path;
pub mod prose;
pub mod schema;
pub mod selection;
pub mod snapshot;
pub mod text;
pub mod value;

pub use error::{DocumentError, DocumentResult};
pub use id_generator::{IdGenerator, RandomIds, SequentialIds};
pub use node::{DocumentNode, NodeData};
pub use path::{Coordinate, Path};
pub use schema::{NodeKind, NodeType, PropertyKind, PropertySpec, Schema, SchemaBuilder, Weight};
pub use selection::{
    compare_coordinates, ContainerSelection, CoordinateOrder, CustomSelection, NodeSelection,
    NodeSelectionMode, PropertySelection, Range, SamePropertyOnly, Selection, SelectionDescriptor, Side,
};
pub use snapshot::{DocumentSnapshot, NodeSnapshot};
pub use value::Value;
