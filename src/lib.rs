//! Go source intelligence: definitions, references, implementations and
//! interfaces of the identifier under a cursor, plus a definition index
//! for fast name search.

pub mod config;
pub mod index;
pub mod inspect;
pub mod list;
pub mod loc;
pub mod logging;
pub mod output;
pub mod paths;
pub mod syntax;
pub mod types;
pub mod workspace;

// Re-export commonly used types
pub use inspect::{InspectOptions, InspectResult, Inspector, Relation, RelationKind};
pub use loc::FileLoc;
