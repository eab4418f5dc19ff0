pub mod criterion;
pub mod field;
pub mod loaders;
pub mod query;
pub mod wire;

pub use criterion::Criterion;
pub use field::{Field, Operator};
pub use loaders::{load_all_query_files, load_queries_from_toml};
pub use query::{CriterionBuilder, FieldSelected, Query, MAX_CRITERIA};
pub use wire::{ControlKind, WireField, WireQuery, WireSlot};
