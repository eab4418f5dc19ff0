pub mod toml_loader;

pub use toml_loader::{load_all_query_files, load_queries_from_toml, parse_queries};
