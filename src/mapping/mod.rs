//! Source to destination path derivation.

mod path_mapper;

pub use path_mapper::{NamingPolicy, PathMapper, resolve_absolute};
