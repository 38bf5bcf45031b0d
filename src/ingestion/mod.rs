//! Source Loader: reads the extracts and lands them in the store.

pub mod delimited;
pub mod loader;
pub mod spreadsheet;

pub use loader::{read_source, LoadedTable, SourceFormat, SourceLoader};
