//! Input tables: loading, joining and filtering

mod columns;
mod filter;
mod join;
mod loader;

pub use columns::*;
pub use filter::*;
pub use join::*;
pub use loader::*;
