//! Ad-hoc SQL over the input files

mod runner;

pub use runner::*;
