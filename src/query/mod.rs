// file: src/query/mod.rs
// description: query execution exports
// reference: internal module structure

pub mod runner;

pub use runner::QueryRunner;
