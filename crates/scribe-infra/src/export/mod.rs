//! Markdown export targets.

mod filesystem;

pub use filesystem::FileSystemExporter;
