pub mod app;
pub mod archive;
pub mod chrom_map;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod transform;
