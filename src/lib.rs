pub mod discover;
pub mod error;
pub mod extract;
pub mod generate;
pub mod pipeline;
pub mod render;
pub mod table;

pub use discover::IdPolicy;
pub use error::MetadataError;
pub use generate::{GeneratorConfig, RunSummary};
pub use pipeline::CogConfig;
pub use render::TemplateRenderer;
pub use table::MetadataTable;
