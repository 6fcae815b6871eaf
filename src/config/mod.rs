pub mod collab;
pub mod pipeline;

pub use collab::CollaboratorConfig;
pub use pipeline::PipelineConfig;
