// Re-export all items from the submodules
mod pipeline_config;
mod tool_paths;

pub use pipeline_config::{
    PipelineConfig,
    load_or_create_config,
};

pub use tool_paths::ToolPaths;
