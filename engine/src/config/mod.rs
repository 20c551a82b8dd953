// Engine configuration: JSON settings file plus command line overrides.
pub mod settings;

pub use settings::{EngineSettings, ModelSettings, PipelineSettings, TcpSettings};
