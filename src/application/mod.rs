pub mod use_cases;

pub use use_cases::analysis::{AnalysisUseCase, PipelineSettings, TaskRequest};
pub use use_cases::translate::TranslateUseCase;
