use std::path::PathBuf;
use thiserror::Error;

/// Fatal failure kinds of the prediction pipeline. Nothing is recovered
/// locally; every variant terminates the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("output directory does not exist: {0}")]
    OutputPathInvalid(PathBuf),

    #[error("no training examples: every (uid, day) group in the training day range had fewer than 2 points")]
    EmptyTrainingSet,

    #[error("no validation examples: every (uid, day) group in the validation day range had fewer than 2 points")]
    EmptyValidationSet,
}
