use thiserror::Error;

use crate::shared::frame::ColorModel;

#[derive(Error, Debug, PartialEq)]
pub enum StageError {
    /// A stage received a frame in a color model it does not accept. This is
    /// a wiring bug in the caller, never a property of the frame content.
    #[error("{stage} stage expects a {expected} frame, got {found}")]
    StageContractViolation {
        stage: &'static str,
        expected: ColorModel,
        found: ColorModel,
    },
    #[error("invalid pipeline parameter: {0}")]
    InvalidParameter(String),
}
