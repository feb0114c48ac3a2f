mod axis;
mod cycle;
mod evaluator;
mod generator;
mod grid;
mod polynomial;
mod render;
mod scheduler;
mod surface;
mod timer;

#[cfg(test)]
mod test_utils;

pub use axis::*;
pub use cycle::*;
pub use evaluator::*;
pub use generator::*;
pub use grid::*;
pub use polynomial::Polynomial;
pub use render::*;
pub use scheduler::*;
pub use surface::Surface;
pub use timer::*;

use snafu::prelude::*;

#[derive(Debug, Snafu)]
pub enum PolysurfError {
    #[snafu(display("Invalid parameter: {}", message))]
    InvalidParameter { message: String },

    #[snafu(display(
        "Dimension mismatch (bug in library): polynomial has {} variables but grid has {} slots",
        variables,
        slots
    ))]
    DimensionMismatch { variables: usize, slots: usize },

    #[snafu(display("Failed to write rendered figure: {}", source))]
    Render { source: std::io::Error },

    #[snafu(display("No live figure with id {}", id))]
    UnknownFigure { id: u64 },

    #[snafu(display("Scheduler has been shut down"))]
    SchedulerTerminated,
}

impl PolysurfError {
    /// Whether the error is a user-correctable input problem.
    ///
    /// Recoverable errors skip one cycle; everything else is fatal to the host.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PolysurfError::InvalidParameter { .. })
    }
}

pub(crate) fn invalid(message: impl Into<String>) -> PolysurfError {
    PolysurfError::InvalidParameter {
        message: message.into(),
    }
}
