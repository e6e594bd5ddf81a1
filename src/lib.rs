pub mod coerce;
pub mod dedupe;
pub mod error;
pub mod filter;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod report;

pub use error::{Result, ScourError};
pub use frame::{Cell, Column, ColumnStore, DType, Mask};
pub use pipeline::{Pipeline, Stage, StageFailure, StageReport};
