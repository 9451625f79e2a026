//! CSV matrix ingestion and artifact writing for arachne.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, MatrixDataset, SampleId};
pub use error::IoError;
pub use reader::MatrixReader;
pub use writer::NetworkWriter;
