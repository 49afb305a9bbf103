//! Pipeline stages
//!
//! Each stage is a leaf: it reads its input files, writes its output files
//! and shares no in-process state with the others.

pub mod ingest;
pub mod score;
pub mod train;
