//! Utility functions and types

pub mod data_loader;
pub mod staging;

pub use data_loader::{DataLoader, DataSaver};
pub use staging::{commit_all, StagedFile};
