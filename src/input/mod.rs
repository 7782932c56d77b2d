//! Input processing module
//! Handles file detection and loading of documents and embeddings

pub mod file_detector;
pub mod manager;

pub use manager::InputManager;
