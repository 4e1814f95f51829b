//! csjava - Core Library
//!
//! Turns free-form model replies into structured conversion results and
//! writes translated C# sources back into the uploaded project archive.

pub mod archive;
pub mod completion;
pub mod config;
pub mod error;
pub mod history;
pub mod interpreter;
pub mod prompts;
pub mod service;
pub mod suffix;
pub mod types;

pub use archive::{extract_uploads, package_translations_only, repackage, Extraction, Repackaged, Upload};
pub use completion::{test_connection, CompletionClient, CompletionRequest, HttpCompletionClient};
pub use config::{AppConfig, CompletionConfig, ConfigManager};
pub use error::*;
pub use history::AnalysisHistory;
pub use interpreter::interpret;
pub use service::{Converter, Progress};
pub use suffix::{SuffixMap, SuffixRule};
pub use types::*;
