//! Language-specific handlers for compilation and execution

pub mod cpp;
pub mod java;
pub mod javascript;
pub mod python;

use crate::{constants::container_images, models::Language};

/// Everything lives under this directory inside the container
pub const WORKSPACE: &str = "/workspace";

/// Language handler for compilation and execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageHandler {
    pub language: Language,
    pub image: &'static str,
    /// File name the source is written to, relative to [`WORKSPACE`]
    pub source_file: &'static str,
    /// Compile step or syntax check; `None` runs the source directly
    pub compile_command: Option<&'static str>,
    pub run_command: &'static str,
}

impl LanguageHandler {
    /// Get handler for a specific language
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Python => python::handler(),
            Language::Javascript => javascript::handler(),
            Language::Cpp => cpp::handler(),
            Language::Java => java::handler(),
        }
    }

    /// Absolute path of the source file inside the container
    pub fn source_path(&self) -> String {
        format!("{}/{}", WORKSPACE, self.source_file)
    }

    pub(crate) fn image_for(language: Language) -> &'static str {
        match language {
            Language::Python => container_images::PYTHON,
            Language::Javascript => container_images::JAVASCRIPT,
            Language::Cpp => container_images::CPP,
            Language::Java => container_images::JAVA,
        }
    }
}
