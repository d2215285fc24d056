//! Python language handler

use crate::models::Language;

use super::LanguageHandler;

/// Get handler for Python
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: Language::Python,
        image: LanguageHandler::image_for(Language::Python),
        source_file: "solution.py",
        // Syntax check only
        compile_command: Some("python3 -m py_compile /workspace/solution.py"),
        run_command: "python3 /workspace/solution.py",
    }
}
