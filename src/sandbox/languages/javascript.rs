//! JavaScript (Node.js) language handler

use crate::models::Language;

use super::LanguageHandler;

/// Get handler for JavaScript
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: Language::Javascript,
        image: LanguageHandler::image_for(Language::Javascript),
        source_file: "solution.js",
        compile_command: Some("node --check /workspace/solution.js"),
        run_command: "node /workspace/solution.js",
    }
}
