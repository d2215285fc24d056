//! C++ language handler

use crate::models::Language;

use super::LanguageHandler;

/// Get handler for C++
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: Language::Cpp,
        image: LanguageHandler::image_for(Language::Cpp),
        source_file: "solution.cpp",
        compile_command: Some(
            "g++ -O2 -std=c++17 -pipe -o /workspace/solution /workspace/solution.cpp",
        ),
        run_command: "/workspace/solution",
    }
}
