//! Java language handler
//!
//! The public class must be named `Solution`.

use crate::models::Language;

use super::LanguageHandler;

/// Get handler for Java
pub fn handler() -> LanguageHandler {
    LanguageHandler {
        language: Language::Java,
        image: LanguageHandler::image_for(Language::Java),
        source_file: "Solution.java",
        compile_command: Some("javac -encoding UTF-8 -d /workspace /workspace/Solution.java"),
        run_command: "java -Xss64m -XX:+UseSerialGC -cp /workspace Solution",
    }
}
