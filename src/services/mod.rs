pub mod export;
pub mod extract;
pub mod generator;
pub mod syllabus;

pub use export::BookExporter;
pub use extract::{extract_dialog, extract_qna};
pub use generator::{LlmGenerator, TextGenerator};
pub use syllabus::parse_syllabus;
