pub mod book;

pub use book::{max_chapter_no, BookDocument, BookRequest, ChapterArtifact, Syllabus};
