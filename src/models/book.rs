//! 书籍内容数据模型
//!
//! 持久化的 JSON 文档形状（每本书一个文件）：
//!
//! ```json
//! {
//!   "book_name": "...", "book_grade": "...", "book_info": "...",
//!   "chapter_breakdown": { "1": "..." },
//!   "book_content": {
//!     "1": { "chapter_title": "...", "chapter_text": "...",
//!            "qna": [["q", "a"]], "dialog": [["Teacher", "..."]] }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 章节大纲：章节号（正整数）到章节标题的有序映射
pub type Syllabus = BTreeMap<u32, String>;

/// 大纲中最大的章节号（空大纲为 0）
pub fn max_chapter_no(syllabus: &Syllabus) -> u32 {
    syllabus.keys().next_back().copied().unwrap_or(0)
}

/// 一次运行的输入：书名 + 年级
#[derive(Debug, Clone)]
pub struct BookRequest {
    pub book_name: String,
    pub book_grade: String,
}

impl BookRequest {
    pub fn new(book_name: impl Into<String>, book_grade: impl Into<String>) -> Self {
        Self {
            book_name: book_name.into(),
            book_grade: book_grade.into(),
        }
    }
}

/// 单个章节的最终产物，在持久化时定稿
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterArtifact {
    pub chapter_title: String,
    pub chapter_text: String,
    /// (问题, 答案) 的有序列表
    pub qna: Vec<(String, String)>,
    /// (说话人, 内容) 的有序列表
    pub dialog: Vec<(String, String)>,
}

/// 每本书的持久化文档
///
/// 跨循环迭代、跨进程重启单调增长：章节只会新增或同号覆盖，不会删除。
/// JSON 中的键统一用字符串形式的章节号。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDocument {
    pub book_name: String,
    pub book_grade: String,
    pub book_info: String,
    /// 旧文档可能缺这两个表，读入时按空表处理而不是报错
    #[serde(default)]
    pub chapter_breakdown: BTreeMap<String, String>,
    #[serde(default)]
    pub book_content: BTreeMap<String, ChapterArtifact>,
}

impl BookDocument {
    /// 创建一个不含任何章节内容的新文档
    pub fn new(
        book_name: impl Into<String>,
        book_grade: impl Into<String>,
        book_info: impl Into<String>,
        chapter_breakdown: &Syllabus,
    ) -> Self {
        Self {
            book_name: book_name.into(),
            book_grade: book_grade.into(),
            book_info: book_info.into(),
            chapter_breakdown: chapter_breakdown
                .iter()
                .map(|(no, title)| (no.to_string(), title.clone()))
                .collect(),
            book_content: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_chapter_no() {
        let mut syllabus = Syllabus::new();
        assert_eq!(max_chapter_no(&syllabus), 0);

        syllabus.insert(1, "Intro".to_string());
        syllabus.insert(3, "Advanced".to_string());
        assert_eq!(max_chapter_no(&syllabus), 3);
    }

    #[test]
    fn test_document_without_content_maps_loads_as_empty() {
        // 旧文档可能没有 book_content / chapter_breakdown，照常读入
        let raw = r#"{"book_name": "Literature", "book_grade": "8", "book_info": "A book."}"#;
        let doc: BookDocument = serde_json::from_str(raw).unwrap();
        assert!(doc.chapter_breakdown.is_empty());
        assert!(doc.book_content.is_empty());
    }

    #[test]
    fn test_document_json_shape() {
        let mut syllabus = Syllabus::new();
        syllabus.insert(1, "Intro".to_string());

        let mut doc = BookDocument::new("Literature", "8", "A book.", &syllabus);
        doc.book_content.insert(
            "1".to_string(),
            ChapterArtifact {
                chapter_title: "Intro".to_string(),
                chapter_text: "Text.".to_string(),
                qna: vec![("q".to_string(), "a".to_string())],
                dialog: vec![("Teacher".to_string(), "hi".to_string())],
            },
        );

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["chapter_breakdown"]["1"], "Intro");
        assert_eq!(json["book_content"]["1"]["qna"][0][0], "q");
        assert_eq!(json["book_content"]["1"]["dialog"][0][0], "Teacher");
    }
}
