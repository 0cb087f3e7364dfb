//! 流程共享状态
//!
//! 一个 `WorkflowState` 贯穿整张步骤图；每个节点只返回 `StatePatch`
//! （要覆盖哪些字段），由引擎做浅合并：`Some` 的字段整体替换，
//! `None` 的字段保持原值，不做任何深合并。

use crate::models::{BookRequest, Syllabus};
use std::collections::BTreeMap;

/// 贯穿全流程的共享状态
///
/// 运行结束后随 run 返回给调用方，不做持久化（持久化的是 BookDocument）。
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    // 用户输入
    pub book_name: String,
    pub book_grade: String,

    // 书籍信息
    pub book_info: String,
    pub chapter_breakdown: Syllabus,

    // 当前章节
    pub chapter_number: u32,
    pub chapter_name: String,
    pub chapter_text: String,

    // 累积结果
    pub chapters: BTreeMap<u32, String>,
    pub qna: Vec<(String, String)>,
    pub dialog: Vec<(String, String)>,
    pub max_chapter_no: u32,
}

impl WorkflowState {
    /// 初始状态：从第 1 章开始
    pub fn new(request: &BookRequest) -> Self {
        Self {
            book_name: request.book_name.clone(),
            book_grade: request.book_grade.clone(),
            chapter_number: 1,
            ..Default::default()
        }
    }

    /// 浅合并一个部分更新
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(v) = patch.book_info {
            self.book_info = v;
        }
        if let Some(v) = patch.chapter_breakdown {
            self.chapter_breakdown = v;
        }
        if let Some(v) = patch.chapter_number {
            self.chapter_number = v;
        }
        if let Some(v) = patch.chapter_name {
            self.chapter_name = v;
        }
        if let Some(v) = patch.chapter_text {
            self.chapter_text = v;
        }
        if let Some(v) = patch.chapters {
            self.chapters = v;
        }
        if let Some(v) = patch.qna {
            self.qna = v;
        }
        if let Some(v) = patch.dialog {
            self.dialog = v;
        }
        if let Some(v) = patch.max_chapter_no {
            self.max_chapter_no = v;
        }
    }
}

/// 节点返回的部分更新
///
/// 字段与 `WorkflowState` 一一对应（用户输入除外，book_name / book_grade
/// 在整个运行期间不可变，任何节点都不能改写它们）。
#[derive(Debug, Default)]
pub struct StatePatch {
    pub book_info: Option<String>,
    pub chapter_breakdown: Option<Syllabus>,
    pub chapter_number: Option<u32>,
    pub chapter_name: Option<String>,
    pub chapter_text: Option<String>,
    pub chapters: Option<BTreeMap<u32, String>>,
    pub qna: Option<Vec<(String, String)>>,
    pub dialog: Option<Vec<(String, String)>>,
    pub max_chapter_no: Option<u32>,
}

impl StatePatch {
    /// 空更新（所有字段保持原值）
    pub fn none() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_starts_at_chapter_one() {
        let request = BookRequest::new("Literature", "8");
        let state = WorkflowState::new(&request);
        assert_eq!(state.chapter_number, 1);
        assert_eq!(state.max_chapter_no, 0);
        assert!(state.chapters.is_empty());
    }

    #[test]
    fn test_apply_overwrites_only_some_fields() {
        let request = BookRequest::new("Literature", "8");
        let mut state = WorkflowState::new(&request);
        state.book_info = "old info".to_string();
        state.qna = vec![("q1".to_string(), "a1".to_string())];

        let patch = StatePatch {
            qna: Some(vec![("q2".to_string(), "a2".to_string())]),
            ..Default::default()
        };
        state.apply(patch);

        // Some 的字段整体替换，None 的字段原样保留
        assert_eq!(state.qna, vec![("q2".to_string(), "a2".to_string())]);
        assert_eq!(state.book_info, "old info");
        assert_eq!(state.chapter_number, 1);
    }

    #[test]
    fn test_apply_replaces_collections_wholesale() {
        let request = BookRequest::new("Literature", "8");
        let mut state = WorkflowState::new(&request);
        state.chapters.insert(1, "One".to_string());

        let mut replacement = BTreeMap::new();
        replacement.insert(2, "Two".to_string());
        state.apply(StatePatch {
            chapters: Some(replacement),
            ..Default::default()
        });

        // 不是并集：返回的映射整体取代旧值
        assert_eq!(state.chapters.len(), 1);
        assert_eq!(state.chapters.get(&2).map(String::as_str), Some("Two"));
    }
}
