pub mod graph;
pub mod state;
pub mod steps;

pub use graph::{CompiledWorkflow, LoopDecision, StepNode, WorkflowGraph};
pub use state::{StatePatch, WorkflowState};

use crate::error::AppResult;
use crate::services::export::BookExporter;
use crate::services::generator::TextGenerator;
use std::sync::Arc;

/// 组装固定的章节流程图并编译
///
/// book_info → syllabus → chapter_text → qna → dialog → persist
///     → (条件边) increment → chapter_text（唯一回边）| 终止
pub fn build_workflow(
    generator: Arc<dyn TextGenerator>,
    exporter: BookExporter,
) -> AppResult<CompiledWorkflow> {
    WorkflowGraph::new()
        .add_node(Box::new(steps::BookInfoStep::new(generator.clone())))
        .add_node(Box::new(steps::SyllabusStep::new(generator.clone())))
        .add_node(Box::new(steps::ChapterTextStep::new(generator.clone())))
        .add_node(Box::new(steps::QnaStep::new(generator.clone())))
        .add_node(Box::new(steps::DialogStep::new(generator)))
        .add_node(Box::new(steps::PersistStep::new(exporter)))
        .add_node(Box::new(steps::IncrementStep))
        .set_entry("book_info")
        .add_edge("book_info", "syllabus")
        .add_edge("syllabus", "chapter_text")
        .add_edge("chapter_text", "qna")
        .add_edge("qna", "dialog")
        .add_edge("dialog", "persist")
        .add_conditional_edge("persist", steps::chapter_loop_condition, "increment")
        .add_loop_edge("increment", "chapter_text")
        .compile()
}
