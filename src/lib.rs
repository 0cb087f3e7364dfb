//! # Book Content Workflow
//!
//! 一个按章节迭代生成教材内容的 Rust 应用程序
//!
//! 给定书名和年级，依次生成书籍简介、章节大纲，然后逐章生成正文、
//! 问答（Q&A）和师生对话，并把每一章的结果合并写入该书的 JSON 文档。
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 纯数据结构（BookRequest / ChapterArtifact / BookDocument）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `TextGenerator` / `LlmGenerator` - 文本生成能力（LLM）
//! - `extract_qna` / `extract_dialog` - 纯函数抽取能力（尽力而为，永不失败）
//! - `parse_syllabus` - 章节大纲解析能力（解析失败即致命错误）
//! - `BookExporter` - 按书合并写 JSON 文档的能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一本书"的完整处理流程
//! - `WorkflowState` / `StatePatch` - 贯穿全流程的共享状态与浅合并更新
//! - `WorkflowGraph` - 固定步骤图 + 唯一回边（逐章循环）
//! - `steps` - 七个步骤节点与循环判定
//!
//! ### ④ 编排层（App）
//! - `app` - 组装依赖、编译步骤图、运行并输出统计

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{BookDocument, BookRequest, ChapterArtifact, Syllabus};
pub use services::export::BookExporter;
pub use services::extract::{extract_dialog, extract_qna};
pub use services::generator::{LlmGenerator, TextGenerator};
pub use services::syllabus::parse_syllabus;
pub use workflow::graph::{CompiledWorkflow, LoopDecision, StepNode, WorkflowGraph};
pub use workflow::state::{StatePatch, WorkflowState};
pub use workflow::{build_workflow, steps};
