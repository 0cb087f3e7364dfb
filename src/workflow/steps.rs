//! 章节流程的步骤节点 - 流程层
//!
//! 七个节点 + 循环判定，执行顺序固定：
//!
//! book_info → syllabus → chapter_text → qna → dialog → persist
//!     → (条件边) increment → chapter_text（唯一回边）| 终止
//!
//! 所有节点只依赖注入进来的业务能力（生成器 / 导出器），
//! 不持有全局单例，也不感知图结构。

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::max_chapter_no;
use crate::services::export::BookExporter;
use crate::services::extract::{extract_dialog, extract_qna};
use crate::services::generator::{self, TextGenerator};
use crate::services::syllabus::parse_syllabus;
use crate::utils::logging::truncate_text;
use crate::workflow::graph::{LoopDecision, NodeName, StepNode};
use crate::workflow::state::{StatePatch, WorkflowState};

/// 循环判定：章节号达到最大章节号即终止
///
/// 第一章总是先生成、抽取并持久化完，然后才第一次评估这里。
/// 空大纲（max = 0）也会先产出第 1 章，再观察到 1 >= 0 而终止；
/// 本判定永远拦不住第一轮。
pub fn decide(chapter_number: u32, max_chapter_no: u32) -> LoopDecision {
    if chapter_number >= max_chapter_no {
        LoopDecision::Terminate
    } else {
        LoopDecision::Continue
    }
}

/// 条件边使用的判定函数
pub fn chapter_loop_condition(state: &WorkflowState) -> LoopDecision {
    decide(state.chapter_number, state.max_chapter_no)
}

/// 生成书籍简介
pub struct BookInfoStep {
    generator: Arc<dyn TextGenerator>,
}

impl BookInfoStep {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StepNode for BookInfoStep {
    fn name(&self) -> NodeName {
        "book_info"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        info!(
            "📖 正在生成书籍简介: {} (年级 {})",
            state.book_name, state.book_grade
        );

        let prompt = generator::book_info_prompt(state);
        let book_info = self
            .generator
            .generate(&prompt)
            .await
            .context("生成书籍简介失败")?;

        debug!("简介: {}", truncate_text(&book_info, 80));

        Ok(StatePatch {
            book_info: Some(book_info),
            ..Default::default()
        })
    }
}

/// 生成并解析章节大纲
///
/// 大纲一旦定下，max_chapter_no 在本次运行内不再变化。
pub struct SyllabusStep {
    generator: Arc<dyn TextGenerator>,
}

impl SyllabusStep {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StepNode for SyllabusStep {
    fn name(&self) -> NodeName {
        "syllabus"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        info!("📑 正在生成章节大纲...");

        let prompt = generator::syllabus_prompt(state);
        let raw = self
            .generator
            .generate(&prompt)
            .await
            .context("生成章节大纲失败")?;

        // 解析失败即致命：没有大纲就没有章节工作可做
        let breakdown = parse_syllabus(&raw).context("章节大纲解析失败")?;
        let max = max_chapter_no(&breakdown);

        info!("✓ 大纲确定，共 {} 章", max);
        for (number, title) in &breakdown {
            debug!("  第 {} 章: {}", number, title);
        }

        Ok(StatePatch {
            chapter_breakdown: Some(breakdown),
            max_chapter_no: Some(max),
            ..Default::default()
        })
    }
}

/// 生成当前章节的正文
pub struct ChapterTextStep {
    generator: Arc<dyn TextGenerator>,
}

impl ChapterTextStep {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StepNode for ChapterTextStep {
    fn name(&self) -> NodeName {
        "chapter_text"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let ch_no = state.chapter_number;
        // 空大纲时标题为空串，仍然照常生成第 1 章
        let chapter_title = state
            .chapter_breakdown
            .get(&ch_no)
            .cloned()
            .unwrap_or_default();

        info!(
            "✍️ 正在生成第 {}/{} 章正文: {}",
            ch_no, state.max_chapter_no, chapter_title
        );

        let prompt = generator::chapter_text_prompt(state, &chapter_title);
        let chapter_text = self
            .generator
            .generate(&prompt)
            .await
            .with_context(|| format!("生成第 {} 章正文失败", ch_no))?;

        let mut chapters = state.chapters.clone();
        chapters.insert(ch_no, chapter_title.clone());

        Ok(StatePatch {
            chapter_name: Some(chapter_title),
            chapter_text: Some(chapter_text),
            chapter_number: Some(ch_no),
            chapters: Some(chapters),
            ..Default::default()
        })
    }
}

/// 为当前章节生成并抽取问答
pub struct QnaStep {
    generator: Arc<dyn TextGenerator>,
}

impl QnaStep {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StepNode for QnaStep {
    fn name(&self) -> NodeName {
        "qna"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        info!("❓ 正在生成第 {} 章问答...", state.chapter_number);

        let prompt = generator::qna_prompt(state);
        let raw = self
            .generator
            .generate(&prompt)
            .await
            .with_context(|| format!("生成第 {} 章问答失败", state.chapter_number))?;

        // 抽取永不失败，认不出的片段直接丢弃
        let qna = extract_qna(&raw);
        info!("✓ 抽取到 {} 组问答", qna.len());

        Ok(StatePatch {
            qna: Some(qna),
            ..Default::default()
        })
    }
}

/// 为当前章节生成并抽取师生对话
pub struct DialogStep {
    generator: Arc<dyn TextGenerator>,
}

impl DialogStep {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StepNode for DialogStep {
    fn name(&self) -> NodeName {
        "dialog"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        info!("💬 正在生成第 {} 章师生对话...", state.chapter_number);

        let prompt = generator::dialog_prompt(state);
        let raw = self
            .generator
            .generate(&prompt)
            .await
            .with_context(|| format!("生成第 {} 章对话失败", state.chapter_number))?;

        let dialog = extract_dialog(&raw);
        info!("✓ 抽取到 {} 个对话轮次", dialog.len());

        Ok(StatePatch {
            dialog: Some(dialog),
            ..Default::default()
        })
    }
}

/// 把当前章节合并写入书籍文档
pub struct PersistStep {
    exporter: BookExporter,
}

impl PersistStep {
    pub fn new(exporter: BookExporter) -> Self {
        Self { exporter }
    }
}

#[async_trait]
impl StepNode for PersistStep {
    fn name(&self) -> NodeName {
        "persist"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        self.exporter
            .export_chapter(state)
            .await
            .with_context(|| format!("持久化第 {} 章失败", state.chapter_number))?;

        Ok(StatePatch::none())
    }
}

/// 章节号 +1（只在循环判定决定继续时执行）
pub struct IncrementStep;

#[async_trait]
impl StepNode for IncrementStep {
    fn name(&self) -> NodeName {
        "increment"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let next = state.chapter_number + 1;
        debug!("➡️ 进入第 {} 章", next);

        Ok(StatePatch {
            chapter_number: Some(next),
            ..Default::default()
        })
    }
}
