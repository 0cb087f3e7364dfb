//! 编排层
//!
//! 组装依赖（生成器 + 导出器）、编译步骤图、跑完一本书并输出统计。
//! 整个流水线严格串行：第 n 章完整走完（生成 → 抽取 → 持久化）
//! 之后才开始第 n+1 章，因为持久化对同一个文件做读-改-写，
//! 且下一章号要等本章状态合并完才知道。

use crate::config::Config;
use crate::models::BookRequest;
use crate::services::export::BookExporter;
use crate::services::generator::{LlmGenerator, TextGenerator};
use crate::utils::logging;
use crate::workflow::{build_workflow, WorkflowState};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

/// 应用主结构
pub struct App {
    config: Config,
    generator: Arc<dyn TextGenerator>,
}

impl App {
    /// 使用生产环境的 LLM 生成器初始化
    pub fn new(config: Config) -> Self {
        let generator: Arc<dyn TextGenerator> = Arc::new(LlmGenerator::new(&config));
        Self { config, generator }
    }

    /// 注入自定义生成器（测试或替换后端时使用）
    pub fn with_generator(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }

    /// 为一本书跑完整个章节流程
    ///
    /// 成功时返回最终状态；失败时立即中止，之前已持久化的章节
    /// 保留在磁盘上作为部分结果。
    pub async fn run(&self, request: BookRequest) -> Result<WorkflowState> {
        logging::log_startup(&request);

        fs::create_dir_all(&self.config.output_folder)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.config.output_folder))?;

        let exporter = BookExporter::new(self.config.output_folder.clone());
        let workflow = build_workflow(self.generator.clone(), exporter)?;

        let started = chrono::Local::now();
        let initial = WorkflowState::new(&request);
        let final_state = workflow.run(initial).await?;

        logging::print_final_stats(&final_state, started);
        info!(
            "📄 文档路径: {}",
            BookExporter::new(self.config.output_folder.clone())
                .document_path(&request.book_name, &request.book_grade)
                .display()
        );

        Ok(final_state)
    }
}
