//! 持久化合并 - 业务能力层
//!
//! 每本书一个 JSON 文档，按章节做读-改-写合并：已有章节保留，
//! 当前章节新增或同号覆盖。跨循环迭代、跨进程重启都在同一份
//! 文档上累积，而不是整本重写丢历史。
//!
//! 假设单写者、同一时刻只有一次运行；不加锁。两次并发运行写同
//! 一本书可能丢失其中一方的更新，这是已接受的限制。

use crate::error::{AppError, PersistenceError};
use crate::models::{BookDocument, ChapterArtifact};
use crate::workflow::state::WorkflowState;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// 书籍文档导出器
pub struct BookExporter {
    output_folder: PathBuf,
}

impl BookExporter {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    /// 由 (书名, 年级) 确定的存储路径
    pub fn document_path(&self, book_name: &str, book_grade: &str) -> PathBuf {
        self.output_folder
            .join(format!("{}_{}_content.json", book_name, book_grade))
    }

    /// 把当前章节的产物合并写入该书的文档
    ///
    /// 文档不存在则先创建（写入元信息 + 完整大纲 + 空章节内容表）；
    /// 存在则整体读入。随后设置当前章节并整文件重写。
    /// 同号重复导出是幂等覆盖，其余章节不受影响。
    pub async fn export_chapter(&self, state: &WorkflowState) -> Result<PathBuf> {
        let path = self.document_path(&state.book_name, &state.book_grade);
        let mut document = self.load_or_create(&path, state).await?;

        let artifact = ChapterArtifact {
            chapter_title: state.chapter_name.clone(),
            chapter_text: state.chapter_text.clone(),
            qna: state.qna.clone(),
            dialog: state.dialog.clone(),
        };
        document
            .book_content
            .insert(state.chapter_number.to_string(), artifact);

        let json = serde_json::to_string_pretty(&document).map_err(|e| {
            AppError::Persistence(PersistenceError::SerializeFailed {
                source: Box::new(e),
            })
        })?;
        fs::write(&path, json)
            .await
            .map_err(|e| AppError::doc_write_failed(path.display().to_string(), e))?;

        info!("📤 第 {} 章已导出到 {}", state.chapter_number, path.display());
        Ok(path)
    }

    async fn load_or_create(&self, path: &Path, state: &WorkflowState) -> Result<BookDocument> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .await
                .map_err(|e| AppError::doc_read_failed(path.display().to_string(), e))?;

            // 已有文档读不出来就中止，绝不用空文档覆盖它
            let document = serde_json::from_str(&content).map_err(|e| {
                AppError::Persistence(PersistenceError::CorruptDocument {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })
            })?;
            Ok(document)
        } else {
            debug!("文档不存在，创建新文档: {}", path.display());
            Ok(BookDocument::new(
                &state.book_name,
                &state.book_grade,
                &state.book_info,
                &state.chapter_breakdown,
            ))
        }
    }
}
