//! 文本生成服务 - 业务能力层
//!
//! 只负责"给一段 prompt、拿一段文本"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）
//!
//! 生成器通过 `TextGenerator` trait 显式注入到各个步骤节点，
//! 不存在进程级单例；测试时用脚本化实现替换即可。

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, GenerationError};
use crate::workflow::state::WorkflowState;

/// 文本生成能力
///
/// 返回的文本可能是任意格式；除大纲解析外，下游抽取一律尽力而为，
/// 绝不因为格式问题让运行崩溃。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// 生产环境的 LLM 生成器
pub struct LlmGenerator {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmGenerator {
    /// 创建新的 LLM 生成器
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("prompt 长度: {} 字符", prompt.len());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(0.7)
            .max_tokens(2048u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let choice = response.choices.first().ok_or_else(|| {
            AppError::Generation(GenerationError::EmptyResponse {
                model: self.model_name.clone(),
            })
        })?;

        let content = choice.message.content.clone().ok_or_else(|| {
            AppError::Generation(GenerationError::EmptyContent {
                model: self.model_name.clone(),
            })
        })?;

        Ok(content.trim().to_string())
    }
}

// ========== prompt 构建 ==========

/// 书籍简介 prompt
pub fn book_info_prompt(state: &WorkflowState) -> String {
    format!(
        "You are an expert educational content writer. \
         Write a concise and engaging description for a textbook titled '{}', \
         appropriate for grade {} students. The description should be informative, \
         age-appropriate, and suitable as an introduction to the subject. \
         No more than 100 words.\n\
         Note: {} is the student's grade level from 1 to 12 by British system.",
        state.book_name, state.book_grade, state.book_grade
    )
}

/// 章节大纲 prompt（要求输出章节号到标题的 JSON 映射）
pub fn syllabus_prompt(state: &WorkflowState) -> String {
    format!(
        "You are an expert educational content writer.\n\
         Given the following textbook information:\n\
         - Book Name: {}\n\
         - Grade: {}\n\
         - Book Description: {}\n\
         Create a sophisticated and comprehensive list of chapters (not more than 4) \
         that would cover the full syllabus for this book. \
         Each chapter should have a number and a clear, descriptive title.\n\
         Return the result as a JSON object where the key is the chapter number \
         and the value is the chapter title.\n\
         Example: {{\"1\": \"Introduction to ...\", \"2\": \"Fundamentals of ...\"}}\n\
         Output only the JSON, without ```json fences.",
        state.book_name, state.book_grade, state.book_info
    )
}

/// 章节正文 prompt
pub fn chapter_text_prompt(state: &WorkflowState, chapter_title: &str) -> String {
    format!(
        "Write a textbook-style explanation for the chapter titled '{}' \
         in the book '{}' for grade {} students. \
         The explanation should be detailed, informative, and suitable for the target audience. \
         The explanation should be concise and not exceed 1000 words.",
        chapter_title, state.book_name, state.book_grade
    )
}

/// 问答 prompt（要求 'Q: ... A: ...' 行格式）
pub fn qna_prompt(state: &WorkflowState) -> String {
    format!(
        "Write up 2-3 questions and answers (Q&A) for chapter '{}' and from the content of '{}' \
         of the grade {} '{}' textbook. Format as 'Q: ... A: ...'.",
        state.chapter_name, state.chapter_text, state.book_grade, state.book_name
    )
}

/// 师生对话 prompt（要求 **Teacher**: / **Student**: 行格式）
pub fn dialog_prompt(state: &WorkflowState) -> String {
    format!(
        "Generate a short dialogue (2-3 exchanges) between a teacher (**Teacher**) and \
         a student (**Student**) about the chapter '{}' from the grade {} '{}' textbook. \
         The dialogue should be engaging and educational.",
        state.chapter_name, state.book_grade, state.book_name
    )
}
