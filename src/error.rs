use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 文本生成错误
    Generation(GenerationError),
    /// 章节大纲解析错误
    Syllabus(SyllabusError),
    /// 持久化错误
    Persistence(PersistenceError),
    /// 步骤图错误
    Graph(GraphError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Generation(e) => write!(f, "生成错误: {}", e),
            AppError::Syllabus(e) => write!(f, "大纲错误: {}", e),
            AppError::Persistence(e) => write!(f, "持久化错误: {}", e),
            AppError::Graph(e) => write!(f, "步骤图错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Generation(e) => Some(e),
            AppError::Syllabus(e) => Some(e),
            AppError::Persistence(e) => Some(e),
            AppError::Graph(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 文本生成错误
///
/// 生成失败即致命，不做自动重试（已持久化的章节保留在磁盘上）
#[derive(Debug)]
pub enum GenerationError {
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回结果为空
    EmptyResponse {
        model: String,
    },
    /// 返回内容为空
    EmptyContent {
        model: String,
    },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            GenerationError::EmptyResponse { model } => {
                write!(f, "LLM返回结果为空 (模型: {})", model)
            }
            GenerationError::EmptyContent { model } => {
                write!(f, "LLM返回内容为空 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 章节大纲解析错误
///
/// 没有大纲就无法开始任何章节工作，因此全部致命
#[derive(Debug)]
pub enum SyllabusError {
    /// 输出不是映射或记录数组
    NotAMapping {
        snippet: String,
    },
    /// JSON 解析失败（已做宽松归一化之后）
    ParseFailed {
        snippet: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 章节号不合法（必须是正整数）
    InvalidChapterNumber {
        key: String,
    },
    /// 章节标题不是字符串
    InvalidChapterTitle {
        key: String,
    },
    /// 章节号不连续（必须覆盖 1..=N）
    NonContiguous {
        expected: u32,
        found: u32,
    },
}

impl fmt::Display for SyllabusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyllabusError::NotAMapping { snippet } => {
                write!(f, "大纲输出不是章节映射: {}", snippet)
            }
            SyllabusError::ParseFailed { snippet, source } => {
                write!(f, "大纲解析失败 ({}): {}", snippet, source)
            }
            SyllabusError::InvalidChapterNumber { key } => {
                write!(f, "章节号不合法 (必须为正整数): {}", key)
            }
            SyllabusError::InvalidChapterTitle { key } => {
                write!(f, "章节 {} 的标题不是字符串", key)
            }
            SyllabusError::NonContiguous { expected, found } => {
                write!(f, "章节号不连续: 期望 {}, 实际 {}", expected, found)
            }
        }
    }
}

impl std::error::Error for SyllabusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyllabusError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 持久化错误
#[derive(Debug)]
pub enum PersistenceError {
    /// 读取已有文档失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 已有文档无法解析（绝不用空文档覆盖它）
    CorruptDocument {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 序列化失败
    SerializeFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文档失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::ReadFailed { path, source } => {
                write!(f, "读取文档失败 ({}): {}", path, source)
            }
            PersistenceError::CorruptDocument { path, source } => {
                write!(f, "已有文档损坏，拒绝覆盖 ({}): {}", path, source)
            }
            PersistenceError::SerializeFailed { source } => {
                write!(f, "文档序列化失败: {}", source)
            }
            PersistenceError::WriteFailed { path, source } => {
                write!(f, "写入文档失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::ReadFailed { source, .. }
            | PersistenceError::CorruptDocument { source, .. }
            | PersistenceError::SerializeFailed { source }
            | PersistenceError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 步骤图错误（compile 阶段校验）
#[derive(Debug)]
pub enum GraphError {
    /// 未设置入口节点
    MissingEntry,
    /// 边引用了不存在的节点
    UnknownNode {
        name: String,
    },
    /// 节点重复注册
    DuplicateNode {
        name: String,
    },
    /// 节点已有出边
    DuplicateEdge {
        from: String,
    },
    /// 回边只允许一条
    DuplicateLoopEdge {
        from: String,
        to: String,
    },
    /// 去掉回边后仍存在环
    CycleDetected {
        node: String,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::MissingEntry => write!(f, "未设置入口节点"),
            GraphError::UnknownNode { name } => write!(f, "引用了不存在的节点: {}", name),
            GraphError::DuplicateNode { name } => write!(f, "节点重复注册: {}", name),
            GraphError::DuplicateEdge { from } => write!(f, "节点 {} 已有出边", from),
            GraphError::DuplicateLoopEdge { from, to } => {
                write!(f, "回边只允许一条 (多余的: {} -> {})", from, to)
            }
            GraphError::CycleDetected { node } => {
                write!(f, "去掉回边后仍存在环 (经过节点: {})", node)
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建 LLM API 调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Generation(GenerationError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建文档读取错误
    pub fn doc_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence(PersistenceError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文档写入错误
    pub fn doc_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence(PersistenceError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
