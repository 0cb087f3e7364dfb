/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 书名
    pub book_name: String,
    /// 年级（英制 1-12）
    pub book_grade: String,
    /// 生成结果 JSON 文档的存放目录
    pub output_folder: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            book_name: "Literature".to_string(),
            book_grade: "8".to_string(),
            output_folder: "output_books".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            book_name: std::env::var("BOOK_NAME").unwrap_or(default.book_name),
            book_grade: std::env::var("BOOK_GRADE").unwrap_or(default.book_grade),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }
}
