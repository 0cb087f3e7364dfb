use anyhow::Result;
use book_content_workflow::models::BookRequest;
use book_content_workflow::utils::logging;
use book_content_workflow::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 本次运行要生成的书
    let request = BookRequest::new(&config.book_name, &config.book_grade);

    // 初始化并运行应用
    let app = App::new(config);
    let _final_state = app.run(request).await?;

    Ok(())
}
