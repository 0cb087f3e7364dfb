//! 结构化抽取 - 业务能力层
//!
//! 两个独立的逐行扫描器，把 LLM 的自由文本变成结构化记录。
//! 都是纯函数、调用之间无状态、尽力而为：认不出来的片段静默丢弃，
//! 永远不返回错误。LLM 输出再离谱也不能让运行崩溃。

/// 从原始文本抽取 (问题, 答案) 对
///
/// 规则：
/// - `Q:` 开头的行记为待配对问题（已有待配对问题时直接覆盖，
///   没有后续答案的问题永远不会产出任何对）
/// - `A:` 开头的行且有待配对问题时产出一对并清空
/// - 没有待配对问题的 `A:` 行忽略
/// - 其余行一律忽略；结尾处未配对的问题丢弃
pub fn extract_qna(raw: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut current_q: Option<String> = None;

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("Q:") {
            current_q = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("A:") {
            if let Some(q) = current_q.take() {
                pairs.push((q, rest.trim().to_string()));
            }
        }
    }

    pairs
}

const TEACHER_MARKER: &str = "**Teacher**:";
const STUDENT_MARKER: &str = "**Student**:";

/// 从原始文本抽取 (说话人, 内容) 轮次
///
/// 规则：
/// - `**Teacher**:` 行总是开启新的 Teacher 轮次
/// - `**Student**:` 行只有在上一个说话人是 Teacher 时才开启新轮次
/// - 其余行（已有轮次时）用空格拼接到最近一个轮次的内容后面；
///   还没有任何轮次时静默丢弃
///
/// 注意：不满足交替条件的 `**Student**:` 行不按标记处理，整行
/// （含字面标记）会走拼接规则并入上一轮次。这是沿袭下来的既有
/// 行为，改动它必须显式换行为、不能悄悄变。
pub fn extract_dialog(raw: &str) -> Vec<(String, String)> {
    let mut turns: Vec<(String, String)> = Vec::new();
    let mut last_speaker: Option<&str> = None;

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix(TEACHER_MARKER) {
            turns.push(("Teacher".to_string(), rest.trim().to_string()));
            last_speaker = Some("Teacher");
        } else if line.starts_with(STUDENT_MARKER) && last_speaker == Some("Teacher") {
            let rest = &line[STUDENT_MARKER.len()..];
            turns.push(("Student".to_string(), rest.trim().to_string()));
            last_speaker = Some("Student");
        } else if last_speaker.is_some() {
            if let Some(last) = turns.last_mut() {
                last.1.push(' ');
                last.1.push_str(line.trim());
            }
        }
    }

    turns
}
