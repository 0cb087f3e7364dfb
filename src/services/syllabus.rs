//! 章节大纲解析 - 业务能力层
//!
//! 大纲步骤期望生成器输出"章节号 → 标题"的文本编码。接受比严格 JSON
//! 更宽的写法：未加引号的数字键（如 `{1: "Intro"}`）、整体单引号、
//! 以及 ```json 围栏；也接受校验过的记录数组形式
//! `[{"number": 1, "title": "..."}]`。
//!
//! 与尽力而为的抽取器不同，这里解析失败对整个运行是致命的：
//! 没有大纲就没有任何章节工作可做。

use crate::error::{AppError, AppResult, SyllabusError};
use crate::models::Syllabus;
use crate::utils::logging::truncate_text;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// 记录数组形式的单条章节记录
#[derive(Debug, Deserialize)]
struct ChapterRecord {
    number: u32,
    title: String,
}

/// 解析生成器输出的章节大纲
///
/// 成功时返回按章节号排序的映射；空映射合法（表示空大纲，
/// 流程仍会生成恰好一章）。任何解析或校验失败都返回错误。
pub fn parse_syllabus(raw: &str) -> AppResult<Syllabus> {
    let cleaned = strip_code_fences(raw.trim());

    let syllabus = if cleaned.starts_with('[') {
        parse_record_array(cleaned)?
    } else {
        parse_mapping(cleaned)?
    };

    validate_contiguous(&syllabus)?;
    Ok(syllabus)
}

/// 记录数组形式：`[{"number": 1, "title": "Intro"}, ...]`
fn parse_record_array(cleaned: &str) -> AppResult<Syllabus> {
    let records: Vec<ChapterRecord> =
        serde_json::from_str(cleaned).map_err(|e| {
            AppError::Syllabus(SyllabusError::ParseFailed {
                snippet: truncate_text(cleaned, 120),
                source: Box::new(e),
            })
        })?;

    let mut syllabus = Syllabus::new();
    for record in records {
        if record.number == 0 {
            return Err(AppError::Syllabus(SyllabusError::InvalidChapterNumber {
                key: "0".to_string(),
            }));
        }
        syllabus.insert(record.number, record.title);
    }
    Ok(syllabus)
}

/// 映射形式：严格 JSON 或其宽松超集
///
/// 先按严格 JSON 解析；本来就合法的输出绝不做任何改写
/// （标题里出现 `, 2:` 这类形似键的片段时，改写会把它毁掉）。
/// 解析不动了才走宽松归一化再试一次。
fn parse_mapping(cleaned: &str) -> AppResult<Syllabus> {
    let value: Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(_) => {
            let normalized = normalize_literal(cleaned)?;
            serde_json::from_str(&normalized).map_err(|e| {
                AppError::Syllabus(SyllabusError::ParseFailed {
                    snippet: truncate_text(cleaned, 120),
                    source: Box::new(e),
                })
            })?
        }
    };

    let object = value.as_object().ok_or_else(|| {
        AppError::Syllabus(SyllabusError::NotAMapping {
            snippet: truncate_text(cleaned, 120),
        })
    })?;

    let mut syllabus = Syllabus::new();
    for (key, val) in object {
        let number: u32 = key.trim().parse().map_err(|_| {
            AppError::Syllabus(SyllabusError::InvalidChapterNumber { key: key.clone() })
        })?;
        if number == 0 {
            return Err(AppError::Syllabus(SyllabusError::InvalidChapterNumber {
                key: key.clone(),
            }));
        }
        let title = val.as_str().ok_or_else(|| {
            AppError::Syllabus(SyllabusError::InvalidChapterTitle { key: key.clone() })
        })?;
        syllabus.insert(number, title.to_string());
    }
    Ok(syllabus)
}

/// 去掉 ```json / ``` 围栏（prompt 明确要求不要围栏，但 LLM 经常照加）
fn strip_code_fences(text: &str) -> &str {
    let mut result = text;
    if let Some(rest) = result.strip_prefix("```") {
        // 丢掉围栏所在的第一行（可能是 ```json）
        result = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    }
    if let Some(rest) = result.trim_end().strip_suffix("```") {
        result = rest;
    }
    result.trim()
}

/// 把宽松写法归一化成严格 JSON
///
/// - 未加引号的数字键：`{1: "Intro"}` → `{"1": "Intro"}`
/// - 整体单引号（且全文没有双引号时）：`{1: 'Intro'}` → `{1: "Intro"}`
fn normalize_literal(text: &str) -> AppResult<String> {
    let mut normalized = text.to_string();

    // 双引号和单引号混用时不做转换，交给 JSON 解析去报错
    if !normalized.contains('"') {
        let quote_re = Regex::new(r"'([^']*)'")
            .map_err(|e| AppError::Other(format!("正则构建失败: {}", e)))?;
        normalized = quote_re.replace_all(&normalized, "\"$1\"").into_owned();
    }

    Ok(quote_bare_integer_keys(&normalized))
}

/// 给裸数字键补引号：`{1: "Intro"}` → `{"1": "Intro"}`
///
/// 逐字符扫描并跟踪是否在字符串字面量内部，字符串里的
/// `, 2:` 之类的片段原样保留，绝不当键改写。
fn quote_bare_integer_keys(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' | ',' => {
                out.push(c);
                while let Some(&w) = chars.peek() {
                    if w.is_whitespace() {
                        out.push(w);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if digits.is_empty() {
                    continue;
                }
                let mut trailing_ws = String::new();
                while let Some(&w) = chars.peek() {
                    if w.is_whitespace() {
                        trailing_ws.push(w);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // 数字后面（允许空白）紧跟冒号才算键
                if chars.peek() == Some(&':') {
                    out.push('"');
                    out.push_str(&digits);
                    out.push('"');
                } else {
                    out.push_str(&digits);
                }
                out.push_str(&trailing_ws);
            }
            _ => out.push(c),
        }
    }

    out
}

/// 章节号必须恰好覆盖 1..=N（空大纲除外）
fn validate_contiguous(syllabus: &Syllabus) -> AppResult<()> {
    for (i, &number) in syllabus.keys().enumerate() {
        let expected = i as u32 + 1;
        if number != expected {
            return Err(AppError::Syllabus(SyllabusError::NonContiguous {
                expected,
                found: number,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn titles(syllabus: &Syllabus) -> Vec<(u32, &str)> {
        syllabus.iter().map(|(n, t)| (*n, t.as_str())).collect()
    }

    #[test]
    fn test_strict_json_mapping() {
        let syllabus = parse_syllabus(r#"{"1": "Intro", "2": "Basics"}"#).unwrap();
        assert_eq!(titles(&syllabus), vec![(1, "Intro"), (2, "Basics")]);
    }

    #[test]
    fn test_unquoted_integer_keys() {
        let syllabus = parse_syllabus(r#"{1: "Intro", 2: "Basics"}"#).unwrap();
        assert_eq!(titles(&syllabus), vec![(1, "Intro"), (2, "Basics")]);
    }

    #[test]
    fn test_single_quoted_literal() {
        let syllabus = parse_syllabus("{1: 'Intro', 2: 'Basics'}").unwrap();
        assert_eq!(titles(&syllabus), vec![(1, "Intro"), (2, "Basics")]);
    }

    #[test]
    fn test_code_fences_stripped() {
        let raw = "```json\n{1: \"Intro\"}\n```";
        let syllabus = parse_syllabus(raw).unwrap();
        assert_eq!(titles(&syllabus), vec![(1, "Intro")]);
    }

    #[test]
    fn test_record_array_form() {
        let raw = r#"[{"number": 1, "title": "Intro"}, {"number": 2, "title": "Basics"}]"#;
        let syllabus = parse_syllabus(raw).unwrap();
        assert_eq!(titles(&syllabus), vec![(1, "Intro"), (2, "Basics")]);
    }

    #[test]
    fn test_empty_mapping_is_valid() {
        assert!(parse_syllabus("{}").unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_fatal() {
        let result = parse_syllabus("I would suggest four chapters about poetry.");
        assert!(matches!(result.err(), Some(AppError::Syllabus(_))));
    }

    #[test]
    fn test_zero_chapter_number_rejected() {
        let result = parse_syllabus(r#"{0: "Zeroth"}"#);
        assert!(matches!(
            result.err(),
            Some(AppError::Syllabus(SyllabusError::InvalidChapterNumber { .. }))
        ));
    }

    #[test]
    fn test_gap_in_chapter_numbers_rejected() {
        let result = parse_syllabus(r#"{1: "Intro", 3: "Advanced"}"#);
        assert!(matches!(
            result.err(),
            Some(AppError::Syllabus(SyllabusError::NonContiguous {
                expected: 2,
                found: 3
            }))
        ));
    }

    #[test]
    fn test_non_string_title_rejected() {
        let result = parse_syllabus(r#"{1: 42}"#);
        assert!(matches!(
            result.err(),
            Some(AppError::Syllabus(SyllabusError::InvalidChapterTitle { .. }))
        ));
    }

    #[test]
    fn test_strict_json_title_with_key_like_fragment_untouched() {
        // 本来就合法的 JSON 不做任何改写，标题里的 ", 2:" 原样保留
        let syllabus = parse_syllabus(r#"{"1": "Intro, 2: Basics"}"#).unwrap();
        assert_eq!(titles(&syllabus), vec![(1, "Intro, 2: Basics")]);
    }

    #[test]
    fn test_lenient_title_with_key_like_fragment_untouched() {
        // 裸数字键要补引号，但字符串内部的形似键片段不能动
        let syllabus = parse_syllabus(r#"{1: "Intro, 2: Basics"}"#).unwrap();
        assert_eq!(titles(&syllabus), vec![(1, "Intro, 2: Basics")]);
    }

    #[test]
    fn test_apostrophe_inside_double_quoted_title_survives() {
        let syllabus = parse_syllabus(r#"{1: "It's Poetry"}"#).unwrap();
        assert_eq!(titles(&syllabus), vec![(1, "It's Poetry")]);
    }
}
