/// 安全截断 UTF-8 字符串，保证不会切在多字节字符中间
pub fn truncate_str_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    // 从 max_bytes 向前找合法的字符边界
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// 日志预览：截断长文本并补省略号，避免把完整 prompt 写进日志
pub fn log_preview(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    format!("{}...", truncate_str_safe(s, max_bytes))
}

/// 剥掉模型输出外层的 markdown 代码栅栏
///
/// 结构化路由要求模型只输出 JSON，但模型经常包一层 ```json ... ```，
/// 解析前先剥掉；没有栅栏时原样返回（只去首尾空白）。
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 跳过栅栏后的语言标签行（如 ```json）
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => return trimmed,
    };
    match rest.rfind("```") {
        Some(idx) => rest[..idx].trim(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "物理很有趣";
        // 每个汉字 3 字节，4 字节处不是边界，应回退到 3
        assert_eq!(truncate_str_safe(s, 4), "物");
        assert_eq!(truncate_str_safe(s, 15), s);
        assert_eq!(truncate_str_safe("abc", 2), "ab");
    }

    #[test]
    fn preview_appends_ellipsis_only_when_truncated() {
        assert_eq!(log_preview("short", 10), "short");
        assert_eq!(log_preview("0123456789abc", 10), "0123456789...");
    }

    #[test]
    fn strips_fenced_json() {
        let fenced = "```json\n[{\"day\":1}]\n```";
        assert_eq!(strip_code_fence(fenced), "[{\"day\":1}]");

        let bare_fence = "```\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(bare_fence), "{\"a\":1}");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("  {\"a\":1} \n"), "{\"a\":1}");
        assert_eq!(strip_code_fence("plain answer"), "plain answer");
    }
}
