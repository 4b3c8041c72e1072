use serde::{Deserialize, Serialize};

/// generateContent 请求体：`{ contents: [{ parts: [{ text }] }] }`
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// generateContent 响应体，只取本网关用得到的字段
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    /// 内容命中安全策略时服务商会省略 content
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl GenerateContentResponse {
    /// 提取 `candidates[0].content.parts[0].text`，缺失或空白视为没有
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|part| part.text.as_str())
            .filter(|text| !text.trim().is_empty())
    }
}

/// 服务商错误响应：`{ "error": { "message": ... } }`
#[derive(Debug, Deserialize)]
pub struct ProviderErrorResponse {
    pub error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderErrorDetail {
    pub message: Option<String>,
}
