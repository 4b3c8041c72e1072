//! 生成式文本服务商接入
//!
//! 出站契约：`POST {base}/v1beta/models/{model}:generateContent?key={key}`，
//! 请求体 `{ contents: [{ parts: [{ text }] }] }`，
//! 响应取 `candidates[0].content.parts[0].text`。

mod client;
mod types;

pub use client::GeminiClient;
