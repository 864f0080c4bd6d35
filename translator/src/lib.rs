//! Blocking client for a locally-running Ollama server.
//!
//! Everything here blocks the calling thread for the duration of model
//! inference; callers run it on a worker thread, never on the UI loop.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You are a translation engine. Translate the text \
the user provides into the requested target language. Preserve formatting and \
tone. Output only the translation, with no explanations or commentary.";

// Model inference can take minutes on CPU-only hosts.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub target_lang: String,
    pub model: String,
}

/// Wall-clock counters the server reports alongside the response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timing {
    pub total: Option<Duration>,
    pub eval: Option<Duration>,
    pub eval_tokens: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub timing: Timing,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    message: Option<ReplyMessage>,
    #[serde(default)]
    error: Option<String>,
    // Durations are reported in nanoseconds.
    #[serde(default)]
    total_duration: Option<u64>,
    #[serde(default)]
    eval_duration: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    name: String,
}

fn api_url(endpoint: &str, path: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), path)
}

fn user_prompt(target_lang: &str, text: &str) -> String {
    format!("Target Language: {target_lang}\nText: {text}")
}

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("build http client")
}

/// One synchronous translation round trip. Errors carry enough context to
/// be shown to the user as-is.
pub fn translate(endpoint: &str, req: &TranslationRequest) -> anyhow::Result<Translation> {
    let url = api_url(endpoint, "api/chat");
    let prompt = user_prompt(&req.target_lang, &req.text);
    let body = ChatBody {
        model: &req.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: &prompt,
            },
        ],
        stream: false,
    };

    log::debug!(
        "translate: model={} target={} bytes={}",
        req.model,
        req.target_lang,
        req.text.len()
    );
    let resp = client()?
        .post(&url)
        .json(&body)
        .send()
        .with_context(|| format!("reach translation service at {url}"))?;

    let status = resp.status();
    let reply: ChatReply = resp.json().context("decode translation reply")?;
    parse_reply(status.as_u16(), reply)
}

fn parse_reply(status: u16, reply: ChatReply) -> anyhow::Result<Translation> {
    if let Some(err) = reply.error {
        anyhow::bail!("translation service error: {err}");
    }
    if !(200..300).contains(&status) {
        anyhow::bail!("translation service error: http {status}");
    }
    let message = reply
        .message
        .context("translation service returned no message")?;

    Ok(Translation {
        text: message.content,
        timing: Timing {
            total: reply.total_duration.map(Duration::from_nanos),
            eval: reply.eval_duration.map(Duration::from_nanos),
            eval_tokens: reply.eval_count,
        },
    })
}

/// Models the local server has pulled, for the model picker.
pub fn list_models(endpoint: &str) -> anyhow::Result<Vec<String>> {
    let url = api_url(endpoint, "api/tags");
    log::debug!("list_models: url={url}");
    let reply: TagsReply = client()?
        .get(&url)
        .send()
        .with_context(|| format!("reach translation service at {url}"))?
        .json()
        .context("decode model list")?;
    Ok(reply.models.into_iter().map(|m| m.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_has_the_expected_shape() {
        let prompt = user_prompt("ru", "hello");
        let body = ChatBody {
            model: "gemma3:12b",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            stream: false,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "gemma3:12b");
        assert_eq!(v["stream"], false);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "Target Language: ru\nText: hello");
    }

    #[test]
    fn successful_reply_carries_text_and_timing() {
        let reply: ChatReply = serde_json::from_str(
            r#"{
                "message": {"role": "assistant", "content": "привет"},
                "done": true,
                "total_duration": 2000000000,
                "eval_duration": 1500000000,
                "eval_count": 42
            }"#,
        )
        .unwrap();

        let t = parse_reply(200, reply).unwrap();
        assert_eq!(t.text, "привет");
        assert_eq!(t.timing.total, Some(Duration::from_secs(2)));
        assert_eq!(t.timing.eval_tokens, Some(42));
    }

    #[test]
    fn error_reply_surfaces_the_server_message() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"error": "model 'nope' not found"}"#).unwrap();
        let err = parse_reply(404, reply).unwrap_err();
        assert!(err.to_string().contains("model 'nope' not found"));
    }

    #[test]
    fn reply_without_message_is_an_error() {
        let reply: ChatReply = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(parse_reply(200, reply).is_err());
    }

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        assert_eq!(
            api_url("http://127.0.0.1:11434/", "api/chat"),
            "http://127.0.0.1:11434/api/chat"
        );
        assert_eq!(
            api_url("http://127.0.0.1:11434", "api/tags"),
            "http://127.0.0.1:11434/api/tags"
        );
    }

    #[test]
    fn tags_reply_lists_model_names() {
        let reply: TagsReply = serde_json::from_str(
            r#"{"models": [{"name": "gemma3:12b", "size": 1}, {"name": "qwen2.5:7b"}]}"#,
        )
        .unwrap();
        let names: Vec<String> = reply.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["gemma3:12b", "qwen2.5:7b"]);
    }
}
