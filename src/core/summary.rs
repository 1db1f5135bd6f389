use crate::core::transcript::truncate_chars;
use crate::error::{Error, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::responses::{
        CreateResponseArgs, EasyInputMessageArgs, InputItem, InputParam, OutputItem,
        OutputMessageContent, Role,
    },
};
use tracing::{debug, warn};

/// Transcripts are cut to this many characters before being sent.
pub const SUMMARY_INPUT_LIMIT: usize = 8000;
const MAX_OUTPUT_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.5;

const SYSTEM_PROMPT: &str = "You are a teacher who is good at explaining things. \
Write as if you were explaining to middle school students: kind, clear and well organised.";

#[derive(Clone)]
pub struct SummaryService {
    client: Client<OpenAIConfig>,
    model: String,
    language: String,
}

impl SummaryService {
    pub fn new(api_key: &str, model: impl Into<String>, language: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.into(),
            language: language.into(),
        }
    }

    /// Key sentences, a three line summary, keywords and check questions, as Markdown.
    pub async fn summarize(&self, transcript: &str, title: Option<&str>) -> Result<String> {
        let prompt = build_prompt(transcript, title, &self.language);
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Requesting summary");

        let request = CreateResponseArgs::default()
            .model(self.model.as_str())
            .max_output_tokens(MAX_OUTPUT_TOKENS)
            .temperature(TEMPERATURE)
            .input(InputParam::Items(vec![
                InputItem::EasyMessage(
                    EasyInputMessageArgs::default()
                        .role(Role::System)
                        .content(SYSTEM_PROMPT)
                        .build()?,
                ),
                InputItem::EasyMessage(
                    EasyInputMessageArgs::default()
                        .role(Role::User)
                        .content(prompt)
                        .build()?,
                ),
            ]))
            .build()?;

        let response = self.client.responses().create(request).await?;

        let mut content = String::new();
        for output in response.output {
            if let OutputItem::Message(out) = output {
                for c in out.content {
                    match c {
                        OutputMessageContent::OutputText(text) => content.push_str(&text.text),
                        _ => {
                            warn!("Unexpected content type: {c:?}");
                            continue;
                        }
                    }
                }
            }
        }

        if content.trim().is_empty() {
            return Err(Error::custom("The model returned an empty summary"));
        }

        Ok(content)
    }
}

pub fn build_prompt(transcript: &str, title: Option<&str>, language: &str) -> String {
    let transcript = truncate_chars(transcript, SUMMARY_INPUT_LIMIT);
    let title = title.unwrap_or("No title information");

    format!(
        "Below is the transcript of a YouTube video. Use the title as well if it helps.

[Video title]
{title}

[Transcript]
{transcript}

Based on this content, answer in {language} using the following format.

1. ✏️ Key sentences (the 3 to 5 most important sentences, numbered)
2. 📌 Three line summary (exactly three sentences)
3. 🧷 Keywords (5 to 10, separated by commas)
4. ❓ Comprehension check (5 questions at middle school level, numbered)

Example layout:

1. ✏️ Key sentences
1) ...
2) ...
3) ...

2. 📌 Three line summary
- ...
- ...
- ...

3. 🧷 Keywords
Keywords: keyword1, keyword2, keyword3, ...

4. ❓ Comprehension check
1) ...
2) ...
3) ...
4) ...
5) ...
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_title_and_language() {
        let prompt = build_prompt("cells divide", Some("Mitosis"), "Korean");
        assert!(prompt.contains("[Video title]\nMitosis"));
        assert!(prompt.contains("[Transcript]\ncells divide"));
        assert!(prompt.contains("answer in Korean"));
    }

    #[test]
    fn prompt_without_title() {
        let prompt = build_prompt("text", None, "English");
        assert!(prompt.contains("No title information"));
    }

    #[test]
    fn long_transcripts_are_cut() {
        let transcript = "가".repeat(SUMMARY_INPUT_LIMIT + 500);
        let prompt = build_prompt(&transcript, None, "Korean");
        assert_eq!(prompt.matches('가').count(), SUMMARY_INPUT_LIMIT);
    }
}
