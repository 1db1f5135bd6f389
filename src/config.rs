use crate::error::{Error, Result};

pub const YT_API_KEY_ENV: &str = "YT_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SUMMARY_LANGUAGE: &str = "Korean";

/// API keys injected at the process boundary.
#[derive(Clone, Default)]
pub struct Credentials {
    youtube_api_key: Option<String>,
    openai_api_key: Option<String>,
}

impl Credentials {
    pub fn new(youtube_api_key: Option<String>, openai_api_key: Option<String>) -> Self {
        Self {
            youtube_api_key: non_blank(youtube_api_key),
            openai_api_key: non_blank(openai_api_key),
        }
    }

    pub fn youtube(&self) -> Result<&str> {
        self.youtube_api_key
            .as_deref()
            .ok_or(Error::MissingCredentials(YT_API_KEY_ENV))
    }

    pub fn openai(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or(Error::MissingCredentials(OPENAI_API_KEY_ENV))
    }
}

// Keys never show up in debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("youtube_api_key", &self.youtube_api_key.as_ref().map(|_| "***"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub api_base_url: String,
    pub model: String,
    pub summary_language: String,
    /// Reject bare video ids; only full links resolve.
    pub links_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            summary_language: DEFAULT_SUMMARY_LANGUAGE.to_string(),
            links_only: false,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_count_as_missing() {
        let creds = Credentials::new(Some("   ".into()), None);
        assert!(matches!(
            creds.youtube(),
            Err(Error::MissingCredentials(YT_API_KEY_ENV))
        ));
        assert!(matches!(
            creds.openai(),
            Err(Error::MissingCredentials(OPENAI_API_KEY_ENV))
        ));
    }

    #[test]
    fn keys_are_trimmed() {
        let creds = Credentials::new(Some(" abc \n".into()), Some("sk-1".into()));
        assert_eq!(creds.youtube().unwrap(), "abc");
        assert_eq!(creds.openai().unwrap(), "sk-1");
    }

    #[test]
    fn debug_output_hides_keys() {
        let creds = Credentials::new(Some("secret".into()), None);
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***"));
    }
}
