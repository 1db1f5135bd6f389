use crate::core::{RetrievalError, Unresolved};
use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("{_0}")]
    #[from(String, &String, &str)]
    Custom(String),

    #[display("{_0}")]
    #[from]
    Unresolved(Unresolved),

    #[display("{_0}")]
    #[from]
    Retrieval(RetrievalError),

    /// A credential required by the requested tool was not configured.
    #[display("{_0} is not set. Pass it as a flag or set the environment variable.")]
    MissingCredentials(&'static str),

    // -- Externals
    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),

    #[display("HTTP error: {_0}")]
    #[from]
    Http(reqwest::Error),

    #[display("JSON error: {_0}")]
    #[from]
    Json(serde_json::Error),

    #[display("OpenAI error: {_0}")]
    #[from]
    OpenAi(async_openai::error::OpenAIError),
}

impl Error {
    pub fn custom(value: impl std::fmt::Display) -> Self {
        Self::Custom(value.to_string())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::core::RetrievalError;

    #[test]
    fn retrieval_errors_keep_their_message() {
        let err: Error = RetrievalError::CommentsDisabled.into();
        assert_eq!(err.to_string(), "Comments are disabled for this video");
    }

    #[test]
    fn missing_credentials_names_the_setting() {
        let err = Error::MissingCredentials("YT_API_KEY");
        assert!(err.to_string().starts_with("YT_API_KEY is not set"));
    }

    #[test]
    fn custom_from_str() {
        let err: Error = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
