use crate::error::{Error, Result};
use derive_more::Display;
use serde::Serialize;
use tracing::debug;
use url::Url;

const SHORT_HOST: &str = "youtu.be";
const FULL_HOST: &str = "youtube.com";
const FULL_HOSTS: [&str; 2] = ["youtube.com", "www.youtube.com"];
const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

/// A resolved YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(transparent)]
pub struct VideoReference(String);

impl VideoReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum UnresolvedReason {
    #[display("no video identifier in input")]
    Empty,
    #[display("could not parse URL: {_0}")]
    Parse(url::ParseError),
    #[display("unrecognized host '{_0}'")]
    UnknownHost(String),
    #[display("watch link without a 'v' parameter")]
    MissingWatchParam,
    #[display("unsupported path '{_0}'")]
    UnsupportedPath(String),
}

/// The locator could not be turned into a [`VideoReference`].
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("Not a valid YouTube link '{locator}' ({reason})")]
pub struct Unresolved {
    locator: String,
    reason: UnresolvedReason,
}

impl std::error::Error for Unresolved {}

/// Turns user input (a link or a bare id) into a [`VideoReference`].
///
/// Resolution never panics: every input yields either a reference or an
/// [`Unresolved`] carrying the reason it was rejected.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    allow_bare_id: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            allow_bare_id: true,
        }
    }
}

impl Resolver {
    /// Only full links are accepted; bare ids are rejected.
    pub fn links_only() -> Self {
        Self {
            allow_bare_id: false,
        }
    }

    pub fn resolve(&self, locator: &str) -> std::result::Result<VideoReference, Unresolved> {
        let trimmed = locator.trim();
        self.resolve_trimmed(trimmed).map_err(|reason| {
            debug!(locator = trimmed, %reason, "Locator did not resolve");
            Unresolved {
                locator: trimmed.to_string(),
                reason,
            }
        })
    }

    fn resolve_trimmed(&self, locator: &str) -> std::result::Result<VideoReference, UnresolvedReason> {
        if locator.is_empty() {
            return Err(UnresolvedReason::Empty);
        }

        let lowered = locator.to_ascii_lowercase();
        if self.allow_bare_id && !lowered.contains(SHORT_HOST) && !lowered.contains(FULL_HOST) {
            return Ok(VideoReference::new(locator));
        }

        let url = Url::parse(locator).map_err(UnresolvedReason::Parse)?;
        let id = match url.host_str() {
            Some(SHORT_HOST) => url.path().trim_start_matches('/').to_string(),
            Some(host) if FULL_HOSTS.contains(&host) => match url.path() {
                "/watch" => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned())
                    .filter(|value| !value.is_empty())
                    .ok_or(UnresolvedReason::MissingWatchParam)?,
                path if path.starts_with("/shorts/") || path.starts_with("/live/") => {
                    path.split('/').nth(2).unwrap_or_default().to_string()
                }
                path => return Err(UnresolvedReason::UnsupportedPath(path.to_string())),
            },
            host => {
                return Err(UnresolvedReason::UnknownHost(
                    host.unwrap_or_default().to_string(),
                ));
            }
        };

        if id.is_empty() {
            Err(UnresolvedReason::Empty)
        } else {
            Ok(VideoReference::new(id))
        }
    }
}

/// Maximum resolution thumbnail for a video.
pub fn thumbnail_url(video: &VideoReference) -> String {
    format!("{THUMBNAIL_BASE}/{video}/maxresdefault.jpg")
}

const MAX_VIDEO_ID_LEN: usize = 128;

/// Ensure a video identifier is safe for use in file names.
/// Only ASCII alphanumeric characters plus `_` and `-` are allowed.
pub fn sanitize_video_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(Error::custom("Video ID cannot be empty"));
    }

    if trimmed.len() > MAX_VIDEO_ID_LEN {
        return Err(Error::custom("Video ID is unexpectedly long"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(Error::custom(
            "Video ID contains unsupported characters; expected only letters, numbers, '-' or '_'",
        ));
    }

    Ok(trimmed.to_string())
}
