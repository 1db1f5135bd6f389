use crate::core::locator::VideoReference;
use derive_more::Display;
use serde::Serialize;
use std::future::Future;
use tracing::{debug, info, warn};

/// Upper bound the listing endpoint accepts for `maxResults`.
pub const MAX_PAGE_SIZE: u32 = 100;
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CommentOrder {
    #[default]
    Relevance,
    Time,
}

impl CommentOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            CommentOrder::Relevance => "relevance",
            CommentOrder::Time => "time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    PlainText,
    Html,
}

impl TextFormat {
    pub fn as_param(&self) -> &'static str {
        match self {
            TextFormat::PlainText => "plainText",
            TextFormat::Html => "html",
        }
    }
}

/// A comment as delivered by a [`CommentSource`], before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct RawComment {
    pub author: Option<String>,
    pub text: Option<String>,
    pub popularity: Option<u64>,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub author: String,
    pub text: String,
    pub popularity: u64,
    pub published_at: String,
}

impl From<RawComment> for CommentRecord {
    fn from(raw: RawComment) -> Self {
        Self {
            author: raw.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            text: raw.text.unwrap_or_default(),
            popularity: raw.popularity.unwrap_or(0),
            published_at: raw.published_at.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub video: &'a VideoReference,
    pub page_size: u32,
    pub order: CommentOrder,
    pub text_format: TextFormat,
    /// `None` on the first request.
    pub cursor: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    pub items: Vec<RawComment>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum RetrievalError {
    #[display("Comments are disabled for this video")]
    CommentsDisabled,
    #[display("YouTube request failed: {details}")]
    UpstreamFailure { details: String },
}

impl RetrievalError {
    pub fn upstream(details: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            details: details.into(),
        }
    }
}

impl std::error::Error for RetrievalError {}

/// One page of a paginated comment listing.
pub trait CommentSource {
    fn list_page(
        &self,
        request: &PageRequest<'_>,
    ) -> impl Future<Output = Result<CommentPage, RetrievalError>> + Send;
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub page_ceiling: u32,
    pub page_size: u32,
    pub order: CommentOrder,
    pub text_format: TextFormat,
    /// Keep what was gathered when a later page fails instead of failing the call.
    pub return_partial_on_failure: bool,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            page_ceiling: 1,
            page_size: MAX_PAGE_SIZE,
            order: CommentOrder::Relevance,
            text_format: TextFormat::PlainText,
            return_partial_on_failure: false,
        }
    }
}

impl RetrievalOptions {
    pub fn pages(page_ceiling: u32) -> Self {
        Self {
            page_ceiling,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn ordered_by(mut self, order: CommentOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_text_format(mut self, text_format: TextFormat) -> Self {
        self.text_format = text_format;
        self
    }

    pub fn keep_partial(mut self, keep: bool) -> Self {
        self.return_partial_on_failure = keep;
        self
    }

    fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    fn effective_ceiling(&self) -> u32 {
        self.page_ceiling.max(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommentBatch {
    /// Records in the order the upstream listed them.
    pub records: Vec<CommentRecord>,
    pub pages_fetched: u32,
    /// Set when a later page failed and partial results were requested.
    pub interrupted: Option<RetrievalError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub page: u32,
    pub received: usize,
    pub total: usize,
}

pub struct CommentRetriever<S> {
    source: S,
}

impl<S: CommentSource + Sync> CommentRetriever<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn fetch_comments(
        &self,
        video: &VideoReference,
        options: &RetrievalOptions,
    ) -> Result<CommentBatch, RetrievalError> {
        self.fetch_comments_with_progress(video, options, |_| {})
            .await
    }

    /// Pages through the listing, calling `on_page` after every successful page.
    ///
    /// Never issues more than `options.page_ceiling` requests, whatever the
    /// upstream returns as continuation cursors.
    pub async fn fetch_comments_with_progress<F>(
        &self,
        video: &VideoReference,
        options: &RetrievalOptions,
        mut on_page: F,
    ) -> Result<CommentBatch, RetrievalError>
    where
        F: FnMut(PageProgress) + Send,
    {
        let ceiling = options.effective_ceiling();
        let page_size = options.effective_page_size();

        let mut records: Vec<CommentRecord> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages_fetched = 0;

        while pages_fetched < ceiling {
            let request = PageRequest {
                video,
                page_size,
                order: options.order,
                text_format: options.text_format,
                cursor: cursor.as_deref(),
            };

            let page = match self.source.list_page(&request).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(
                        video_id = %video,
                        page = pages_fetched + 1,
                        collected = records.len(),
                        error = %err,
                        "Comment page request failed"
                    );
                    if options.return_partial_on_failure && pages_fetched > 0 {
                        return Ok(CommentBatch {
                            records,
                            pages_fetched,
                            interrupted: Some(err),
                        });
                    }
                    return Err(err);
                }
            };

            pages_fetched += 1;
            let before = records.len();
            records.extend(
                page.items
                    .into_iter()
                    .take(page_size as usize)
                    .map(CommentRecord::from),
            );
            let received = records.len() - before;

            debug!(
                video_id = %video,
                page = pages_fetched,
                received,
                total = records.len(),
                "Fetched comment page"
            );
            on_page(PageProgress {
                page: pages_fetched,
                received,
                total: records.len(),
            });

            cursor = page.next_cursor.filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        info!(
            video_id = %video,
            pages = pages_fetched,
            comments = records.len(),
            "Comment retrieval completed"
        );

        Ok(CommentBatch {
            records,
            pages_fetched,
            interrupted: None,
        })
    }
}
