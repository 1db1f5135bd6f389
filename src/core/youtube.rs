use crate::core::comments::{CommentPage, CommentSource, PageRequest, RawComment, RetrievalError};
use crate::core::locator::{VideoReference, thumbnail_url};
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error reasons that arrive as 403 but are not about comment access.
const QUOTA_REASONS: [&str; 4] = [
    "quotaExceeded",
    "dailyLimitExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadListResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: Option<ThreadSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: Option<TopLevelComment>,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: Option<CommentSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    author_display_name: Option<String>,
    text_display: Option<String>,
    like_count: Option<Value>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Option<VideoSnippet>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    reason: Option<String>,
}

pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("edutube/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// YouTube Data API v3 client for the comment listing and video metadata endpoints.
#[derive(Clone)]
pub struct YouTubeDataApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeDataApi {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{resource}", self.base_url.trim_end_matches('/'))
    }

    /// Title of the video, or `None` when the API knows no such video.
    pub async fn video_title(
        &self,
        video: &VideoReference,
    ) -> std::result::Result<Option<String>, RetrievalError> {
        let response = self
            .client
            .get(self.endpoint("videos"))
            .query(&[
                ("part", "snippet"),
                ("id", video.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(transport_failure)?;

        let body = read_success(response).await?;
        parse_video_title(&body)
    }
}

impl YouTubeDataApi {
    /// The `commentThreads` listing call for one page.
    fn comment_threads_request(&self, request: &PageRequest<'_>) -> RequestBuilder {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("videoId", request.video.to_string()),
            ("maxResults", request.page_size.to_string()),
            ("order", request.order.as_param().to_string()),
            ("textFormat", request.text_format.as_param().to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(cursor) = request.cursor {
            query.push(("pageToken", cursor.to_string()));
        }

        self.client
            .get(self.endpoint("commentThreads"))
            .query(&query)
    }
}

impl CommentSource for YouTubeDataApi {
    async fn list_page(
        &self,
        request: &PageRequest<'_>,
    ) -> std::result::Result<CommentPage, RetrievalError> {
        debug!(
            video_id = %request.video,
            has_cursor = request.cursor.is_some(),
            "Requesting comment threads"
        );

        let response = self
            .comment_threads_request(request)
            .send()
            .await
            .map_err(transport_failure)?;

        let body = read_success(response).await?;
        parse_comment_page(&body)
    }
}

/// Downloads the maximum resolution thumbnail.
pub async fn fetch_thumbnail(client: &Client, video: &VideoReference) -> Result<Vec<u8>> {
    let response = client.get(thumbnail_url(video)).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::custom(format!(
            "Could not load the thumbnail image (HTTP {})",
            status.as_u16()
        )));
    }
    Ok(response.bytes().await?.to_vec())
}

async fn read_success(response: reqwest::Response) -> std::result::Result<String, RetrievalError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_failure)?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(classify_failure(status, &body))
    }
}

fn transport_failure(err: reqwest::Error) -> RetrievalError {
    RetrievalError::upstream(format!("network error: {err}"))
}

fn decode_failure(err: serde_json::Error) -> RetrievalError {
    RetrievalError::upstream(format!("unexpected response from YouTube: {err}"))
}

/// Maps a non-success response to the retrieval error taxonomy.
///
/// A 403 means comment access is denied for the video unless the error body
/// names a quota or rate-limit reason.
fn classify_failure(status: StatusCode, body: &str) -> RetrievalError {
    let api_error = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);

    let quota_hit = api_error.as_ref().is_some_and(|error| {
        error
            .errors
            .iter()
            .filter_map(|item| item.reason.as_deref())
            .any(|reason| QUOTA_REASONS.contains(&reason))
    });

    if status == StatusCode::FORBIDDEN && !quota_hit {
        return RetrievalError::CommentsDisabled;
    }

    let message = api_error
        .and_then(|error| error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    RetrievalError::upstream(format!("HTTP {}: {message}", status.as_u16()))
}

fn parse_comment_page(body: &str) -> std::result::Result<CommentPage, RetrievalError> {
    let listing: CommentThreadListResponse = serde_json::from_str(body).map_err(decode_failure)?;

    let items = listing
        .items
        .into_iter()
        .map(|thread| {
            thread
                .snippet
                .and_then(|s| s.top_level_comment)
                .and_then(|c| c.snippet)
                .map(|snippet| RawComment {
                    author: snippet.author_display_name,
                    text: snippet.text_display,
                    popularity: snippet.like_count.as_ref().and_then(coerce_count),
                    published_at: snippet.published_at,
                })
                .unwrap_or_default()
        })
        .collect();

    Ok(CommentPage {
        items,
        next_cursor: listing.next_page_token,
    })
}

fn parse_video_title(body: &str) -> std::result::Result<Option<String>, RetrievalError> {
    let listing: VideoListResponse = serde_json::from_str(body).map_err(decode_failure)?;
    Ok(listing
        .items
        .into_iter()
        .next()
        .and_then(|video| video.snippet)
        .and_then(|snippet| snippet.title))
}

/// Best-effort conversion of a like count; negatives clamp to zero.
fn coerce_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|_| 0))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.max(0.0) as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<i64>().ok().map(|_| 0))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comments::{CommentOrder, CommentRetriever, RetrievalOptions, TextFormat};
    use axum::{Json, Router, extract::Query, response::IntoResponse, routing::get};
    use serde_json::json;
    use std::collections::HashMap;

    const CLOSED_VIDEO: &str = "closed00000";

    const LISTING: &str = r#"{
        "kind": "youtube#commentThreadListResponse",
        "nextPageToken": "QURTSl9p",
        "pageInfo": { "totalResults": 2, "resultsPerPage": 100 },
        "items": [
            {
                "kind": "youtube#commentThread",
                "snippet": {
                    "videoId": "abc12345678",
                    "topLevelComment": {
                        "snippet": {
                            "authorDisplayName": "@mathclass",
                            "textDisplay": "Great explanation",
                            "likeCount": 42,
                            "publishedAt": "2024-05-01T09:30:00Z"
                        }
                    }
                }
            },
            {
                "kind": "youtube#commentThread",
                "snippet": {
                    "topLevelComment": {
                        "snippet": { "textDisplay": "anonymous" }
                    }
                }
            }
        ]
    }"#;

    #[test]
    fn parses_comment_threads() {
        let page = parse_comment_page(LISTING).unwrap();
        assert_eq!(page.next_cursor.as_deref(), Some("QURTSl9p"));
        assert_eq!(page.items.len(), 2);

        let first = &page.items[0];
        assert_eq!(first.author.as_deref(), Some("@mathclass"));
        assert_eq!(first.text.as_deref(), Some("Great explanation"));
        assert_eq!(first.popularity, Some(42));
        assert_eq!(first.published_at.as_deref(), Some("2024-05-01T09:30:00Z"));

        let second = &page.items[1];
        assert_eq!(second.author, None);
        assert_eq!(second.popularity, None);
    }

    #[test]
    fn last_page_has_no_cursor() {
        let page = parse_comment_page(r#"{"items": []}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn thread_without_snippet_still_yields_an_item() {
        let page = parse_comment_page(r#"{"items": [{"kind": "youtube#commentThread"}]}"#).unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].text.is_none());
    }

    #[test]
    fn malformed_body_is_an_upstream_failure() {
        let err = parse_comment_page("<html>oops</html>").unwrap_err();
        assert!(matches!(err, RetrievalError::UpstreamFailure { .. }));
    }

    #[test]
    fn like_counts_are_coerced() {
        assert_eq!(coerce_count(&json!(7)), Some(7));
        assert_eq!(coerce_count(&json!(-3)), Some(0));
        assert_eq!(coerce_count(&json!(12.9)), Some(12));
        assert_eq!(coerce_count(&json!(" 15 ")), Some(15));
        assert_eq!(coerce_count(&json!("-1")), Some(0));
        assert_eq!(coerce_count(&json!("many")), None);
        assert_eq!(coerce_count(&json!(null)), None);
    }

    #[test]
    fn forbidden_means_comments_disabled() {
        let body = json!({
            "error": {
                "code": 403,
                "message": "The video identified by the videoId parameter has disabled comments.",
                "errors": [{ "reason": "commentsDisabled", "domain": "youtube.commentThread" }]
            }
        })
        .to_string();
        assert_eq!(
            classify_failure(StatusCode::FORBIDDEN, &body),
            RetrievalError::CommentsDisabled
        );
        assert_eq!(
            classify_failure(StatusCode::FORBIDDEN, ""),
            RetrievalError::CommentsDisabled
        );
    }

    #[test]
    fn quota_errors_are_upstream_failures() {
        let body = json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{ "reason": "quotaExceeded" }]
            }
        })
        .to_string();
        let err = classify_failure(StatusCode::FORBIDDEN, &body);
        assert_eq!(
            err,
            RetrievalError::upstream(
                "HTTP 403: The request cannot be completed because you have exceeded your quota."
            )
        );
    }

    #[test]
    fn other_statuses_carry_details() {
        let body = json!({
            "error": { "code": 404, "message": "Video not found", "errors": [{ "reason": "videoNotFound" }] }
        })
        .to_string();
        assert_eq!(
            classify_failure(StatusCode::NOT_FOUND, &body),
            RetrievalError::upstream("HTTP 404: Video not found")
        );
        assert_eq!(
            classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "gateway exploded"),
            RetrievalError::upstream("HTTP 500: Internal Server Error")
        );
    }

    #[test]
    fn video_title_lookup() {
        let body = r#"{"items": [{"id": "abc", "snippet": {"title": "Photosynthesis in 5 minutes"}}]}"#;
        assert_eq!(
            parse_video_title(body).unwrap().as_deref(),
            Some("Photosynthesis in 5 minutes")
        );
        assert_eq!(parse_video_title(r#"{"items": []}"#).unwrap(), None);
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = Client::new();
        let api = YouTubeDataApi::new(client.clone(), "http://localhost:8080/youtube/v3/", "key");
        assert_eq!(
            api.endpoint("commentThreads"),
            "http://localhost:8080/youtube/v3/commentThreads"
        );
        let api = YouTubeDataApi::new(client, "https://www.googleapis.com/youtube/v3", "key");
        assert_eq!(api.endpoint("videos"), "https://www.googleapis.com/youtube/v3/videos");
    }

    fn query_of(api: &YouTubeDataApi, request: &PageRequest<'_>) -> HashMap<String, String> {
        api.comment_threads_request(request)
            .build()
            .unwrap()
            .url()
            .query_pairs()
            .into_owned()
            .collect()
    }

    #[test]
    fn listing_request_carries_page_parameters() {
        let api = YouTubeDataApi::new(Client::new(), "https://www.googleapis.com/youtube/v3", "key-1");
        let video = VideoReference::new("abc12345678");
        let mut request = PageRequest {
            video: &video,
            page_size: 50,
            order: CommentOrder::Time,
            text_format: TextFormat::Html,
            cursor: None,
        };

        let first = query_of(&api, &request);
        assert_eq!(first["part"], "snippet");
        assert_eq!(first["videoId"], "abc12345678");
        assert_eq!(first["maxResults"], "50");
        assert_eq!(first["order"], "time");
        assert_eq!(first["textFormat"], "html");
        assert_eq!(first["key"], "key-1");
        assert!(!first.contains_key("pageToken"));

        request.cursor = Some("QURTSl9p");
        let second = query_of(&api, &request);
        assert_eq!(second["pageToken"], "QURTSl9p");
    }

    fn thread(text: &str, likes: u64) -> Value {
        json!({
            "kind": "youtube#commentThread",
            "snippet": {
                "topLevelComment": {
                    "snippet": {
                        "authorDisplayName": "@student",
                        "textDisplay": text,
                        "likeCount": likes,
                        "publishedAt": "2024-05-01T09:30:00Z"
                    }
                }
            }
        })
    }

    async fn comment_threads(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        if params.get("videoId").map(String::as_str) == Some(CLOSED_VIDEO) {
            let body = json!({
                "error": {
                    "code": 403,
                    "message": "The video identified by the videoId parameter has disabled comments.",
                    "errors": [{ "reason": "commentsDisabled" }]
                }
            });
            return (axum::http::StatusCode::FORBIDDEN, Json(body));
        }

        let body = match params.get("pageToken").map(String::as_str) {
            None => json!({ "nextPageToken": "page-2", "items": [thread("first page", 5)] }),
            Some("page-2") => json!({ "items": [thread("second page", 9)] }),
            Some(other) => {
                let body = json!({ "error": { "code": 400, "message": format!("bad pageToken {other}") } });
                return (axum::http::StatusCode::BAD_REQUEST, Json(body));
            }
        };
        (axum::http::StatusCode::OK, Json(body))
    }

    async fn local_api() -> YouTubeDataApi {
        let router = Router::new().route("/youtube/v3/commentThreads", get(comment_threads));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = Client::builder().no_proxy().build().unwrap();
        YouTubeDataApi::new(client, format!("http://{addr}/youtube/v3"), "test-key")
    }

    #[tokio::test]
    async fn retriever_follows_page_tokens_over_http() {
        let retriever = CommentRetriever::new(local_api().await);

        let batch = retriever
            .fetch_comments(&VideoReference::new("abc12345678"), &RetrievalOptions::pages(5))
            .await
            .unwrap();

        let texts: Vec<&str> = batch.records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first page", "second page"]);
        assert_eq!(batch.pages_fetched, 2);
        assert_eq!(batch.records[1].popularity, 9);
    }

    #[tokio::test]
    async fn forbidden_listing_means_comments_disabled() {
        let retriever = CommentRetriever::new(local_api().await);

        let err = retriever
            .fetch_comments(&VideoReference::new(CLOSED_VIDEO), &RetrievalOptions::pages(3))
            .await
            .unwrap_err();

        assert_eq!(err, RetrievalError::CommentsDisabled);
    }
}
