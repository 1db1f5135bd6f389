use crate::config::{
    Config, Credentials, DEFAULT_API_BASE_URL, DEFAULT_MODEL, DEFAULT_SUMMARY_LANGUAGE,
    OPENAI_API_KEY_ENV, YT_API_KEY_ENV,
};
use crate::core::{
    CommentOrder, DEFAULT_BEST_TOP, DEFAULT_LANGUAGES, DEFAULT_SEARCH_PAGES, DEFAULT_WORD_PAGES,
    DEFAULT_WORD_TOP, ToolRequest, parse_languages,
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "edutube")]
#[command(about = "YouTube tools for the classroom: comments, thumbnails and video summaries")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// YouTube Data API key
    #[arg(long, global = true, env = YT_API_KEY_ENV, hide_env_values = true)]
    pub yt_api_key: Option<String>,

    /// OpenAI API key, used by `summarize`
    #[arg(long, global = true, env = OPENAI_API_KEY_ENV, hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the YouTube Data API
    #[arg(long, global = true, env = "YT_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Model used for summaries
    #[arg(long, global = true, env = "EDUTUBE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Language the summary is written in
    #[arg(long, global = true, env = "EDUTUBE_SUMMARY_LANGUAGE", default_value = DEFAULT_SUMMARY_LANGUAGE)]
    pub summary_language: String,

    /// Accept only full YouTube links, not bare video ids
    #[arg(long, global = true)]
    pub links_only: bool,
}

impl GlobalArgs {
    pub fn config(&self) -> Config {
        Config {
            credentials: Credentials::new(self.yt_api_key.clone(), self.openai_api_key.clone()),
            api_base_url: self.api_base_url.clone(),
            model: self.model.clone(),
            summary_language: self.summary_language.clone(),
            links_only: self.links_only,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the most liked comments of a video
    Best {
        /// YouTube video URL or video ID
        url: String,

        /// How many comments to show
        #[arg(short, long, default_value_t = DEFAULT_BEST_TOP, value_parser = clap::value_parser!(u32).range(1..=50))]
        top: u32,
    },

    /// Find comments that mention a keyword
    Search {
        /// YouTube video URL or video ID
        url: String,

        /// Keyword to look for (case-insensitive)
        keyword: String,

        /// Pages of 100 comments to scan
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_PAGES, value_parser = clap::value_parser!(u32).range(1..=10))]
        pages: u32,

        /// Listing order requested from YouTube
        #[arg(short, long, value_enum, default_value_t = CommentOrder::Relevance)]
        order: CommentOrder,

        /// Export the matches to comments/comments_<id>.json
        #[arg(short, long)]
        save: bool,

        /// Keep comments gathered before a failing page
        #[arg(long)]
        keep_partial: bool,
    },

    /// Count the most frequent words in the comments
    Words {
        /// YouTube video URL or video ID
        url: String,

        /// Pages of 100 comments to scan
        #[arg(short, long, default_value_t = DEFAULT_WORD_PAGES, value_parser = clap::value_parser!(u32).range(1..=10))]
        pages: u32,

        /// How many words to show
        #[arg(short, long, default_value_t = DEFAULT_WORD_TOP, value_parser = clap::value_parser!(u32).range(1..))]
        top: u32,

        /// Keep comments gathered before a failing page
        #[arg(long)]
        keep_partial: bool,
    },

    /// Print the thumbnail URL of a video
    Thumbnail {
        /// YouTube video URL or video ID
        url: String,

        /// Save the image to thumbnails/<id>_thumbnail.jpg
        #[arg(short, long)]
        download: bool,
    },

    /// Summarize a video from its transcript
    Summarize {
        /// YouTube video URL or video ID
        url: String,

        /// Preferred transcript languages (comma-separated)
        #[arg(short, long, default_value = DEFAULT_LANGUAGES)]
        languages: String,

        /// Download the transcript again even if it is saved
        #[arg(long)]
        refresh: bool,
    },

    /// List saved transcripts, summaries, comment exports and thumbnails
    List,

    /// Open TUI interface
    Tui,
}

impl Commands {
    /// The tool invocation for commands that run a tool.
    pub fn tool_request(&self) -> Option<ToolRequest> {
        let request = match self {
            Commands::Best { url, top } => ToolRequest::Best {
                link: url.clone(),
                top: *top,
            },
            Commands::Search {
                url,
                keyword,
                pages,
                order,
                save,
                keep_partial,
            } => ToolRequest::Search {
                link: url.clone(),
                keyword: keyword.clone(),
                pages: *pages,
                order: *order,
                save: *save,
                keep_partial: *keep_partial,
            },
            Commands::Words {
                url,
                pages,
                top,
                keep_partial,
            } => ToolRequest::Words {
                link: url.clone(),
                pages: *pages,
                top: *top,
                keep_partial: *keep_partial,
            },
            Commands::Thumbnail { url, download } => ToolRequest::Thumbnail {
                link: url.clone(),
                download: *download,
            },
            Commands::Summarize {
                url,
                languages,
                refresh,
            } => ToolRequest::Summarize {
                link: url.clone(),
                languages: parse_languages(languages),
                refresh: *refresh,
            },
            Commands::List | Commands::Tui => return None,
        };
        Some(request)
    }
}
