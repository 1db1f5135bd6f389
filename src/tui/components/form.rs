use crate::core::{
    CommentOrder, DEFAULT_BEST_TOP, DEFAULT_LANGUAGES, DEFAULT_SEARCH_PAGES, DEFAULT_WORD_PAGES,
    DEFAULT_WORD_TOP, ToolRequest, parse_languages,
};
use crate::tui::components::InputField;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Best,
    Search,
    Words,
    Thumbnail,
    Summarize,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Best,
        Tool::Search,
        Tool::Words,
        Tool::Thumbnail,
        Tool::Summarize,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Best => "Best Comments",
            Tool::Search => "Comment Search",
            Tool::Words => "Word Frequencies",
            Tool::Thumbnail => "Thumbnail",
            Tool::Summarize => "Video Summary",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::Best => "Most liked comments of a video",
            Tool::Search => "Comments mentioning a keyword",
            Tool::Words => "Words that come up most in the comments",
            Tool::Thumbnail => "Thumbnail link and image download",
            Tool::Summarize => "Key sentences, summary, keywords and quiz from the transcript",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Param,
    Pages,
    Toggle,
}

#[derive(Debug, Clone)]
pub struct Toggle {
    pub label: &'static str,
    pub on: bool,
}

/// Inputs for one tool. Which fields exist depends on the tool.
#[derive(Debug, Clone)]
pub struct ToolForm {
    pub tool: Tool,
    pub url: InputField,
    pub param: Option<InputField>,
    pub pages: Option<InputField>,
    pub toggle: Option<Toggle>,
    pub focus: usize,
    pub error: Option<String>,
}

impl ToolForm {
    pub fn new(tool: Tool) -> Self {
        let (param, pages, toggle) = match tool {
            Tool::Best => (
                Some(
                    InputField::new("Number of comments (1-50)", "3")
                        .with_value(&DEFAULT_BEST_TOP.to_string()),
                ),
                None,
                None,
            ),
            Tool::Search => (
                Some(InputField::new("Keyword", "e.g. fractions")),
                Some(pages_input(DEFAULT_SEARCH_PAGES)),
                Some(Toggle {
                    label: "Save matches to comments/",
                    on: false,
                }),
            ),
            Tool::Words => (
                Some(
                    InputField::new("Words to show", "30")
                        .with_value(&DEFAULT_WORD_TOP.to_string()),
                ),
                Some(pages_input(DEFAULT_WORD_PAGES)),
                Some(Toggle {
                    label: "Keep comments if a later page fails",
                    on: false,
                }),
            ),
            Tool::Thumbnail => (
                None,
                None,
                Some(Toggle {
                    label: "Download the image to thumbnails/",
                    on: true,
                }),
            ),
            Tool::Summarize => (
                Some(
                    InputField::new("Transcript languages", "ko,en").with_value(DEFAULT_LANGUAGES),
                ),
                None,
                Some(Toggle {
                    label: "Download the transcript again",
                    on: false,
                }),
            ),
        };

        let mut form = Self {
            tool,
            url: InputField::new("Video URL", "https://youtu.be/..."),
            param,
            pages,
            toggle,
            focus: 0,
            error: None,
        };
        form.sync_focus();
        form
    }

    pub fn fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::Url];
        if self.param.is_some() {
            fields.push(Field::Param);
        }
        if self.pages.is_some() {
            fields.push(Field::Pages);
        }
        if self.toggle.is_some() {
            fields.push(Field::Toggle);
        }
        fields
    }

    pub fn focused(&self) -> Field {
        self.fields()
            .get(self.focus)
            .copied()
            .unwrap_or(Field::Url)
    }

    pub fn is_last_field(&self) -> bool {
        self.focus + 1 >= self.fields().len()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
        self.sync_focus();
    }

    pub fn focus_previous(&mut self) {
        let count = self.fields().len();
        self.focus = (self.focus + count - 1) % count;
        self.sync_focus();
    }

    fn sync_focus(&mut self) {
        let focused = self.focused();
        self.url.focused = focused == Field::Url;
        if let Some(param) = &mut self.param {
            param.focused = focused == Field::Param;
        }
        if let Some(pages) = &mut self.pages {
            pages.focused = focused == Field::Pages;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        self.error = None;
        match self.focused() {
            Field::Url => self.url.handle_key(key),
            Field::Param => self
                .param
                .as_mut()
                .is_some_and(|input| input.handle_key(key)),
            Field::Pages => self
                .pages
                .as_mut()
                .is_some_and(|input| input.handle_key(key)),
            Field::Toggle => match (key.code, self.toggle.as_mut()) {
                (KeyCode::Char(' '), Some(toggle)) => {
                    toggle.on = !toggle.on;
                    true
                }
                _ => false,
            },
        }
    }

    pub fn to_request(&self) -> Result<ToolRequest, String> {
        if !self.url.is_valid() {
            return Err("Enter a YouTube link or video ID".to_string());
        }
        let link = self.url.value.trim().to_string();
        let param = self.param.as_ref().map(|input| input.value.trim()).unwrap_or("");
        let toggle = self.toggle.as_ref().is_some_and(|toggle| toggle.on);

        let request = match self.tool {
            Tool::Best => ToolRequest::Best {
                link,
                top: parse_number(param, "Number of comments")?,
            },
            Tool::Search => ToolRequest::Search {
                link,
                keyword: param.to_string(),
                pages: self.pages_value()?,
                order: CommentOrder::Relevance,
                save: toggle,
                keep_partial: false,
            },
            Tool::Words => ToolRequest::Words {
                link,
                pages: self.pages_value()?,
                top: parse_number(param, "Words to show")?,
                keep_partial: toggle,
            },
            Tool::Thumbnail => ToolRequest::Thumbnail {
                link,
                download: toggle,
            },
            Tool::Summarize => ToolRequest::Summarize {
                link,
                languages: parse_languages(if param.is_empty() {
                    DEFAULT_LANGUAGES
                } else {
                    param
                }),
                refresh: toggle,
            },
        };

        Ok(request)
    }

    fn pages_value(&self) -> Result<u32, String> {
        let raw = self.pages.as_ref().map(|input| input.value.trim()).unwrap_or("");
        parse_number(raw, "Pages")
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let mut constraints = vec![Constraint::Length(3); self.fields().len()];
        constraints.push(Constraint::Length(1)); // Error
        constraints.push(Constraint::Min(0));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (i, field) in self.fields().into_iter().enumerate() {
            match field {
                Field::Url => self.url.render(f, chunks[i]),
                Field::Param => {
                    if let Some(input) = &self.param {
                        input.render(f, chunks[i]);
                    }
                }
                Field::Pages => {
                    if let Some(input) = &self.pages {
                        input.render(f, chunks[i]);
                    }
                }
                Field::Toggle => {
                    if let Some(toggle) = &self.toggle {
                        let checkbox = if toggle.on { "☑" } else { "☐" };
                        let style = if self.focused() == Field::Toggle {
                            Style::default().fg(Color::Yellow)
                        } else {
                            Style::default().fg(Color::White)
                        };
                        let paragraph = Paragraph::new(format!("{checkbox} {}", toggle.label))
                            .style(style)
                            .block(Block::default().borders(Borders::ALL).title("Options"));
                        f.render_widget(paragraph, chunks[i]);
                    }
                }
            }
        }

        if let Some(error) = &self.error {
            let error_line = Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red));
            f.render_widget(error_line, chunks[self.fields().len()]);
        }
    }
}

fn pages_input(default: u32) -> InputField {
    InputField::new("Pages of 100 comments (1-10)", "3").with_value(&default.to_string())
}

fn parse_number(raw: &str, name: &str) -> Result<u32, String> {
    raw.parse::<u32>()
        .map_err(|_| format!("{name} must be a whole number"))
}
