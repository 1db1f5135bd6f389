use crate::core::{FileEntry, FileType, ToolEvent, ToolOutput, Toolkit};
use crate::error::Result;
use crate::tui::components::{ContentViewer, FileList, InputField, ProgressBar, Tool, ToolForm};
use crate::tui::events::AppEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Home menu: every tool, then the saved file browser.
pub const MENU_LEN: usize = Tool::ALL.len() + 1;

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Home,
    Form,
    Processing { job: String },
    Browser,
    Viewer { from_browser: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    All,
    Only(FileType),
}

impl FileFilter {
    pub const ALL: [FileFilter; 5] = [
        FileFilter::All,
        FileFilter::Only(FileType::Transcript),
        FileFilter::Only(FileType::Summary),
        FileFilter::Only(FileType::Comments),
        FileFilter::Only(FileType::Thumbnail),
    ];

    pub fn label(self) -> &'static str {
        match self {
            FileFilter::All => "All",
            FileFilter::Only(file_type) => file_type.label(),
        }
    }

    fn accepts(self, file: &FileEntry) -> bool {
        match self {
            FileFilter::All => true,
            FileFilter::Only(file_type) => file.file_type == file_type,
        }
    }
}

/// Messages from the background tool task to the UI loop.
#[derive(Debug, Clone)]
pub enum TaskUpdate {
    Status(String),
    Progress(f64),
    Log(String),
    Finished { title: String, body: String },
}

pub struct App {
    pub state: AppState,
    pub should_quit: bool,

    // Home screen
    pub selected_option: usize,

    // Tool form
    pub form: ToolForm,

    // Browser screen
    pub file_list: FileList,
    pub search_input: InputField,
    pub filter: FileFilter,
    /// Last failed browser action, shown until the next key press.
    pub browser_error: Option<String>,

    // Viewer screen
    pub content_viewer: Option<ContentViewer>,
    pub viewer_height: u16,

    // Processing screen
    pub progress_bar: ProgressBar,

    toolkit: Toolkit,
    task: Option<JoinHandle<()>>,
    task_tx: mpsc::UnboundedSender<TaskUpdate>,
    task_rx: mpsc::UnboundedReceiver<TaskUpdate>,
}

impl App {
    pub fn new(toolkit: Toolkit) -> Self {
        let files = toolkit.storage().list_files().unwrap_or_default();
        let (task_tx, task_rx) = mpsc::unbounded_channel();

        Self {
            state: AppState::Home,
            should_quit: false,

            selected_option: 0,

            form: ToolForm::new(Tool::Best),

            file_list: FileList::new(files),
            search_input: InputField::new("Search", "Filter files..."),
            filter: FileFilter::All,
            browser_error: None,

            content_viewer: None,
            viewer_height: 0,
            progress_bar: ProgressBar::new(),

            toolkit,
            task: None,
            task_tx,
            task_rx,
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Key(key) => self.handle_key(key)?,
            AppEvent::Mouse(mouse) => self.handle_mouse(mouse),
            AppEvent::Tick => self.handle_tick(),
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return Ok(());
        }

        match &self.state {
            AppState::Home => self.handle_home_key(key),
            AppState::Form => self.handle_form_key(key),
            AppState::Browser => self.handle_browser_key(key),
            AppState::Viewer { .. } => self.handle_viewer_key(key),
            // A running tool finishes or fails before control returns.
            AppState::Processing { .. } => Ok(()),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match self.state {
            AppState::Browser => {
                self.file_list.handle_mouse(mouse);
            }
            AppState::Viewer { .. } => {
                if let Some(viewer) = &mut self.content_viewer {
                    viewer.handle_mouse(mouse, self.viewer_height as usize);
                }
            }
            _ => {}
        }
    }

    fn quit(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.should_quit = true;
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Up => {
                self.selected_option = self.selected_option.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_option + 1 < MENU_LEN {
                    self.selected_option += 1;
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if index < MENU_LEN {
                    self.selected_option = index;
                }
            }
            KeyCode::Enter => match Tool::ALL.get(self.selected_option) {
                Some(tool) => {
                    self.form = ToolForm::new(*tool);
                    self.state = AppState::Form;
                }
                None => {
                    self.filter = FileFilter::All;
                    self.search_input.clear();
                    self.search_input.focused = false;
                    self.browser_error = None;
                    self.apply_filter();
                    self.state = AppState::Browser;
                }
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Home;
            }
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_previous(),
            KeyCode::Enter => {
                if self.form.is_last_field() {
                    self.start_processing();
                } else {
                    self.form.focus_next();
                }
            }
            _ => {
                self.form.handle_key(key);
            }
        }
        Ok(())
    }

    fn handle_browser_key(&mut self, key: KeyEvent) -> Result<()> {
        self.browser_error = None;

        if self.search_input.focused {
            match key.code {
                KeyCode::Esc => {
                    self.search_input.focused = false;
                    self.search_input.clear();
                    self.apply_filter();
                }
                KeyCode::Enter => {
                    self.search_input.focused = false;
                }
                _ => {
                    self.search_input.handle_key(key);
                    self.apply_filter();
                }
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => {
                self.state = AppState::Home;
            }
            KeyCode::Char('q') => self.quit(),
            KeyCode::Enter => {
                if let Some(file) = self.file_list.selected() {
                    self.open_file(file.clone());
                }
            }
            KeyCode::Delete | KeyCode::Char('d') => {
                self.delete_target_files();
            }
            KeyCode::Char('/') => {
                self.search_input.focused = true;
            }
            KeyCode::Char(c @ '1'..='5') => {
                self.filter = FileFilter::ALL[c as usize - '1' as usize];
                self.apply_filter();
            }
            _ => {
                self.file_list.handle_key(key);
            }
        }
        Ok(())
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                let from_browser = matches!(self.state, AppState::Viewer { from_browser: true });
                self.content_viewer = None;
                if from_browser {
                    self.apply_filter();
                    self.state = AppState::Browser;
                } else {
                    self.state = AppState::Form;
                }
            }
            _ => {
                if let Some(viewer) = &mut self.content_viewer {
                    viewer.handle_key(key, self.viewer_height as usize);
                }
            }
        }
        Ok(())
    }

    fn handle_tick(&mut self) {
        while let Ok(update) = self.task_rx.try_recv() {
            self.apply_update(update);
        }
    }

    pub fn apply_update(&mut self, update: TaskUpdate) {
        match update {
            TaskUpdate::Status(status) => self.progress_bar.set_message(status),
            TaskUpdate::Progress(progress) => self.progress_bar.set_progress(progress),
            TaskUpdate::Log(log) => self.progress_bar.add_log(log),
            TaskUpdate::Finished { title, body } => {
                self.task = None;
                self.progress_bar.reset();
                self.content_viewer = Some(ContentViewer::new(body, title));
                self.state = AppState::Viewer {
                    from_browser: false,
                };
            }
        }
    }

    fn start_processing(&mut self) {
        let request = match self.form.to_request() {
            Ok(request) => request,
            Err(message) => {
                self.form.error = Some(message);
                return;
            }
        };

        let job = format!("{}: {}", self.form.tool.label(), self.form.url.value.trim());
        self.state = AppState::Processing { job };
        self.progress_bar.reset();
        self.progress_bar.set_message("Starting...".to_string());

        let toolkit = self.toolkit.clone();
        let tx = self.task_tx.clone();

        self.task = Some(tokio::spawn(async move {
            let events_tx = tx.clone();
            let result = toolkit
                .run(&request, move |event| {
                    for update in updates_for(event) {
                        let _ = events_tx.send(update);
                    }
                })
                .await;

            let _ = tx.send(TaskUpdate::Progress(1.0));
            let _ = tx.send(finished(result));
        }));
    }

    fn apply_filter(&mut self) {
        let search_term = self.search_input.value.trim().to_lowercase();
        let filter = self.filter;

        let files = match self.toolkit.storage().list_files() {
            Ok(files) => files,
            Err(err) => {
                self.browser_error = Some(format!("Could not list saved files: {err}"));
                Vec::new()
            }
        };

        let files: Vec<FileEntry> = files
            .into_iter()
            .filter(|file| filter.accepts(file))
            .filter(|file| search_term.is_empty() || file.name.to_lowercase().contains(&search_term))
            .collect();

        self.file_list.update_items(files);
    }

    fn open_file(&mut self, file: FileEntry) {
        let content = if file.file_type.is_text() {
            match std::fs::read_to_string(&file.path) {
                Ok(content) => content,
                Err(err) => {
                    // The file may have been removed behind our back.
                    self.apply_filter();
                    self.browser_error = Some(format!("Could not open {}: {err}", file.name));
                    return;
                }
            }
        } else {
            format!(
                "Image file, {} bytes.\n\nSaved at {}",
                file.size,
                file.path.display()
            )
        };

        self.content_viewer = Some(ContentViewer::new(content, file.name));
        self.state = AppState::Viewer { from_browser: true };
    }

    fn delete_target_files(&mut self) {
        let targets: Vec<FileEntry> = self.file_list.targets().into_iter().cloned().collect();
        let mut failures = Vec::new();
        for file in targets {
            if let Err(err) = self.toolkit.storage().delete_file(&file.path) {
                failures.push(format!("{}: {err}", file.name));
            }
        }

        self.apply_filter();
        if !failures.is_empty() {
            self.browser_error = Some(format!("Could not delete {}", failures.join(", ")));
        }
    }
}

fn updates_for(event: ToolEvent) -> Vec<TaskUpdate> {
    match event {
        ToolEvent::Status(status) => vec![TaskUpdate::Log(status.clone()), TaskUpdate::Status(status)],
        ToolEvent::Page { progress, ceiling } => vec![
            TaskUpdate::Progress(progress.page as f64 / ceiling.max(1) as f64),
            TaskUpdate::Log(format!(
                "Page {}: {} comments ({} total)",
                progress.page, progress.received, progress.total
            )),
        ],
    }
}

fn finished(result: Result<ToolOutput>) -> TaskUpdate {
    match result {
        Ok(output) => TaskUpdate::Finished {
            title: output.title,
            body: output.body,
        },
        Err(err) => TaskUpdate::Finished {
            title: "Error".to_string(),
            body: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::{PageProgress, StorageService};
    use crossterm::event::KeyModifiers;

    fn app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let toolkit = Toolkit::new(Config::default(), StorageService::new(dir.path())).unwrap();
        (App::new(toolkit), dir)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }

    #[test]
    fn home_menu_opens_tool_forms_and_browser() {
        let (mut app, _dir) = app();

        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Form);
        assert_eq!(app.form.tool, Tool::Search);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('6'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Browser);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn form_errors_stay_on_the_form() {
        let (mut app, _dir) = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.tool, Tool::Best);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Form);
        assert!(app.form.error.is_some());
    }

    #[test]
    fn finished_task_shows_the_result() {
        let (mut app, _dir) = app();
        app.state = AppState::Processing {
            job: "Best Comments: x".to_string(),
        };

        app.apply_update(TaskUpdate::Status("Fetching".to_string()));
        assert_eq!(app.progress_bar.message, "Fetching");

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.state, AppState::Processing { .. }));

        app.apply_update(TaskUpdate::Finished {
            title: "Top 3 comments".to_string(),
            body: "#1 someone".to_string(),
        });
        assert_eq!(app.state, AppState::Viewer { from_browser: false });
        assert_eq!(
            app.content_viewer.as_ref().map(|v| v.title.as_str()),
            Some("Top 3 comments")
        );

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Form);
    }

    #[test]
    fn page_events_become_progress_and_log() {
        let updates = updates_for(ToolEvent::Page {
            progress: PageProgress {
                page: 1,
                received: 100,
                total: 100,
            },
            ceiling: 4,
        });
        assert!(matches!(updates[0], TaskUpdate::Progress(p) if (p - 0.25).abs() < f64::EPSILON));
        assert!(matches!(&updates[1], TaskUpdate::Log(log) if log == "Page 1: 100 comments (100 total)"));
    }

    #[test]
    fn errors_are_shown_as_results() {
        let update = finished(Err(crate::error::Error::custom("boom")));
        assert!(matches!(
            update,
            TaskUpdate::Finished { title, body } if title == "Error" && body == "boom"
        ));
    }

    #[tokio::test]
    async fn browser_filters_and_deletes_saved_files() {
        let (mut app, _dir) = app();
        let video = crate::core::VideoReference::new("abc12345678");
        let storage = app.toolkit.storage().clone();
        storage.save_summary(&video, "# Summary").await.unwrap();
        storage.save_transcript(&video, &["line".to_string()]).await.unwrap();

        app.selected_option = Tool::ALL.len();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.file_list.items.len(), 2);

        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.file_list.items.len(), 1);
        assert_eq!(app.file_list.items[0].file_type, FileType::Summary);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Viewer { from_browser: true });
        assert_eq!(
            app.content_viewer.as_ref().map(|v| v.content.as_str()),
            Some("# Summary")
        );
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Browser);

        press(&mut app, KeyCode::Delete);
        assert!(app.file_list.items.is_empty());
        assert!(storage.transcript_exists(&video));
    }

    #[tokio::test]
    async fn opening_a_vanished_file_keeps_the_browser_open() {
        let (mut app, _dir) = app();
        let video = crate::core::VideoReference::new("abc12345678");
        let path = app
            .toolkit
            .storage()
            .save_summary(&video, "# Summary")
            .await
            .unwrap();

        app.selected_option = Tool::ALL.len();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.file_list.items.len(), 1);

        std::fs::remove_file(&path).unwrap();
        press(&mut app, KeyCode::Enter);

        assert!(!app.should_quit);
        assert_eq!(app.state, AppState::Browser);
        assert!(app.content_viewer.is_none());
        assert!(app.file_list.items.is_empty());
        let error = app.browser_error.clone().unwrap();
        assert!(error.starts_with("Could not open summary_abc12345678.md"));

        press(&mut app, KeyCode::Down);
        assert!(app.browser_error.is_none());
    }
}
