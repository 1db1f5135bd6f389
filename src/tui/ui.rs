use crate::tui::app::{App, AppState, FileFilter};
use crate::tui::components::Tool;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

pub fn draw(f: &mut Frame, app: &mut App) {
    match &app.state {
        AppState::Home => draw_home(f, app),
        AppState::Form => draw_form(f, app),
        AppState::Processing { job } => draw_processing(f, app, job),
        AppState::Browser => draw_browser(f, app),
        AppState::Viewer { .. } => draw_viewer(f, app),
    }
}

fn title_bar(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn help_bar(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn screen(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Body
            Constraint::Length(3), // Help
        ])
        .split(area)
}

fn radio_item(label: String, detail: Option<&str>, selected: bool) -> ListItem<'_> {
    let style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let marker = if selected { "●" } else { "○" };

    let mut spans = vec![Span::styled(format!("{marker} {label}"), style)];
    if let Some(detail) = detail {
        spans.push(Span::styled(
            format!("  {detail}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn draw_home(f: &mut Frame, app: &App) {
    let chunks = screen(f.area());

    f.render_widget(title_bar("edutube"), chunks[0]);

    let mut menu_items: Vec<ListItem> = Tool::ALL
        .iter()
        .enumerate()
        .map(|(i, tool)| {
            radio_item(
                format!("{} {}", i + 1, tool.label()),
                Some(tool.description()),
                i == app.selected_option,
            )
        })
        .collect();
    menu_items.push(radio_item(
        format!("{} Saved Files", Tool::ALL.len() + 1),
        Some("Transcripts, summaries, comment exports and thumbnails"),
        app.selected_option == Tool::ALL.len(),
    ));

    let menu = List::new(menu_items)
        .block(Block::default().borders(Borders::ALL).title("Tools"))
        .style(Style::default().fg(Color::White));
    f.render_widget(menu, chunks[1]);

    f.render_widget(
        help_bar("[↑↓] Navigate  [1-6] Jump  [Enter] Select  [q] Exit"),
        chunks[2],
    );
}

fn draw_form(f: &mut Frame, app: &App) {
    let chunks = screen(f.area());

    f.render_widget(title_bar(app.form.tool.label()), chunks[0]);
    app.form.render(f, chunks[1]);
    f.render_widget(
        help_bar("[Enter] Next / Run  [Tab] Next  [Space] Toggle  [Esc] Back"),
        chunks[2],
    );
}

fn draw_processing(f: &mut Frame, app: &App, job: &str) {
    let chunks = screen(f.area());

    f.render_widget(title_bar("Working..."), chunks[0]);
    app.progress_bar.render(f, chunks[1], job);
    f.render_widget(help_bar("[Ctrl+C] Quit"), chunks[2]);
}

fn draw_browser(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(1)])
        .split(f.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FileFilter::ALL.len() as u16 + 2), // Filters
            Constraint::Length(3),                                // Search
        ])
        .split(chunks[0]);

    let filter_items: Vec<ListItem> = FileFilter::ALL
        .iter()
        .map(|filter| radio_item(filter.label().to_string(), None, *filter == app.filter))
        .collect();

    let filters =
        List::new(filter_items).block(Block::default().borders(Borders::ALL).title("Filters"));
    f.render_widget(filters, left_chunks[0]);

    app.search_input.render(f, left_chunks[1]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(chunks[1]);

    app.file_list.render(f, right_chunks[0], "Files");

    let footer = match &app.browser_error {
        Some(error) => help_bar(error).style(Style::default().fg(Color::Red)),
        None => help_bar("[Enter] Open  [Del] Delete  [Space] Select  [/] Search  [1-5] Filters"),
    };
    f.render_widget(footer, right_chunks[1]);
}

fn draw_viewer(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(f.area());

    if let Some(viewer) = &app.content_viewer {
        app.viewer_height = chunks[0].height;
        viewer.render(f, chunks[0]);
    }

    f.render_widget(
        help_bar("[↑↓] Scroll  [PgUp/PgDn] Page  [Home/End] Top/Bottom  [Esc] Back"),
        chunks[1],
    );
}
