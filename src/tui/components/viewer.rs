use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

const MOUSE_SCROLL_LINES: usize = 3;

pub struct ContentViewer {
    pub content: String,
    pub scroll: usize,
    pub title: String,
}

impl ContentViewer {
    pub fn new(content: String, title: String) -> Self {
        Self {
            content,
            scroll: 0,
            title,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, area_height: usize) -> bool {
        let page_size = area_height.saturating_sub(2).max(1);
        match key.code {
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                true
            }
            KeyCode::Down => {
                self.scroll_down(1, page_size);
                true
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(page_size);
                true
            }
            KeyCode::PageDown => {
                self.scroll_down(page_size, page_size);
                true
            }
            KeyCode::Home => {
                self.scroll = 0;
                true
            }
            KeyCode::End => {
                self.scroll = self.max_scroll(page_size);
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, area_height: usize) -> bool {
        let page_size = area_height.saturating_sub(2).max(1);
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(MOUSE_SCROLL_LINES);
                true
            }
            MouseEventKind::ScrollDown => {
                self.scroll_down(MOUSE_SCROLL_LINES, page_size);
                true
            }
            _ => false,
        }
    }

    fn scroll_down(&mut self, lines: usize, page_size: usize) {
        self.scroll = (self.scroll + lines).min(self.max_scroll(page_size));
    }

    fn max_scroll(&self, page_size: usize) -> usize {
        self.content.lines().count().saturating_sub(page_size)
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .content
            .lines()
            .skip(self.scroll)
            .take(area.height.saturating_sub(2) as usize)
            .map(styled_line)
            .collect();

        let total_lines = self.content.lines().count();
        let visible_lines = area.height.saturating_sub(2) as usize;
        let scroll_info = if total_lines > visible_lines {
            format!(
                " (lines {}-{} of {})",
                self.scroll + 1,
                (self.scroll + visible_lines).min(total_lines),
                total_lines
            )
        } else {
            String::new()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{}{scroll_info}", self.title));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }
}

fn styled_line(line: &str) -> Line<'_> {
    if line.starts_with("# ") || line.starts_with("## ") {
        Line::from(Span::styled(
            line,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else if line.starts_with('#') {
        // Comment headers: "#3 author · 👍 12 · date"
        Line::from(Span::styled(line, Style::default().fg(Color::Cyan)))
    } else if line.starts_with('-') || line.starts_with('*') {
        Line::from(Span::styled(line, Style::default().fg(Color::Green)))
    } else {
        Line::from(Span::raw(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn viewer(lines: usize) -> ContentViewer {
        let content = (0..lines)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        ContentViewer::new(content, "Result".to_string())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn scrolling_stops_at_the_last_page() {
        let mut viewer = viewer(30);
        // 12 rows minus borders shows 10 lines.
        viewer.handle_key(key(KeyCode::End), 12);
        assert_eq!(viewer.scroll, 20);
        viewer.handle_key(key(KeyCode::Down), 12);
        assert_eq!(viewer.scroll, 20);
        viewer.handle_key(key(KeyCode::PageUp), 12);
        assert_eq!(viewer.scroll, 10);
        viewer.handle_key(key(KeyCode::Home), 12);
        assert_eq!(viewer.scroll, 0);
    }

    #[test]
    fn short_content_does_not_scroll() {
        let mut viewer = viewer(3);
        viewer.handle_key(key(KeyCode::PageDown), 12);
        assert_eq!(viewer.scroll, 0);
    }

    #[test]
    fn mouse_wheel_scrolls() {
        let mut viewer = viewer(30);
        let wheel = |kind| MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        viewer.handle_mouse(wheel(MouseEventKind::ScrollDown), 12);
        assert_eq!(viewer.scroll, MOUSE_SCROLL_LINES);
        viewer.handle_mouse(wheel(MouseEventKind::ScrollUp), 12);
        assert_eq!(viewer.scroll, 0);
    }
}
