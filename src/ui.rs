use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use user_migration::view::EMPTY_TEXT;
use user_migration::{render_company, render_user, UserRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Users,
    Companies,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Users => Page::Companies,
            Page::Companies => Page::Users,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Users => "Users",
            Page::Companies => "Companies",
        }
    }
}

pub struct App {
    pub rows: Vec<UserRow>,
    pub filtered_rows: Vec<UserRow>,
    pub state: TableState,
    pub current_page: Page,
    pub companies_state: TableState,
    pub show_detail: bool,
    /// Company name the user list is narrowed to
    pub company_filter: Option<String>,
}

impl App {
    pub fn new(rows: Vec<UserRow>) -> Self {
        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }

        let mut companies_state = TableState::default();
        companies_state.select(Some(0));

        let filtered_rows = rows.clone();

        Self {
            rows,
            filtered_rows,
            state,
            current_page: Page::Users,
            companies_state,
            show_detail: false,
            company_filter: None,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_row(&self) -> Option<&UserRow> {
        self.state.selected().and_then(|i| self.filtered_rows.get(i))
    }

    /// Distinct companies with their user counts, in first-seen order
    pub fn company_summary(&self) -> Vec<(String, usize)> {
        let mut summary: Vec<(String, usize)> = Vec::new();

        for row in &self.rows {
            match summary.iter_mut().find(|(name, _)| *name == row.company.title) {
                Some(entry) => entry.1 += 1,
                None => summary.push((row.company.title.clone(), 1)),
            }
        }

        summary
    }

    pub fn apply_company_filter(&mut self, company: Option<String>) {
        self.filtered_rows = match &company {
            Some(name) => self
                .rows
                .iter()
                .filter(|row| &row.company.title == name)
                .cloned()
                .collect(),
            None => self.rows.clone(),
        };
        self.company_filter = company;

        // Reset selection to first item
        if self.filtered_rows.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    /// Narrow the user list to the company selected on the Companies page
    pub fn filter_by_selected_company(&mut self) {
        let summary = self.company_summary();
        let selected = self
            .companies_state
            .selected()
            .and_then(|i| summary.get(i))
            .map(|(name, _)| name.clone());

        if selected.is_some() {
            self.apply_company_filter(selected);
            self.current_page = Page::Users;
        }
    }

    pub fn next(&mut self) {
        let (len, state) = self.current_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (len, state) = self.current_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn current_list(&mut self) -> (usize, &mut TableState) {
        match self.current_page {
            Page::Users => (self.filtered_rows.len(), &mut self.state),
            Page::Companies => (self.company_summary().len(), &mut self.companies_state),
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Enter if app.current_page == Page::Companies => {
                    app.filter_by_selected_company()
                }
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::Char('c') => app.apply_company_filter(None),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.rows.is_empty() {
        let empty = Paragraph::new(format!("  {} (user-migration migrate <ENDPOINT>)", EMPTY_TEXT))
            .block(Block::default().borders(Borders::ALL).title(" Users "));
        f.render_widget(empty, chunks[1]);
    } else if app.show_detail && app.current_page == Page::Users {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(55), // User list
                Constraint::Percentage(45), // Detail panel
            ])
            .split(chunks[1]);

        render_users(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Users => render_users(f, chunks[1], app),
            Page::Companies => render_companies(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Users, Page::Companies].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Users: {}", app.rows.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Companies: {}", app.company_summary().len()),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_users(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.filtered_rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(truncate(&row.user.title, 18)),
            Cell::from(truncate(&row.user.name, 26)),
            Cell::from(truncate(&row.user.email, 28)),
            Cell::from(truncate(&row.company.title, 22)).style(Style::default().fg(Color::Green)),
        ])
        .height(1)
    });

    let title = match &app.company_filter {
        Some(company) => format!(" Users - {} ", company),
        None => " Users ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(28),
            Constraint::Length(30),
            Constraint::Length(24),
        ],
    )
    .header(header_row(&["Username", "Name", "Email", "Company"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_companies(f: &mut Frame, area: Rect, app: &mut App) {
    let summary = app.company_summary();
    let rows = summary.iter().map(|(name, count)| {
        Row::new(vec![Cell::from(name.clone()), Cell::from(count.to_string())]).height(1)
    });

    let table = Table::new(rows, [Constraint::Length(40), Constraint::Length(10)])
        .header(header_row(&["Company", "Users"]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Companies "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.companies_state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" User Details ");

    let Some(row) = app.selected_row() else {
        f.render_widget(Paragraph::new("No user selected").block(block), area);
        return;
    };

    let label = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let mut content = vec![Line::from(Span::styled("  USER", label)), Line::from("")];
    content.extend(block_lines(&render_user(&row.user)));
    content.push(Line::from("  ─────────────────────────────────────"));
    content.push(Line::from(Span::styled("  COMPANY", label)));
    content.push(Line::from(""));
    content.extend(block_lines(&render_company(&row.company)));

    let detail_panel = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    f.render_widget(detail_panel, area);
}

/// Rendered blocks separate fields with blank lines; the panel drops them
fn block_lines(block: &str) -> Vec<Line<'static>> {
    block
        .split("\n\n")
        .map(|field| match field.split_once(": ") {
            Some((name, value)) => Line::from(vec![
                Span::styled(
                    format!("  {}: ", name),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw(value.to_string()),
            ]),
            None => Line::from(format!("  {}", field)),
        })
        .collect()
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.filtered_rows.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(company) = &app.company_filter {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Company: {}", company),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    let keys = [
        ("Enter", " Details/Filter | "),
        ("Tab", " Page | "),
        ("↑/↓", " Nav | "),
    ];
    for (key, action) in keys {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(action));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use user_migration::{load_user_rows, MemoryStore, MessageLog, Migrator};

    fn app() -> App {
        let store = MemoryStore::new();
        let log = MessageLog::new();
        Migrator::new(&store, &log)
            .migrate_payload(include_bytes!("../tests/fixtures/users.json"))
            .unwrap();
        App::new(load_user_rows(&store).unwrap())
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();
        app.previous();
        assert_eq!(app.state.selected(), Some(9));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_company_filter_from_companies_page() {
        let mut app = app();
        app.current_page = Page::Companies;
        app.next();
        app.filter_by_selected_company();

        assert_eq!(app.current_page, Page::Users);
        assert_eq!(app.company_filter.as_deref(), Some("Deckow-Crist"));
        assert_eq!(app.filtered_rows.len(), 1);
        assert_eq!(app.selected_row().unwrap().user.title, "Antonette");

        app.apply_company_filter(None);
        assert_eq!(app.filtered_rows.len(), 10);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Romaguera-Jacobson", 10), "Romague...");
    }
}
