use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;
use ratatui::widgets::Padding;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Tabs;
use ratatui::widgets::Wrap;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::application::cli::format_instagram_result;
use crate::application::cli::format_text_result;
use crate::domain::models::Event;
use crate::domain::models::SentimentLabel;
use crate::domain::models::TextArea;
use crate::domain::models::UiEvent;
use crate::domain::models::ViewMode;
use crate::domain::services::events::EventsService;
use crate::domain::services::Orchestrator;

const TEXT_TITLE: &str = "Text to analyze";
const INSTAGRAM_TITLE: &str = "Instagram post URL";
const USERNAME_TITLE: &str = "Username";

pub fn help_text() -> String {
    let text = r#"
HOTKEYS:
- F1 / F2 / F3 or Tab: Switch between the Dashboard, Text and Instagram views.
- Enter: Submit the current input, or replay the selected history entry on the Dashboard.
- Up / Down: Select a history entry.
- Ctrl+T: Toggle real-time analysis in the Text view.
- Ctrl+L: Log in with an Instagram session.
- Ctrl+O: Log out.
- Ctrl+X: Clear history.
- Ctrl+C: Quit.

LOGIN PROMPT:
- Tab: Switch between the username and session ID fields.
- Enter: Log in.
- Esc: Close the prompt.
    "#;

    return text.trim().to_string();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoginField {
    Username,
    Token,
}

struct DashboardState<'a> {
    text_input: tui_textarea::TextArea<'a>,
    instagram_input: tui_textarea::TextArea<'a>,
    username_input: tui_textarea::TextArea<'a>,
    token_input: tui_textarea::TextArea<'a>,
    login_field: LoginField,
    history: ListState,
    warning: Option<String>,
}

impl<'a> DashboardState<'a> {
    fn new(orchestrator: &Orchestrator) -> DashboardState<'a> {
        return DashboardState {
            text_input: TextArea::with_content(TEXT_TITLE, orchestrator.text_input()),
            instagram_input: TextArea::with_content(
                INSTAGRAM_TITLE,
                orchestrator.instagram_input(),
            ),
            username_input: TextArea::with_content(USERNAME_TITLE, ""),
            token_input: TextArea::with_content("", ""),
            login_field: LoginField::Username,
            history: ListState::default(),
            warning: None,
        };
    }

    fn sync_inputs(&mut self, orchestrator: &Orchestrator) {
        self.text_input = TextArea::with_content(TEXT_TITLE, orchestrator.text_input());
        self.instagram_input =
            TextArea::with_content(INSTAGRAM_TITLE, orchestrator.instagram_input());
    }

    fn reset_login(&mut self) {
        self.username_input = TextArea::with_content(USERNAME_TITLE, "");
        self.token_input = TextArea::with_content("", "");
        self.login_field = LoginField::Username;
    }

    fn toggle_login_field(&mut self) {
        if self.login_field == LoginField::Username {
            self.login_field = LoginField::Token;
        } else {
            self.login_field = LoginField::Username;
        }
    }

    fn select_history(&mut self, len: usize, offset: isize) {
        if len == 0 {
            self.history.select(None);
            return;
        }

        let current = self.history.selected().map(|e| return e as isize).unwrap_or(-1);
        let next = (current + offset).clamp(0, len as isize - 1);
        self.history.select(Some(next as usize));
    }

    /// The textarea that keyboard input currently goes to, if any.
    fn focused_input(
        &mut self,
        orchestrator: &Orchestrator,
    ) -> Option<&mut tui_textarea::TextArea<'a>> {
        if orchestrator.is_login_prompt_open() {
            match self.login_field {
                LoginField::Username => return Some(&mut self.username_input),
                LoginField::Token => return Some(&mut self.token_input),
            }
        }

        match orchestrator.view_mode() {
            ViewMode::Dashboard => return None,
            ViewMode::Text => return Some(&mut self.text_input),
            ViewMode::Instagram => return Some(&mut self.instagram_input),
        }
    }

    /// Pushes the visible inputs back into the orchestrator so real-time
    /// analysis sees every edit.
    fn publish_inputs(&self, orchestrator: &mut Orchestrator) {
        let text = TextArea::text(&self.text_input);
        if text != orchestrator.text_input() {
            orchestrator.set_text_input(&text);
        }

        let url = TextArea::text(&self.instagram_input);
        if url != orchestrator.instagram_input() {
            orchestrator.set_instagram_input(&url);
        }
    }
}

fn label_color(label: SentimentLabel) -> Color {
    match label {
        SentimentLabel::Positive => return Color::Green,
        SentimentLabel::Neutral => return Color::Gray,
        SentimentLabel::Negative => return Color::Red,
    }
}

fn bordered(title: &str) -> Block<'_> {
    return Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .padding(Padding::new(1, 1, 0, 0));
}

fn centered_rect(width: u16, height: u16, rect: Rect) -> Rect {
    let width = width.min(rect.width);
    let height = height.min(rect.height);

    return Rect {
        x: rect.x + (rect.width - width) / 2,
        y: rect.y + (rect.height - height) / 2,
        width,
        height,
    };
}

fn render_tabs<B: Backend>(frame: &mut Frame<B>, rect: Rect, orchestrator: &Orchestrator) {
    let session_title = match orchestrator.session() {
        Some(session) => format!(" Naveena | @{} ", session.username),
        None => " Naveena | not logged in (Ctrl+L) ".to_string(),
    };

    let titles = ViewMode::titles()
        .iter()
        .enumerate()
        .map(|(idx, title)| return format!("F{} {title}", idx + 1))
        .collect::<Vec<String>>();

    frame.render_widget(
        Tabs::new(titles)
            .select(orchestrator.view_mode().index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .title(session_title),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
        rect,
    );
}

fn render_dashboard<B: Backend>(
    frame: &mut Frame<B>,
    rect: Rect,
    orchestrator: &Orchestrator,
    state: &mut DashboardState,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rect);

    let stats = orchestrator.history().stats();
    let fmt_mean = |mean: Option<f64>| {
        return mean
            .map(|e| return format!("{e:.2}"))
            .unwrap_or_else(|| return "-".to_string());
    };
    let lines = vec![
        Line::from(format!("Total analyses:       {}", stats.total)),
        Line::from(format!("Text:                 {}", stats.text_count)),
        Line::from(format!("Instagram:            {}", stats.instagram_count)),
        Line::from(""),
        Line::from(format!(
            "Mean text compound:   {}",
            fmt_mean(stats.mean_text_compound)
        )),
        Line::from(format!(
            "Mean Instagram score: {}",
            fmt_mean(stats.mean_instagram_score)
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(bordered("Overview")),
        layout[0],
    );

    let items = orchestrator
        .history()
        .items()
        .iter()
        .map(|e| return ListItem::new(e.summary()))
        .collect::<Vec<ListItem>>();

    if items.is_empty() {
        frame.render_widget(
            Paragraph::new("No analyses yet. Press F2 to analyze text or F3 for an Instagram post.")
                .wrap(Wrap { trim: true })
                .block(bordered("History")),
            layout[1],
        );
        return;
    }

    frame.render_stateful_widget(
        List::new(items)
            .block(bordered("History (Enter to replay, Ctrl+X to clear)"))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> "),
        layout[1],
        &mut state.history,
    );
}

fn render_text<B: Backend>(
    frame: &mut Frame<B>,
    rect: Rect,
    orchestrator: &Orchestrator,
    state: &DashboardState,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(rect);

    frame.render_widget(state.text_input.widget(), layout[0]);

    let realtime = if orchestrator.is_realtime_enabled() {
        Span::styled("on", Style::default().fg(Color::Green))
    } else {
        Span::styled("off", Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(" Real-time analysis: "),
            realtime,
            Span::raw(" (Ctrl+T)"),
        ])),
        layout[1],
    );

    let result = match orchestrator.text_result() {
        Some(res) => Paragraph::new(format_text_result(res))
            .style(Style::default().fg(label_color(res.label()))),
        None => Paragraph::new("Type some text and press Enter."),
    };
    frame.render_widget(
        result.wrap(Wrap { trim: false }).block(bordered("Result")),
        layout[2],
    );
}

fn render_instagram<B: Backend>(
    frame: &mut Frame<B>,
    rect: Rect,
    orchestrator: &Orchestrator,
    state: &DashboardState,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(rect);

    let session_line = match orchestrator.session() {
        Some(session) => format!(" Analyzing as @{}", session.username),
        None => " Log in with Ctrl+L before analyzing a post.".to_string(),
    };
    frame.render_widget(Paragraph::new(session_line), layout[0]);
    frame.render_widget(state.instagram_input.widget(), layout[1]);

    let result = match orchestrator.instagram_result() {
        Some(res) => Paragraph::new(format_instagram_result(res))
            .style(Style::default().fg(label_color(res.label()))),
        None => Paragraph::new("Paste a post URL and press Enter."),
    };
    frame.render_widget(
        result.wrap(Wrap { trim: false }).block(bordered("Result")),
        layout[2],
    );
}

fn render_status<B: Backend>(
    frame: &mut Frame<B>,
    rect: Rect,
    orchestrator: &Orchestrator,
    state: &DashboardState,
) {
    let mut spans = vec![];

    let loading = orchestrator.loading();
    if loading.is_loading {
        spans.push(Span::styled(
            format!("{} ", loading.message),
            Style::default().fg(Color::Cyan),
        ));
    }
    if let Some(err) = orchestrator.error() {
        spans.push(Span::styled(
            format!("{err} "),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(warning) = &state.warning {
        spans.push(Span::styled(
            format!("{warning} "),
            Style::default().fg(Color::Yellow),
        ));
    }
    if !orchestrator.is_persistence_available() {
        spans.push(Span::styled(
            "[memory only] ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::DIM),
        ));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "Ready. Tab switches views, Ctrl+C quits.",
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL)),
        rect,
    );
}

fn render_login_prompt<B: Backend>(frame: &mut Frame<B>, state: &mut DashboardState) {
    let popup = centered_rect(60, 10, frame.size());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .title("Log in to Instagram")
        .padding(Padding::new(1, 1, 0, 0));
    let inner = block.inner(popup);

    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(inner);

    let focused = Style::default().fg(Color::Magenta);
    let (username_style, token_style) = match state.login_field {
        LoginField::Username => (focused, Style::default()),
        LoginField::Token => (Style::default(), focused),
    };

    state.username_input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(username_style)
            .title(USERNAME_TITLE),
    );
    frame.render_widget(state.username_input.widget(), layout[0]);

    let masked = "*".repeat(TextArea::text(&state.token_input).chars().count());
    frame.render_widget(
        Paragraph::new(masked).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(token_style)
                .title("Session ID"),
        ),
        layout[1],
    );

    frame.render_widget(
        Paragraph::new("Tab switches fields, Enter logs in, Esc closes.")
            .style(Style::default().fg(Color::DarkGray)),
        layout[2],
    );
}

fn render<B: Backend>(frame: &mut Frame<B>, orchestrator: &Orchestrator, state: &mut DashboardState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.size());

    render_tabs(frame, layout[0], orchestrator);
    match orchestrator.view_mode() {
        ViewMode::Dashboard => render_dashboard(frame, layout[1], orchestrator, state),
        ViewMode::Text => render_text(frame, layout[1], orchestrator, state),
        ViewMode::Instagram => render_instagram(frame, layout[1], orchestrator, state),
    }
    render_status(frame, layout[2], orchestrator, state);

    if orchestrator.is_login_prompt_open() {
        render_login_prompt(frame, state);
    }
}

fn handle_enter(orchestrator: &mut Orchestrator, state: &mut DashboardState) {
    if orchestrator.is_login_prompt_open() {
        let username = TextArea::text(&state.username_input);
        let token = TextArea::text(&state.token_input);
        if orchestrator.login(&username, &token).is_ok() {
            state.reset_login();
        }
        return;
    }

    match orchestrator.view_mode() {
        ViewMode::Dashboard => {
            let selected = state
                .history
                .selected()
                .and_then(|idx| return orchestrator.history().items().get(idx))
                .map(|e| return e.id.to_string());

            if let Some(id) = selected {
                orchestrator.load_history_entry(&id);
                state.sync_inputs(orchestrator);
            }
        }
        ViewMode::Text => {
            let text = TextArea::text(&state.text_input);
            orchestrator.submit_text_manual(&text);
        }
        ViewMode::Instagram => {
            let url = TextArea::text(&state.instagram_input);
            orchestrator.set_instagram_input(&url);
            if let Err(err) = orchestrator.submit_instagram(&url) {
                tracing::debug!(error = %err, "Instagram submission rejected");
            }
        }
    }
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    orchestrator: &mut Orchestrator,
    events: &mut EventsService,
    state: &mut DashboardState<'_>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, orchestrator, state))?;

        match events.next().await? {
            UiEvent::Orchestrator(event) => {
                orchestrator.handle_event(event);
            }
            UiEvent::KeyboardCTRLC() => {
                break;
            }
            UiEvent::KeyboardView(view_mode) => {
                if !orchestrator.is_login_prompt_open() {
                    orchestrator.set_view_mode(view_mode);
                }
            }
            UiEvent::KeyboardTab() => {
                if orchestrator.is_login_prompt_open() {
                    state.toggle_login_field();
                } else {
                    orchestrator.set_view_mode(orchestrator.view_mode().next());
                }
            }
            UiEvent::KeyboardEsc() => {
                orchestrator.close_login_prompt();
            }
            UiEvent::KeyboardEnter() => {
                handle_enter(orchestrator, state);
            }
            UiEvent::KeyboardCTRLT() => {
                orchestrator.set_realtime_enabled(!orchestrator.is_realtime_enabled());
            }
            UiEvent::KeyboardCTRLL() => {
                state.reset_login();
                orchestrator.show_login_prompt();
            }
            UiEvent::KeyboardCTRLO() => {
                orchestrator.logout();
            }
            UiEvent::KeyboardCTRLX() => {
                orchestrator.clear_history();
                state.history.select(None);
            }
            UiEvent::UISelectUp() => {
                state.select_history(orchestrator.history().len(), -1);
            }
            UiEvent::UISelectDown() => {
                state.select_history(orchestrator.history().len(), 1);
            }
            UiEvent::KeyboardCharInput(input) => {
                if let Some(textarea) = state.focused_input(orchestrator) {
                    textarea.input(input);
                    state.publish_inputs(orchestrator);
                }
            }
            UiEvent::KeyboardPaste(text) => {
                if let Some(textarea) = state.focused_input(orchestrator) {
                    textarea.insert_str(text.replace(['\r', '\n'], " "));
                    state.publish_inputs(orchestrator);
                }
            }
            UiEvent::UITick() => (),
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    mut orchestrator: Orchestrator,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut state = DashboardState::new(&orchestrator);
    if let Err(err) = orchestrator.health_check().await {
        tracing::warn!(error = ?err, "Analysis server health check failed");
        state.warning = Some(format!(
            "The analysis server can't be reached, analyses will fail until it's up. ({err})"
        ));
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;
    let mut events = EventsService::new(rx);

    start_loop(&mut terminal, &mut orchestrator, &mut events, &mut state).await?;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return Ok(());
}
