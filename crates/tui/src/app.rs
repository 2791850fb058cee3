use std::{collections::VecDeque, io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use grindbot_core::{
    presentation::PanelContent, ActorId, AppConfig, ControlId, ControlSet, PanelKind, SessionKey,
    SessionRegistry,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Block, Borders, List, ListItem, Paragraph, Wrap,
    },
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::surface::{SurfaceEvent, TuiSurface};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_LOG_LINES: usize = 200;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// The panel of the focused session as last drawn by the core.
struct PanelView {
    kind: PanelKind,
    content: PanelContent,
    controls: ControlSet,
}

struct LogLine {
    at: DateTime<Local>,
    text: String,
}

/// Terminal stand-in for the chat channel: one panel, three buttons and a
/// message log.
pub struct GrindbotApp {
    config: AppConfig,
    registry: Arc<SessionRegistry>,
    surface_tx: mpsc::UnboundedSender<SurfaceEvent>,
    surface_rx: Option<mpsc::UnboundedReceiver<SurfaceEvent>>,
    active: Option<SessionKey>,
    next_key: u64,
    panel: Option<PanelView>,
    log: VecDeque<LogLine>,
    as_stranger: bool,
    composer: Option<String>,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl GrindbotApp {
    pub fn new(config: AppConfig) -> Self {
        let registry = SessionRegistry::new(&config);
        let (surface_tx, surface_rx) = mpsc::unbounded_channel();
        Self {
            config,
            registry,
            surface_tx,
            surface_rx: Some(surface_rx),
            active: None,
            next_key: 1,
            panel: None,
            log: VecDeque::new(),
            as_stranger: false,
            composer: None,
            status: "Press m to write in the channel, n to open a session".to_string(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut surface_rx = self
            .surface_rx
            .take()
            .context("terminal UI is already running")?;

        let result = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err.into());
            }
            if self.should_quit {
                break Ok(());
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    match maybe_event {
                        Some(AppEvent::Input(event)) => {
                            if let Err(err) = self.handle_input(event).await {
                                self.set_status(format!("Error: {err}"));
                            }
                        }
                        Some(AppEvent::Tick) => {}
                        None => break Ok(()),
                    }
                }
                Some(event) = surface_rx.recv() => self.handle_surface_event(event),
            }
        };

        self.shutdown().await;
        restore_terminal(&mut terminal)?;
        result
    }

    async fn handle_input(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            _ => Ok(()),
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }
        if self.composer.is_some() {
            return self.handle_composer_key(key).await;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('m') => {
                self.composer = Some(String::new());
                self.set_status("Type a message, Enter to send".to_string());
            }
            KeyCode::Char('n') => {
                let trigger = self.config.bot.trigger.clone();
                self.post_message(trigger).await?;
            }
            KeyCode::Char('w') => self.press(ControlId::Work).await?,
            KeyCode::Char('h') => self.press(ControlId::Hunt).await?,
            KeyCode::Char('c') => self.press(ControlId::Cancel).await?,
            KeyCode::Char('d') => self.delete_panel().await,
            KeyCode::Tab => {
                self.as_stranger = !self.as_stranger;
                let who = if self.as_stranger {
                    "a stranger"
                } else {
                    self.config.player.name.as_str()
                };
                self.set_status(format!("Acting as {who}"));
            }
            _ => {}
        }
        Ok(())
    }

    fn actor(&self) -> ActorId {
        if self.as_stranger {
            ActorId(self.config.player.stranger_id)
        } else {
            ActorId(self.config.player.id)
        }
    }

    async fn handle_composer_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(draft) = self.composer.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.composer = None;
                self.set_status("Message discarded".to_string());
            }
            KeyCode::Enter => {
                let message = self.composer.take().unwrap_or_default();
                self.post_message(message).await?;
            }
            KeyCode::Backspace => {
                draft.pop();
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    draft.push(c);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Say something in the bot channel; the trigger opens a fresh session.
    async fn post_message(&mut self, message: String) -> Result<()> {
        if message.trim().is_empty() {
            return Ok(());
        }
        self.push_log(format!("{}: {message}", self.config.player.name));
        if !self
            .registry
            .should_open(self.config.bot.channel_id, &message)
        {
            self.set_status("Message sent".to_string());
            return Ok(());
        }
        self.open_session().await
    }

    async fn open_session(&mut self) -> Result<()> {
        let key = SessionKey(self.next_key);
        self.next_key += 1;
        self.active = Some(key);
        self.panel = None;

        let owner = ActorId(self.config.player.id);
        let surface = Arc::new(TuiSurface::new(key, self.surface_tx.clone()));
        self.registry
            .open(key, owner, &self.config.player.name, surface)
            .await
            .with_context(|| format!("failed to open session {key}"))?;
        info!(%key, "session opened from terminal");
        self.set_status(format!("Session #{key} opened"));
        Ok(())
    }

    async fn press(&mut self, control: ControlId) -> Result<()> {
        let Some(key) = self.active else {
            self.set_status("No session. Press n to start one".to_string());
            return Ok(());
        };
        let actor = self.actor();
        debug!(%key, %control, %actor, "button pressed");
        self.registry
            .dispatch(key, control, actor)
            .await
            .with_context(|| format!("session {key} is gone"))?;
        if !self.registry.contains(key) {
            self.set_status(format!("Session #{key} ended"));
        }
        Ok(())
    }

    async fn delete_panel(&mut self) {
        let Some(key) = self.active else {
            return;
        };
        match self.registry.remove(key).await {
            Some(session) => session.delete_panel().await,
            None => {
                self.active = None;
                self.panel = None;
                self.set_status(format!("Session #{key} was already closed"));
            }
        }
    }

    fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Panel {
                key,
                kind,
                panel,
                controls,
            } => {
                if self.active == Some(key) {
                    self.panel = Some(PanelView {
                        kind,
                        content: panel,
                        controls,
                    });
                }
            }
            SurfaceEvent::Reply { key, text } => {
                self.push_log(format!("bot → #{key}: {text}"));
            }
            SurfaceEvent::Deleted { key } => {
                self.push_log(format!("panel #{key} deleted"));
                if self.active == Some(key) {
                    self.active = None;
                    self.panel = None;
                }
            }
        }
    }

    async fn shutdown(&mut self) {
        for key in self.registry.keys() {
            if self.registry.remove(key).await.is_none() {
                warn!(%key, "session disappeared during shutdown");
            }
        }
        info!("terminal closed");
    }

    fn push_log(&mut self, text: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(LogLine {
            at: Local::now(),
            text,
        });
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(frame, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);
        self.draw_panel(frame, body[0]);
        self.draw_log(frame, body[1]);
        self.draw_buttons(frame, layout[2]);
        self.draw_status(frame, layout[3]);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let session = match self.active {
            Some(key) => format!("session #{key}"),
            None => "no session".to_string(),
        };
        let (who, color) = if self.as_stranger {
            ("stranger".to_string(), self.theme.warning)
        } else {
            (self.config.player.name.clone(), self.theme.success)
        };
        let line = Line::from(vec![
            Span::styled(
                "grindbot",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" · {session} · acting as ")),
            Span::styled(who, Style::default().fg(color)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_panel(&self, frame: &mut Frame, area: Rect) {
        let Some(view) = &self.panel else {
            let empty = Paragraph::new("No panel posted yet.")
                .style(Style::default().fg(self.theme.muted))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Panel"));
            frame.render_widget(empty, area);
            return;
        };

        let content = &view.content;
        let mut lines: Vec<Line> = content
            .description
            .lines()
            .map(|line| Line::from(line.to_string()))
            .collect();
        lines.push(Line::default());
        for field in content.fields.iter().filter(|field| !field.name.is_empty()) {
            lines.push(Line::from(Span::styled(
                field.name.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.extend(
                field
                    .value
                    .lines()
                    .map(|line| Line::from(format!("  {line}"))),
            );
        }
        if let Some(footer) = &content.footer {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                footer.clone(),
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        let kind = match view.kind {
            PanelKind::Work => "work",
            PanelKind::Hunt => "hunt",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                content.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .title(
                Title::from(kind)
                    .position(Position::Bottom)
                    .alignment(Alignment::Right),
            );
        let paragraph = Paragraph::new(lines)
            .style(Style::default().fg(self.theme.primary_fg))
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(paragraph, area);
    }

    fn draw_log(&self, frame: &mut Frame, area: Rect) {
        let visible = usize::from(area.height.saturating_sub(2));
        let items: Vec<ListItem> = self
            .log
            .iter()
            .rev()
            .take(visible)
            .rev()
            .map(|line| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        line.at.format("%H:%M:%S ").to_string(),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::raw(line.text.clone()),
                ]))
            })
            .collect();
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Channel"));
        frame.render_widget(list, area);
    }

    fn draw_buttons(&self, frame: &mut Frame, area: Rect) {
        let Some(view) = &self.panel else {
            frame.render_widget(Block::default().borders(Borders::ALL), area);
            return;
        };
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(area);
        for ((id, control), cell) in view.controls.iter().zip(cells.iter()) {
            let style = if control.enabled {
                Style::default()
                    .fg(self.button_color(id))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(self.theme.muted)
                    .add_modifier(Modifier::DIM)
            };
            let button = Paragraph::new(format!("[{}] {}", hotkey(id), control.label))
                .alignment(Alignment::Center)
                .style(style)
                .block(Block::default().borders(Borders::ALL).border_style(style));
            frame.render_widget(button, *cell);
        }
    }

    fn button_color(&self, id: ControlId) -> Color {
        match id {
            ControlId::Work => self.theme.primary_fg,
            ControlId::Hunt => self.theme.accent,
            ControlId::Cancel => self.theme.danger,
        }
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        if let Some(draft) = &self.composer {
            let line = Line::from(vec![
                Span::styled("Say: ", Style::default().fg(self.theme.accent)),
                Span::raw(format!("{draft}_")),
                Span::styled(
                    "  |  Enter send · Esc discard",
                    Style::default().fg(self.theme.muted),
                ),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }
        let help = "m say · n new · w/h/c buttons · Tab switch user · d delete · q quit";
        let line = Line::from(vec![
            Span::raw(self.status.clone()),
            Span::styled(format!("  |  {help}"), Style::default().fg(self.theme.muted)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn hotkey(id: ControlId) -> char {
    match id {
        ControlId::Work => 'w',
        ControlId::Hunt => 'h',
        ControlId::Cancel => 'c',
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
