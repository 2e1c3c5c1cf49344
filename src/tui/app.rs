//! Application state and event loop

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Widget,
    DefaultTerminal, Frame,
};
use tracing::{debug, error};

use crate::api::ApiClient;
use crate::config::Config;
use crate::services::{DashboardService, LoadStage, SnapshotCacheService};
use crate::types::{Dashboard, DashboardSource};

use super::widgets::{
    centered,
    channels::ChannelMix,
    front_desk::FrontDesk,
    overview::Overview,
    spinner::Spinner,
    tabs::{status_caption, Tab, TabBar},
    write_line,
};

/// Startup options for the TUI
pub struct TuiConfig {
    pub config: Config,
    pub initial_tab: Tab,
}

impl TuiConfig {
    pub fn new(config: Config, initial_tab: Tab) -> Self {
        Self {
            config,
            initial_tab,
        }
    }
}

/// Application state
pub enum AppState {
    /// Loading data with spinner animation
    Loading {
        spinner_frame: usize,
        stage: LoadStage,
    },
    /// Ready with loaded data
    Ready { data: Box<Dashboard> },
    /// Error state
    Error { message: String },
}

/// Message from the background loader, tagged with the load that sent it
pub enum LoaderMsg {
    Stage(u64, LoadStage),
    Done(u64, std::result::Result<Dashboard, String>),
}

/// Main application
pub struct App {
    config: Config,
    state: AppState,
    tab: Tab,
    should_quit: bool,
    /// Bumped on every reload so late results from an older load are dropped
    generation: u64,
    tx: Sender<LoaderMsg>,
    rx: Receiver<LoaderMsg>,
}

impl App {
    /// Create a new app in loading state
    pub fn new(config: Config, tab: Tab) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            config,
            state: AppState::Loading {
                spinner_frame: 0,
                stage: LoadStage::Connecting,
            },
            tab,
            should_quit: false,
            generation: 0,
            tx,
            rx,
        }
    }

    /// Start a fresh dashboard load on a background thread
    pub fn reload(&mut self) {
        self.generation += 1;
        self.state = AppState::Loading {
            spinner_frame: 0,
            stage: LoadStage::Connecting,
        };

        let generation = self.generation;
        let config = self.config.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = load_dashboard(&config, |stage| {
                let _ = tx.send(LoaderMsg::Stage(generation, stage));
            });
            let _ = tx.send(LoaderMsg::Done(generation, result));
        });
    }

    /// Drain loader messages without blocking
    pub fn poll_loader(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.apply(msg);
        }
    }

    fn apply(&mut self, msg: LoaderMsg) {
        match msg {
            LoaderMsg::Stage(generation, stage) if generation == self.generation => {
                if let AppState::Loading { spinner_frame, .. } = self.state {
                    self.state = AppState::Loading {
                        spinner_frame,
                        stage,
                    };
                }
            }
            LoaderMsg::Done(generation, result) if generation == self.generation => {
                self.state = match result {
                    Ok(dashboard) => AppState::Ready {
                        data: Box::new(dashboard),
                    },
                    Err(message) => AppState::Error { message },
                };
            }
            _ => debug!("dropping message from superseded load"),
        }
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        self.should_quit = true;
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
                    KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
                    KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.prev(),
                    KeyCode::Char(c) => {
                        if let Some(tab) = c
                            .to_digit(10)
                            .and_then(|n| Tab::from_index(n as usize))
                        {
                            self.tab = tab;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// Update spinner animation
    pub fn tick(&mut self) {
        if let AppState::Loading {
            spinner_frame,
            stage,
        } = &self.state
        {
            self.state = AppState::Loading {
                spinner_frame: Spinner::next_frame(*spinner_frame),
                stage: *stage,
            };
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Draw the application
    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

fn load_dashboard(config: &Config, on_stage: impl Fn(LoadStage)) -> Result<Dashboard, String> {
    let client = ApiClient::new(config).map_err(|e| e.to_string())?;
    let cache = SnapshotCacheService::new().ok();
    let today = Local::now().date_naive();

    DashboardService::new(&client)
        .load_or_cached(today, cache.as_ref(), &config.scope(), on_stage)
        .map_err(|e| {
            error!(error = %e, "dashboard load failed");
            e.to_string()
        })
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [tabs, banner, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        let (today, offline) = match &self.state {
            AppState::Ready { data } => (
                Some(data.today),
                matches!(data.source, DashboardSource::Cached { .. }),
            ),
            _ => (None, false),
        };
        TabBar::new(self.tab)
            .caption(status_caption(self.config.hotel_id.as_deref(), today, offline))
            .render(tabs, buf);
        write_line(
            buf,
            footer,
            0,
            0,
            "r reload | Tab/1-3 switch | q quit",
            Style::default().fg(Color::DarkGray),
        );

        match &self.state {
            AppState::Loading {
                spinner_frame,
                stage,
            } => {
                Spinner::new(*spinner_frame, *stage)
                    .target(self.config.server())
                    .render(body, buf);
            }
            AppState::Ready { data } => {
                if let DashboardSource::Cached { saved_at } = data.source {
                    write_line(
                        buf,
                        banner,
                        0,
                        0,
                        &offline_banner(saved_at),
                        Style::default().fg(Color::Yellow),
                    );
                }
                match self.tab {
                    Tab::Overview => Overview::new(data, &self.config.currency).render(body, buf),
                    Tab::Channels => ChannelMix::new(&data.channels).render(body, buf),
                    Tab::FrontDesk => FrontDesk::new(data).render(body, buf),
                }
            }
            AppState::Error { message } => {
                let text = format!("Error: {}", message);
                write_line(
                    buf,
                    body,
                    centered(body, &text),
                    body.height / 2,
                    &text,
                    Style::default().fg(Color::Red),
                );
            }
        }
    }
}

/// Banner for a replayed snapshot, with its save time in local time
fn offline_banner(saved_at: DateTime<Utc>) -> String {
    format!(
        "Offline: snapshot from {}. Press r to retry.",
        saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )
}

/// Run the TUI application
pub fn run(tui_config: TuiConfig) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, tui_config);
    ratatui::restore();
    result
}

fn run_app(terminal: &mut DefaultTerminal, tui_config: TuiConfig) -> anyhow::Result<()> {
    let mut app = App::new(tui_config.config, tui_config.initial_tab);
    app.reload();

    loop {
        app.poll_loader();
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        // Poll for events with 100ms timeout for spinner animation
        if event::poll(Duration::from_millis(100))? {
            app.handle_event(event::read()?);
        } else {
            app.tick();
        }
    }

    Ok(())
}
