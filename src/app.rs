use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use sentinel::api::{FuturesSnapshot, WatchlistSnapshot};
use sentinel::dashboard::normalize_symbol;
use sentinel::{DashboardCoordinator, DashboardError};

use crate::events::{cycle_watchlist, Action, InputMode};
use crate::ui;

pub struct App {
    dashboard: Arc<DashboardCoordinator>,
    futures: watch::Receiver<Option<FuturesSnapshot>>,
    watchlist: watch::Receiver<Option<WatchlistSnapshot>>,
    user_watchlist: watch::Receiver<Option<Vec<String>>>,
    input: InputMode,
    notice: Option<String>,
    error_message: Option<String>,
    show_help: bool,
    should_quit: bool,
}

impl App {
    pub fn new(dashboard: Arc<DashboardCoordinator>) -> Self {
        Self {
            futures: dashboard.futures(),
            watchlist: dashboard.watchlist(),
            user_watchlist: dashboard.user_watchlist(),
            dashboard,
            input: InputMode::default(),
            notice: None,
            error_message: None,
            show_help: false,
            should_quit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> Result<()> {
        if let Err(e) = self.dashboard.initialize().await {
            self.report(e);
        }

        loop {
            terminal.draw(|frame| self.render(frame))?;

            // Slots are read on every draw, so input only needs a short poll.
            let timeout = Duration::from_millis(50);
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if let Some(action) = self.input.handle_key(key.code) {
                            self.apply(action).await;
                        }
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        self.dashboard.shutdown().await;
        Ok(())
    }

    async fn apply(&mut self, action: Action) {
        debug!(event = "app.action", action = ?action);

        let result = match action {
            Action::AddTicker(ticker) => self.add_ticker(&ticker).await,
            Action::RemoveTicker(ticker) => self.remove_ticker(&ticker).await,
            Action::SelectWatchlist(selector) => {
                self.dashboard.change_active_watchlist(selector).await;
                Ok(Some(format!("Watching {}", selector.display_name())))
            }
            Action::NextWatchlist => self.step_watchlist(true).await,
            Action::PrevWatchlist => self.step_watchlist(false).await,
            Action::Reload => self
                .dashboard
                .load_user_watchlist()
                .await
                .map(|symbols| Some(format!("Reloaded {} tickers", symbols.len()))),
            Action::SavePreferences => self
                .dashboard
                .save_preferences()
                .await
                .map(|()| Some("Preferences saved".to_string())),
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                Ok(None)
            }
            Action::CloseHelp => {
                self.show_help = false;
                Ok(None)
            }
            Action::Quit => {
                self.should_quit = true;
                Ok(None)
            }
        };

        match result {
            Ok(Some(notice)) => {
                self.error_message = None;
                self.notice = Some(notice);
            }
            Ok(None) => {}
            Err(e) => self.report(e),
        }
    }

    async fn step_watchlist(&self, forward: bool) -> Result<Option<String>, DashboardError> {
        let selector = cycle_watchlist(self.dashboard.active_watchlist(), forward);
        self.dashboard.change_active_watchlist(selector).await;
        Ok(Some(format!("Watching {}", selector.display_name())))
    }

    async fn add_ticker(&self, ticker: &str) -> Result<Option<String>, DashboardError> {
        let symbol = normalize_symbol(ticker)?;
        let mut notice = format!("Added {}", symbol);
        self.dashboard
            .add_ticker(&symbol, || notice = format!("{} is already on your watchlist", symbol))
            .await?;
        Ok(Some(notice))
    }

    async fn remove_ticker(&self, ticker: &str) -> Result<Option<String>, DashboardError> {
        let Ok(symbol) = normalize_symbol(ticker) else {
            return Ok(None);
        };
        let notice = if self.dashboard.remove_ticker(&symbol).await? {
            format!("Removed {}", symbol)
        } else {
            format!("{} is not on your watchlist", symbol)
        };
        Ok(Some(notice))
    }

    fn report(&mut self, error: DashboardError) {
        warn!(event = "app.action_failed", error = %error, code = error.error_code());
        self.notice = None;
        self.error_message = Some(error.to_string());
    }

    fn render(&self, frame: &mut Frame) {
        let futures_height = self
            .futures
            .borrow()
            .as_ref()
            .map_or(3, |snapshot| snapshot.contracts.len() as u16 + 3);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),              // Status bar
                Constraint::Length(futures_height), // Futures
                Constraint::Min(0),                 // Watchlist + sidebar
                Constraint::Length(3),              // Footer
            ])
            .split(frame.size());

        self.render_status_bar(frame, chunks[0]);
        ui::render_futures(frame, chunks[1], self.futures.borrow().as_ref());

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(24)])
            .split(chunks[2]);
        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(0)])
            .split(body[1]);

        let active = self.dashboard.active_watchlist();
        ui::render_watchlist(frame, body[0], self.watchlist.borrow().as_ref(), active);
        ui::render_watchlist_menu(frame, sidebar[0], active);
        ui::render_user_watchlist(frame, sidebar[1], self.user_watchlist.borrow().as_deref());

        self.render_footer(frame, chunks[3]);

        if self.show_help {
            self.render_help(frame);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let futures = self.futures.borrow();
        let watchlist = self.watchlist.borrow();

        let indicator = if futures.is_some() && watchlist.is_some() {
            Span::styled("● Live", Style::default().fg(Color::Green))
        } else {
            Span::styled("● Loading...", Style::default().fg(Color::Yellow))
        };

        let updated = [
            futures.as_ref().map(|s| s.fetched_at),
            watchlist.as_ref().map(|s| s.fetched_at),
        ]
        .into_iter()
        .flatten()
        .max()
        .map_or_else(|| "Updated: --".to_string(), |t| format!("Updated: {}", t.format("%H:%M:%S UTC")));

        let line = Line::from(vec![
            Span::styled("SENTINEL", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(" │ "),
            indicator,
            Span::raw(" │ "),
            Span::raw(format!("Watching: {}", self.dashboard.active_watchlist().display_name())),
            Span::raw(" │ "),
            Span::raw(updated),
        ]);

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let footer_text = if let Some((prompt, buffer)) = self.input.prompt() {
            Line::from(vec![
                Span::styled(format!("{}: ", prompt), Style::default().fg(Color::Cyan)),
                Span::raw(buffer.to_string()),
                Span::styled("█", Style::default().fg(Color::Cyan)),
                Span::styled("  [Enter] confirm  [Esc] cancel", Style::default().fg(Color::DarkGray)),
            ])
        } else if let Some(ref error) = self.error_message {
            Line::from(vec![
                Span::styled("ERROR: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::styled(error.clone(), Style::default().fg(Color::Red)),
            ])
        } else if let Some(ref notice) = self.notice {
            Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Green)))
        } else {
            Line::from(vec![
                Span::styled("[a] ", Style::default().fg(Color::Yellow)),
                Span::raw("Add  "),
                Span::styled("[d] ", Style::default().fg(Color::Yellow)),
                Span::raw("Remove  "),
                Span::styled("[w/1-5] ", Style::default().fg(Color::Yellow)),
                Span::raw("Watchlist  "),
                Span::styled("[h/?] ", Style::default().fg(Color::Yellow)),
                Span::raw("Help  "),
                Span::styled("[q] ", Style::default().fg(Color::Yellow)),
                Span::raw("Quit"),
            ])
        };

        let paragraph = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = frame.size();
        let popup_width = (area.width * 60) / 100;
        let popup_height = (area.height * 70) / 100;
        let popup_area = Rect {
            x: (area.width - popup_width) / 2,
            y: (area.height - popup_height) / 2,
            width: popup_width,
            height: popup_height,
        };

        frame.render_widget(Clear, popup_area);

        let key = |k: &'static str| Span::styled(format!("{:<10}", k), Style::default().fg(Color::Yellow));
        let help_text = vec![
            Line::from(Span::styled(
                "KEYS",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![key("a"), Span::raw("Add a ticker to your watchlist")]),
            Line::from(vec![key("d / x"), Span::raw("Remove a ticker from your watchlist")]),
            Line::from(vec![key("w / Tab"), Span::raw("Next market watchlist")]),
            Line::from(vec![key("W"), Span::raw("Previous market watchlist")]),
            Line::from(vec![key("1-5"), Span::raw("Jump to a market watchlist")]),
            Line::from(vec![key("r"), Span::raw("Reload your watchlist from disk")]),
            Line::from(vec![key("s"), Span::raw("Save preferences")]),
            Line::from(vec![key("h / ?"), Span::raw("Toggle this help")]),
            Line::from(vec![key("q"), Span::raw("Quit")]),
            Line::from(""),
            Line::from(Span::styled(
                "CARD COLUMNS",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![key("Vol Diff"), Span::raw("Today's volume minus the 30-day average")]),
            Line::from(vec![key("Ratio"), Span::raw("Volume / 30-day average, green above 1.00")]),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" HELP ")
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup_area);
    }
}
