use crossterm::event::KeyCode;
use sentinel::api::WatchlistSelector;

/// What a key press asks the dashboard to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Add the typed ticker to the user watchlist
    AddTicker(String),

    /// Remove the typed ticker from the user watchlist
    RemoveTicker(String),

    /// Poll a specific remote watchlist
    SelectWatchlist(WatchlistSelector),

    NextWatchlist,
    PrevWatchlist,

    /// Re-read the persisted user watchlist
    Reload,

    SavePreferences,
    ToggleHelp,
    CloseHelp,
    Quit,
}

/// Keyboard mode: normal navigation, or typing a ticker for add/remove
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Adding(String),
    Removing(String),
}

impl InputMode {
    /// Text being typed and the prompt it belongs to, if in a typing mode.
    pub fn prompt(&self) -> Option<(&'static str, &str)> {
        match self {
            InputMode::Normal => None,
            InputMode::Adding(buffer) => Some(("Add ticker", buffer)),
            InputMode::Removing(buffer) => Some(("Remove ticker", buffer)),
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<Action> {
        match self {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Adding(buffer) | InputMode::Removing(buffer) => match key {
                KeyCode::Char(c) if is_ticker_char(c) => {
                    buffer.push(c.to_ascii_uppercase());
                    None
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    None
                }
                KeyCode::Esc => {
                    *self = InputMode::Normal;
                    None
                }
                KeyCode::Enter => match std::mem::take(self) {
                    InputMode::Adding(ticker) => Some(Action::AddTicker(ticker)),
                    InputMode::Removing(ticker) => Some(Action::RemoveTicker(ticker)),
                    InputMode::Normal => None,
                },
                _ => None,
            },
        }
    }

    fn handle_normal_key(&mut self, key: KeyCode) -> Option<Action> {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            KeyCode::Char('a') | KeyCode::Char('A') => {
                *self = InputMode::Adding(String::new());
                None
            }
            KeyCode::Char('d') | KeyCode::Char('x') => {
                *self = InputMode::Removing(String::new());
                None
            }
            KeyCode::Char('w') | KeyCode::Tab | KeyCode::Right => Some(Action::NextWatchlist),
            KeyCode::Char('W') | KeyCode::BackTab | KeyCode::Left => Some(Action::PrevWatchlist),
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                Some(Action::SelectWatchlist(WatchlistSelector::ALL[index]))
            }
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reload),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::SavePreferences),
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Esc => Some(Action::CloseHelp),
            _ => None,
        }
    }
}

fn is_ticker_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '=' | '^')
}

/// The watchlist after (or before) `current` in menu order, wrapping around.
pub fn cycle_watchlist(current: WatchlistSelector, forward: bool) -> WatchlistSelector {
    let all = WatchlistSelector::ALL;
    let index = all.iter().position(|s| *s == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % all.len()
    } else {
        (index + all.len() - 1) % all.len()
    };
    all[next]
}
