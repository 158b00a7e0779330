pub mod futures;
pub mod quote;
pub mod watchlist;

use ratatui::style::Color;

pub use futures::render_futures;
pub use quote::render_quote;
pub use watchlist::{render_user_watchlist, render_watchlist, render_watchlist_menu, user_watchlist_line};

/// Green for a gain, red for a loss, gray when flat.
pub fn change_color(value: f64) -> Color {
    if value > 0.0 {
        Color::Green
    } else if value < 0.0 {
        Color::Red
    } else {
        Color::Gray
    }
}

/// Volume running above its 30-day average is green.
pub fn ratio_color(ratio: Option<f64>) -> Color {
    match ratio {
        Some(r) if r >= 1.0 => Color::Green,
        Some(_) => Color::Red,
        None => Color::Gray,
    }
}
