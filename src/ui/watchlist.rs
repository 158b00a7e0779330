use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use sentinel::api::{Ticker, WatchlistSelector, WatchlistSnapshot};

use super::{change_color, ratio_color};

/// One card per ticker: price, change, the volume block and market cap.
fn card_row(ticker: &Ticker) -> Row<'static> {
    Row::new(vec![
        Cell::from(ticker.ticker.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(ticker.price_display()),
        Cell::from(ticker.change_display()).style(Style::default().fg(change_color(ticker.change_dollar))),
        Cell::from(ticker.volume_display()),
        Cell::from(ticker.avg_volume_display()),
        Cell::from(ticker.volume_difference_display())
            .style(Style::default().fg(change_color(ticker.volume_difference() as f64))),
        Cell::from(ticker.volume_ratio_display()).style(Style::default().fg(ratio_color(ticker.volume_ratio()))),
        Cell::from(ticker.market_cap_display()),
    ])
}

/// The polled remote watchlist. `active` is the selector being polled now,
/// which differs from the snapshot's until the first fetch after a switch lands.
pub fn render_watchlist(
    frame: &mut Frame,
    area: Rect,
    snapshot: Option<&WatchlistSnapshot>,
    active: WatchlistSelector,
) {
    let Some(snapshot) = snapshot else {
        let loading = Paragraph::new(format!("Loading {}...", active.display_name()))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" WATCHLIST "));
        frame.render_widget(loading, area);
        return;
    };

    let header = Row::new([
        "Ticker", "Price", "Change", "Volume", "Avg Vol", "Vol Diff", "Ratio", "Mkt Cap",
    ])
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let rows: Vec<Row> = snapshot.tickers.iter().map(card_row).collect();

    let widths = [
        Constraint::Length(8),  // Ticker
        Constraint::Length(11), // Price
        Constraint::Length(18), // Change
        Constraint::Length(13), // Volume
        Constraint::Length(13), // Avg Vol
        Constraint::Length(14), // Vol Diff
        Constraint::Length(6),  // Ratio
        Constraint::Length(20), // Mkt Cap
    ];

    let mut title = format!(
        " {} ({} tickers, {}) ",
        snapshot.selector.display_name().to_uppercase(),
        snapshot.tickers.len(),
        snapshot.fetched_at.format("%H:%M:%S UTC")
    );
    if snapshot.selector != active {
        title.push_str(&format!("→ switching to {} ", active.display_name()));
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}

/// The five remote watchlists with their number keys; the polled one is marked.
pub fn render_watchlist_menu(frame: &mut Frame, area: Rect, active: WatchlistSelector) {
    let items: Vec<ListItem> = WatchlistSelector::ALL
        .iter()
        .enumerate()
        .map(|(i, selector)| {
            let line = if *selector == active {
                Line::from(vec![
                    Span::styled(format!("{} ▶ ", i + 1), Style::default().fg(Color::Cyan)),
                    Span::styled(
                        selector.display_name(),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(vec![
                    Span::styled(format!("{}   ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::raw(selector.display_name()),
                ])
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" WATCHLISTS "));
    frame.render_widget(list, area);
}

pub fn render_user_watchlist(frame: &mut Frame, area: Rect, symbols: Option<&[String]>) {
    let block = Block::default().borders(Borders::ALL).title(" MY WATCHLIST ");

    let widget = match symbols {
        None => List::new(vec![ListItem::new(Span::styled(
            "Loading...",
            Style::default().fg(Color::DarkGray),
        ))]),
        Some([]) => List::new(vec![ListItem::new(Span::styled(
            "(empty) press [a] to add",
            Style::default().fg(Color::DarkGray),
        ))]),
        Some(symbols) => List::new(symbols.iter().map(|s| ListItem::new(s.clone())).collect::<Vec<_>>()),
    };

    frame.render_widget(widget.block(block), area);
}

/// Plain-text user watchlist for the one-shot commands.
pub fn user_watchlist_line(symbols: &[String]) -> String {
    if symbols.is_empty() {
        "My watchlist: (empty) - use 'sentinel add <TICKER>'".to_string()
    } else {
        format!("My watchlist: {}", symbols.join(", "))
    }
}
