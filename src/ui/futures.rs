use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use sentinel::api::FuturesSnapshot;

use super::change_color;

pub fn render_futures(frame: &mut Frame, area: Rect, snapshot: Option<&FuturesSnapshot>) {
    let Some(snapshot) = snapshot else {
        let loading = Paragraph::new("Loading futures...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" FUTURES "));
        frame.render_widget(loading, area);
        return;
    };

    let header = Row::new(["Contract", "Symbol", "Last", "Change"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = snapshot
        .contracts
        .iter()
        .map(|contract| {
            Row::new(vec![
                Cell::from(contract.name.clone()),
                Cell::from(contract.symbol.clone()),
                Cell::from(format!("{:.2}", contract.last_price)),
                Cell::from(contract.change_display())
                    .style(Style::default().fg(change_color(contract.change_dollar))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(16), // Contract
        Constraint::Length(8),  // Symbol
        Constraint::Length(12), // Last
        Constraint::Length(20), // Change
    ];

    let title = format!(" FUTURES ({}) ", snapshot.fetched_at.format("%H:%M:%S UTC"));
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}
