use sentinel::api::models::comma_separated;
use sentinel::api::StockQuote;

/// Plain-text quote for the one-shot `quote` command.
pub fn render_quote(quote: &StockQuote, extended: bool) -> String {
    let mut lines = vec![
        format!("{}  ${:.2}  {}", quote.ticker, quote.cur_price, quote.change_display()),
        format!(
            "  Bid {:.2} x {}   Ask {:.2} x {}   Spread {:.2}",
            quote.bid_price,
            quote.bid_size,
            quote.ask_price,
            quote.ask_size,
            quote.spread()
        ),
        format!(
            "  Day {:.2} - {:.2}   52w {:.2} - {:.2} ({:+.1}% from high)",
            quote.days_range_low,
            quote.days_range_high,
            quote.fifty_two_week_range_low,
            quote.fifty_two_week_range_high,
            quote.distance_from_52w_high_pct()
        ),
        format!(
            "  Volume {}   Avg {}",
            comma_separated(quote.volume),
            comma_separated(quote.avg_volume)
        ),
    ];

    if extended {
        lines.push(format!(
            "  Mkt Cap $ {}   Beta {:.2}   P/E {:.2}   EPS {:.2}",
            comma_separated(quote.market_cap),
            quote.beta_five_year_monthly,
            quote.pe_ratio_ttm,
            quote.eps_ttm
        ));
        lines.push(format!(
            "  Next earnings {}   Fwd div {:.2} ({:.2}%)   1y target {:.2}",
            quote.next_earnings_display(),
            quote.forward_div_yield_value,
            quote.forward_div_yield_percentage,
            quote.one_year_target_estimate
        ));
    }

    lines.join("\n")
}
