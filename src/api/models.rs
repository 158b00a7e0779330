use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Named remote watchlists that can be polled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum WatchlistSelector {
    #[default]
    MostActive,
    BigGainers,
    BigLosers,
    MostShorted,
    TrendingTickers,
}

impl WatchlistSelector {
    pub const ALL: [WatchlistSelector; 5] = [
        WatchlistSelector::MostActive,
        WatchlistSelector::BigGainers,
        WatchlistSelector::BigLosers,
        WatchlistSelector::MostShorted,
        WatchlistSelector::TrendingTickers,
    ];

    /// Path segment used by the data API.
    pub fn slug(&self) -> &'static str {
        match self {
            WatchlistSelector::MostActive => "most-active",
            WatchlistSelector::BigGainers => "big-gainers",
            WatchlistSelector::BigLosers => "big-losers",
            WatchlistSelector::MostShorted => "most-shorted",
            WatchlistSelector::TrendingTickers => "trending-tickers",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WatchlistSelector::MostActive => "Most Active",
            WatchlistSelector::BigGainers => "Big Gainers",
            WatchlistSelector::BigLosers => "Big Losers",
            WatchlistSelector::MostShorted => "Most Shorted",
            WatchlistSelector::TrendingTickers => "Trending Tickers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureQuote {
    pub name: String,
    pub symbol: String,
    pub last_price: f64,
    pub change_dollar: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturesSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub contracts: Vec<FutureQuote>,
}

/// One row of a remote watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub ticker: String,
    pub last_price: f64,
    pub change_dollar: f64,
    pub change_percent: f64,
    pub volume: i64,
    pub volume_thirty_day_avg: i64,
    pub market_cap: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistSnapshot {
    /// Which watchlist this snapshot was fetched for.
    pub selector: WatchlistSelector,
    pub fetched_at: DateTime<Utc>,
    pub tickers: Vec<Ticker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub ticker: String,
    pub change_dollar_today: f64,
    pub change_pct_today: f64,
    pub cur_price: f64,
    pub prev_close: f64,
    pub open_price: f64,
    pub bid_price: f64,
    pub bid_size: i32,
    pub ask_price: f64,
    pub ask_size: i32,
    pub days_range_high: f64,
    pub days_range_low: f64,
    pub fifty_two_week_range_high: f64,
    pub fifty_two_week_range_low: f64,
    pub volume: i64,
    pub avg_volume: i64,
    pub market_cap: i64,
    pub beta_five_year_monthly: f64,
    pub pe_ratio_ttm: f64,
    pub eps_ttm: f64,
    #[serde(default)]
    pub next_earnings_date: Option<NaiveDate>,
    pub forward_div_yield_value: f64,
    pub forward_div_yield_percentage: f64,
    #[serde(default)]
    pub ex_dividend_date: Option<NaiveDate>,
    pub one_year_target_estimate: f64,
}

/// Format an integer with thousands separators, e.g. `-1234567` -> `-1,234,567`.
pub fn comma_separated(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// `+1.25 (+0.84%)` style change string.
pub fn change_display(change_dollar: f64, change_percent: f64) -> String {
    format!("{:+.2} ({:+.2}%)", change_dollar, change_percent)
}

impl Ticker {
    pub fn price_display(&self) -> String {
        format!("${:.2}", self.last_price)
    }

    pub fn change_display(&self) -> String {
        change_display(self.change_dollar, self.change_percent)
    }

    pub fn is_gaining(&self) -> bool {
        self.change_dollar >= 0.0
    }

    pub fn volume_display(&self) -> String {
        comma_separated(self.volume)
    }

    pub fn avg_volume_display(&self) -> String {
        comma_separated(self.volume_thirty_day_avg)
    }

    /// Today's volume minus the thirty-day average.
    pub fn volume_difference(&self) -> i64 {
        self.volume - self.volume_thirty_day_avg
    }

    pub fn volume_difference_display(&self) -> String {
        comma_separated(self.volume_difference())
    }

    pub fn volume_ratio(&self) -> Option<f64> {
        if self.volume_thirty_day_avg == 0 {
            None
        } else {
            Some(self.volume as f64 / self.volume_thirty_day_avg as f64)
        }
    }

    pub fn volume_ratio_display(&self) -> String {
        match self.volume_ratio() {
            Some(ratio) => format!("{:.2}", ratio),
            None => "N/A".to_string(),
        }
    }

    pub fn market_cap_display(&self) -> String {
        format!("$ {}", comma_separated(self.market_cap))
    }
}

impl FutureQuote {
    pub fn change_display(&self) -> String {
        change_display(self.change_dollar, self.change_percent)
    }
}

impl StockQuote {
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    /// Percent below the 52-week high (negative when under it).
    pub fn distance_from_52w_high_pct(&self) -> f64 {
        if self.fifty_two_week_range_high == 0.0 {
            return 0.0;
        }
        (self.cur_price - self.fifty_two_week_range_high) / self.fifty_two_week_range_high * 100.0
    }

    /// Where the current price sits within today's range, 0.0 at the low and 1.0 at the high.
    pub fn day_range_position(&self) -> Option<f64> {
        let width = self.days_range_high - self.days_range_low;
        if width <= 0.0 {
            None
        } else {
            Some(((self.cur_price - self.days_range_low) / width).clamp(0.0, 1.0))
        }
    }

    pub fn change_display(&self) -> String {
        change_display(self.change_dollar_today, self.change_pct_today)
    }

    pub fn next_earnings_display(&self) -> String {
        match self.next_earnings_date {
            Some(date) => date.format("%b %d, %Y").to_string(),
            None => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(volume: i64, avg: i64) -> Ticker {
        Ticker {
            ticker: "AAPL".to_string(),
            last_price: 189.5,
            change_dollar: -1.25,
            change_percent: -0.65,
            volume,
            volume_thirty_day_avg: avg,
            market_cap: 2_950_000_000_000,
        }
    }

    #[test]
    fn test_comma_separated() {
        assert_eq!(comma_separated(0), "0");
        assert_eq!(comma_separated(999), "999");
        assert_eq!(comma_separated(1000), "1,000");
        assert_eq!(comma_separated(1234567), "1,234,567");
        assert_eq!(comma_separated(-98765), "-98,765");
    }

    #[test]
    fn test_ticker_volume_fields() {
        let t = ticker(75_000_000, 50_000_000);
        assert_eq!(t.volume_display(), "75,000,000");
        assert_eq!(t.volume_difference(), 25_000_000);
        assert_eq!(t.volume_difference_display(), "25,000,000");
        assert_eq!(t.volume_ratio_display(), "1.50");
        assert_eq!(t.market_cap_display(), "$ 2,950,000,000,000");
    }

    #[test]
    fn test_volume_ratio_without_average() {
        let t = ticker(1_000, 0);
        assert_eq!(t.volume_ratio(), None);
        assert_eq!(t.volume_ratio_display(), "N/A");
    }

    #[test]
    fn test_change_display_signs() {
        let t = ticker(1, 1);
        assert_eq!(t.change_display(), "-1.25 (-0.65%)");
        assert!(!t.is_gaining());
        assert_eq!(change_display(2.0, 1.5), "+2.00 (+1.50%)");
    }

    #[test]
    fn test_selector_cli_names_match_slugs() {
        use clap::ValueEnum;

        for selector in WatchlistSelector::ALL {
            assert_eq!(WatchlistSelector::from_str(selector.slug(), false), Ok(selector));
        }
        assert!(WatchlistSelector::from_str("nope", false).is_err());
        assert_eq!(WatchlistSelector::default(), WatchlistSelector::MostActive);
    }

    #[test]
    fn test_selector_serializes_kebab_case() {
        let json = serde_json::to_string(&WatchlistSelector::BigGainers).unwrap();
        assert_eq!(json, "\"big-gainers\"");
    }

    #[test]
    fn test_stock_quote_deserializes_optional_dates() {
        let json = serde_json::json!({
            "ticker": "MSFT",
            "change_dollar_today": 3.1,
            "change_pct_today": 0.75,
            "cur_price": 415.0,
            "prev_close": 411.9,
            "open_price": 412.0,
            "bid_price": 414.9,
            "bid_size": 100,
            "ask_price": 415.1,
            "ask_size": 200,
            "days_range_high": 420.0,
            "days_range_low": 410.0,
            "fifty_two_week_range_high": 430.0,
            "fifty_two_week_range_low": 300.0,
            "volume": 21000000,
            "avg_volume": 20000000,
            "market_cap": 3080000000000i64,
            "beta_five_year_monthly": 0.9,
            "pe_ratio_ttm": 36.2,
            "eps_ttm": 11.45,
            "next_earnings_date": "2024-07-23",
            "forward_div_yield_value": 3.0,
            "forward_div_yield_percentage": 0.72,
            "one_year_target_estimate": 470.0
        });

        let quote: StockQuote = serde_json::from_value(json).unwrap();
        assert_eq!(quote.ex_dividend_date, None);
        assert_eq!(quote.next_earnings_display(), "Jul 23, 2024");
        assert!((quote.spread() - 0.2).abs() < 1e-9);
        assert_eq!(quote.day_range_position(), Some(0.5));
        assert!(quote.distance_from_52w_high_pct() < 0.0);
    }
}
