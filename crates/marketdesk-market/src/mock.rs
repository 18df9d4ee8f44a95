//! Synthetic market data substituted when an upstream is unavailable.
//!
//! Generators are deterministic in their inputs: the same ticker and
//! parameters always produce the same prices, so a dashboard refresh
//! against a dead upstream does not jitter.

use chrono::{DateTime, Datelike, Duration, DurationRound, Utc, Weekday};
use marketdesk_models::market::{Candle, NewsItem, OptionContract, OptionsChain, Quote, TimeSeries};
use marketdesk_models::params::{interval_minutes, period_days};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sources::to_decimal;

const MAX_POINTS: u32 = 500;
const DAILY_VOLATILITY: f64 = 0.02;

/// FNV-1a over the parts, separated so ("AB","C") and ("A","BC") differ.
fn seed(parts: &[&str]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(0xff)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

fn rng_for(parts: &[&str]) -> StdRng {
    StdRng::seed_from_u64(seed(parts))
}

/// Stable per-ticker reference price between 20 and 500.
pub fn base_price(ticker: &str) -> f64 {
    let mut rng = rng_for(&["base", ticker]);
    (rng.random_range(20.0..500.0_f64) * 100.0).round() / 100.0
}

/// Zero-mean noise with the given standard deviation.
fn noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    (rng.random::<f64>() - 0.5) * 2.0 * 3.0_f64.sqrt() * std_dev
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn mock_quote(ticker: &str) -> Quote {
    let mut rng = rng_for(&["quote", ticker]);
    let previous_close = base_price(ticker);
    let price = round2(previous_close * (1.0 + noise(&mut rng, DAILY_VOLATILITY)));
    let open = round2(previous_close * (1.0 + noise(&mut rng, DAILY_VOLATILITY / 2.0)));
    let high = round2(price.max(open) * (1.0 + rng.random_range(0.0..0.01)));
    let low = round2(price.min(open) * (1.0 - rng.random_range(0.0..0.01)));
    let change = price - previous_close;

    Quote {
        symbol: ticker.to_string(),
        price: to_decimal(price),
        change: to_decimal(change),
        change_percent: to_decimal(change / previous_close * 100.0),
        previous_close: to_decimal(previous_close),
        open: to_decimal(open),
        day_high: to_decimal(high),
        day_low: to_decimal(low),
        volume: rng.random_range(500_000..50_000_000),
        currency: "USD".to_string(),
        exchange: Some("MOCK".to_string()),
        market_time: Utc::now(),
    }
}

/// Random-walk bars ending at `now`, one per `interval`, covering `period`.
pub fn mock_time_series(ticker: &str, period: &str, interval: &str, now: DateTime<Utc>) -> TimeSeries {
    let mut rng = rng_for(&["series", ticker, period, interval]);
    let step_minutes = interval_minutes(interval);
    let count = (period_days(period) * 1_440 / step_minutes).clamp(2, MAX_POINTS);
    let step_volatility = DAILY_VOLATILITY * (f64::from(step_minutes) / 1_440.0).sqrt();
    let drift = noise(&mut rng, step_volatility / 4.0);

    let step = Duration::minutes(i64::from(step_minutes));
    let end = now.duration_trunc(Duration::minutes(1)).unwrap_or(now);
    let start = end - step * (count as i32 - 1);

    let mut close = base_price(ticker);
    let mut points = Vec::with_capacity(count as usize);
    for i in 0..count {
        let open = close;
        close = (open * (1.0 + drift + noise(&mut rng, step_volatility))).max(0.01);
        let wick = open.max(close) * rng.random_range(0.0..step_volatility.max(0.001));
        let tail = open.min(close) * rng.random_range(0.0..step_volatility.max(0.001));
        points.push(Candle {
            timestamp: start + step * i as i32,
            open: round2(open),
            high: round2(open.max(close) + wick),
            low: round2((open.min(close) - tail).max(0.01)),
            close: round2(close),
            volume: rng.random_range(100_000..10_000_000),
        });
    }

    TimeSeries {
        period: period.to_string(),
        interval: interval.to_string(),
        points,
    }
}

/// The next `n` Friday closes (20:00 UTC) after `now`.
fn upcoming_fridays(now: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    let mut day = now.date_naive() + Duration::days(1);
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        if day.weekday() == Weekday::Fri {
            if let Some(t) = day.and_hms_opt(20, 0, 0) {
                out.push(t.and_utc());
            }
        }
        day += Duration::days(1);
    }
    out
}

/// A strike ladder around the mock underlying price with heuristic premiums.
pub fn mock_options_chain(ticker: &str, expiration: Option<i64>, now: DateTime<Utc>) -> OptionsChain {
    let mut rng = rng_for(&["options", ticker]);
    let underlying = base_price(ticker);
    let expirations = upcoming_fridays(now, 4);
    let chosen = expiration
        .and_then(|e| DateTime::from_timestamp(e, 0))
        .filter(|e| *e > now)
        .unwrap_or(expirations[0]);

    let years = ((chosen - now).num_hours().max(1) as f64 / 24.0 / 365.0).max(1.0 / 365.0);
    let base_iv = rng.random_range(0.18..0.55);
    let increment = strike_increment(underlying);
    let atm = (underlying / increment).round() * increment;
    let code = chosen.format("%y%m%d");

    let mut calls = Vec::new();
    let mut puts = Vec::new();
    for k in -5i32..=5 {
        let strike = atm + f64::from(k) * increment;
        if strike <= 0.0 {
            continue;
        }
        let moneyness = (strike / underlying).ln();
        let iv = base_iv + 0.5 * moneyness * moneyness;
        let time_value = underlying * iv * years.sqrt() * 0.4 * (-moneyness.abs() * 4.0).exp();
        for is_call in [true, false] {
            let intrinsic = if is_call {
                (underlying - strike).max(0.0)
            } else {
                (strike - underlying).max(0.0)
            };
            let mid = (intrinsic + time_value).max(0.01);
            let spread = (mid * 0.04).max(0.01);
            let contract = OptionContract {
                contract_symbol: format!(
                    "{ticker}{code}{}{:08}",
                    if is_call { 'C' } else { 'P' },
                    (strike * 1000.0).round() as u64
                ),
                strike: to_decimal(strike),
                last_price: to_decimal(round2(mid)),
                bid: to_decimal(round2((mid - spread / 2.0).max(0.0))),
                ask: to_decimal(round2(mid + spread / 2.0)),
                volume: rng.random_range(0..5_000),
                open_interest: rng.random_range(0..50_000),
                implied_volatility: (iv * 10_000.0).round() / 10_000.0,
                in_the_money: intrinsic > 0.0,
            };
            if is_call {
                calls.push(contract);
            } else {
                puts.push(contract);
            }
        }
    }

    OptionsChain {
        expiration: chosen,
        expirations,
        underlying_price: to_decimal(underlying),
        calls,
        puts,
    }
}

fn strike_increment(price: f64) -> f64 {
    match price {
        p if p < 25.0 => 0.5,
        p if p < 100.0 => 1.0,
        p if p < 250.0 => 2.5,
        _ => 5.0,
    }
}

const HEADLINES: &[(&str, &str)] = &[
    (
        "{t} shares move as analysts revisit price targets",
        "Several brokerages updated their outlook on {t} following recent trading activity.",
    ),
    (
        "What to watch in {t} ahead of earnings",
        "Investors are focused on margins and guidance as {t} prepares to report.",
    ),
    (
        "{t} options activity points to elevated volatility",
        "Traders positioned for a larger than usual move in {t} over the coming weeks.",
    ),
    (
        "Institutional holders adjust {t} positions",
        "Quarterly filings show mixed positioning among large funds in {t}.",
    ),
    (
        "{t} trades in line with broader market",
        "Sector peers and the major indexes set the tone for {t} during the session.",
    ),
    (
        "Sector rotation puts {t} in focus",
        "Money managers weigh growth against value as rotation continues, with {t} among names in play.",
    ),
];

const PUBLISHERS: &[&str] = &["MarketWire", "Daily Ticker", "Street Journal", "Finance Desk"];

/// Template headlines for `ticker` (or the market as a whole), newest first.
pub fn mock_news(ticker: Option<&str>, limit: usize, now: DateTime<Utc>) -> Vec<NewsItem> {
    let subject = ticker.unwrap_or("The market");
    let mut rng = rng_for(&["news", ticker.unwrap_or("")]);
    let count = limit.min(HEADLINES.len());

    let mut published = now;
    (0..count)
        .map(|i| {
            let (title, summary) = HEADLINES[i];
            published -= Duration::minutes(rng.random_range(20..240));
            NewsItem {
                title: title.replace("{t}", subject),
                summary: summary.replace("{t}", subject),
                url: format!(
                    "https://example.com/news/{}/{i}",
                    ticker.unwrap_or("market").to_ascii_lowercase()
                ),
                publisher: PUBLISHERS[rng.random_range(0..PUBLISHERS.len())].to_string(),
                published_at: published,
                tickers: ticker.map(|t| vec![t.to_string()]).unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 15, 30, 0).unwrap()
    }

    #[test]
    fn base_price_is_stable_and_in_range() {
        let a = base_price("AAPL");
        assert_eq!(a, base_price("AAPL"));
        assert!((20.0..500.0).contains(&a));
        assert_ne!(seed(&["AB", "C"]), seed(&["A", "BC"]));
    }

    #[test]
    fn quote_is_consistent() {
        let q = mock_quote("MSFT");
        assert_eq!(q.symbol, "MSFT");
        assert!(q.day_high >= q.day_low);
        assert!(q.day_high >= q.price);
        assert!(q.day_low <= q.price);
        assert_eq!(q.change, q.price - q.previous_close);
    }

    #[test]
    fn series_is_deterministic_and_ordered() {
        let a = mock_time_series("TSLA", "1mo", "1d", fixed_now());
        let b = mock_time_series("TSLA", "1mo", "1d", fixed_now());
        assert_eq!(a, b);
        assert_eq!(a.points.len(), 30);
        assert!(a.points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(a.points.last().unwrap().timestamp, fixed_now());
        assert!(a.points.iter().all(|c| c.high >= c.low && c.low > 0.0));
    }

    #[test]
    fn series_point_count_is_capped() {
        let s = mock_time_series("SPY", "max", "1m", fixed_now());
        assert_eq!(s.points.len(), MAX_POINTS as usize);

        let s = mock_time_series("SPY", "1d", "1mo", fixed_now());
        assert_eq!(s.points.len(), 2);
    }

    #[test]
    fn options_chain_has_ladder() {
        let chain = mock_options_chain("NVDA", None, fixed_now());
        assert_eq!(chain.expirations.len(), 4);
        assert_eq!(chain.expiration, chain.expirations[0]);
        assert!(chain.expirations.iter().all(|e| e.weekday() == Weekday::Fri));
        assert_eq!(chain.calls.len(), chain.puts.len());
        assert!(!chain.calls.is_empty());
        assert!(chain.calls.iter().all(|c| c.ask >= c.bid));
        assert!(chain.calls[0].contract_symbol.starts_with("NVDA"));
    }

    #[test]
    fn options_chain_honours_future_expiration() {
        let requested = Utc.with_ymd_and_hms(2024, 4, 19, 20, 0, 0).unwrap();
        let chain = mock_options_chain("NVDA", Some(requested.timestamp()), fixed_now());
        assert_eq!(chain.expiration, requested);

        let past = Utc.with_ymd_and_hms(2023, 1, 6, 20, 0, 0).unwrap();
        let chain = mock_options_chain("NVDA", Some(past.timestamp()), fixed_now());
        assert_eq!(chain.expiration, chain.expirations[0]);
    }

    #[test]
    fn news_respects_limit_and_subject() {
        let items = mock_news(Some("AMD"), 3, fixed_now());
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|n| n.title.contains("AMD")));
        assert!(items.windows(2).all(|w| w[0].published_at > w[1].published_at));

        let general = mock_news(None, 50, fixed_now());
        assert_eq!(general.len(), HEADLINES.len());
        assert!(general.iter().all(|n| n.tickers.is_empty()));
    }
}
