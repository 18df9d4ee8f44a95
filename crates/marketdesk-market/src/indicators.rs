use marketdesk_models::market::{BollingerBands, MacdValue, TechnicalInsights, TimeSeries, Trend};

/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average series, seeded with the SMA of the first `period` values.
/// The returned series starts at index `period - 1` of the input.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(current);
    for v in &values[period..] {
        current = v * k + current * (1.0 - k);
        out.push(current);
    }
    out
}

pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    ema_series(values, period).last().copied()
}

/// MACD(fast, slow, signal) at the last bar.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdValue> {
    if fast == 0 || fast >= slow {
        return None;
    }
    let fast_series = ema_series(values, fast);
    let slow_series = ema_series(values, slow);
    if slow_series.is_empty() {
        return None;
    }

    // Align: slow series starts (slow - fast) bars later than fast series.
    let offset = slow - fast;
    let line: Vec<f64> = slow_series
        .iter()
        .enumerate()
        .map(|(i, s)| fast_series[i + offset] - s)
        .collect();

    let signal_series = ema_series(&line, signal);
    let signal_value = *signal_series.last()?;
    let macd_value = *line.last()?;
    Some(MacdValue {
        macd: macd_value,
        signal: signal_value,
        histogram: macd_value - signal_value,
    })
}

/// Wilder's RSI at the last bar.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() <= period {
        return None;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let mut avg_gain = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;

    for c in &changes[period..] {
        avg_gain = (avg_gain * (period as f64 - 1.0) + c.max(0.0)) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + (-c).max(0.0)) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

pub fn bollinger(values: &[f64], period: usize, width: f64) -> Option<BollingerBands> {
    let middle = sma(values, period)?;
    let window = &values[values.len() - period..];
    let variance = window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();
    let upper = middle + width * std_dev;
    let lower = middle - width * std_dev;
    let last = *values.last()?;
    let percent_b = if upper > lower {
        (last - lower) / (upper - lower)
    } else {
        0.5
    };

    Some(BollingerBands {
        upper,
        middle,
        lower,
        percent_b,
    })
}

/// Bars per year for annualizing volatility at the given interval.
fn periods_per_year(interval: &str) -> f64 {
    match interval {
        "1d" => 252.0,
        "5d" | "1wk" => 52.0,
        "1mo" => 12.0,
        "3mo" => 4.0,
        other => {
            let minutes = f64::from(marketdesk_models::params::interval_minutes(other));
            252.0 * 390.0 / minutes
        }
    }
}

/// Annualized standard deviation of log returns.
pub fn annualized_volatility(values: &[f64], interval: &str) -> Option<f64> {
    if values.len() < 3 || values.iter().any(|v| *v <= 0.0) {
        return None;
    }
    let returns: Vec<f64> = values.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() as f64 - 1.0);
    Some(variance.sqrt() * periods_per_year(interval).sqrt())
}

/// Summarize a series into the indicator set handed to the dashboard and agents.
/// Returns `None` for an empty series.
pub fn technical_insights(series: &TimeSeries) -> Option<TechnicalInsights> {
    let closes = series.closes();
    let first = series.points.first()?;
    let last = series.points.last()?;

    let sma20 = sma(&closes, 20);
    let sma50 = sma(&closes, 50);
    let macd_value = macd(&closes, 12, 26, 9);
    let rsi14 = rsi(&closes, 14);
    let bands = bollinger(&closes, 20, 2.0);
    let period_change_percent = if first.open > 0.0 {
        (last.close - first.open) / first.open * 100.0
    } else {
        0.0
    };

    let support = series
        .points
        .iter()
        .map(|c| c.low)
        .fold(f64::INFINITY, f64::min);
    let resistance = series
        .points
        .iter()
        .map(|c| c.high)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut score = 0i32;
    let mut signals = Vec::new();

    if let Some(s) = sma20 {
        if last.close > s {
            score += 1;
            signals.push("Price above 20-period SMA".to_string());
        } else {
            score -= 1;
            signals.push("Price below 20-period SMA".to_string());
        }
    }
    if let (Some(fast), Some(slow)) = (sma20, sma50) {
        if fast > slow {
            score += 1;
            signals.push("20-period SMA above 50-period SMA (golden cross regime)".to_string());
        } else {
            score -= 1;
            signals.push("20-period SMA below 50-period SMA (death cross regime)".to_string());
        }
    }
    if let Some(m) = &macd_value {
        if m.histogram > 0.0 {
            score += 1;
            signals.push("MACD above signal line".to_string());
        } else {
            score -= 1;
            signals.push("MACD below signal line".to_string());
        }
    }
    if period_change_percent > 2.0 {
        score += 1;
    } else if period_change_percent < -2.0 {
        score -= 1;
    }
    if let Some(r) = rsi14 {
        if r >= 70.0 {
            signals.push(format!("RSI {r:.1} overbought"));
        } else if r <= 30.0 {
            signals.push(format!("RSI {r:.1} oversold"));
        }
    }
    if let Some(b) = &bands {
        if b.percent_b > 1.0 {
            signals.push("Close above upper Bollinger band".to_string());
        } else if b.percent_b < 0.0 {
            signals.push("Close below lower Bollinger band".to_string());
        }
    }

    let trend = match score {
        s if s >= 2 => Trend::Bullish,
        s if s <= -2 => Trend::Bearish,
        _ => Trend::Neutral,
    };

    Some(TechnicalInsights {
        last_close: last.close,
        period_change_percent,
        sma20,
        sma50,
        ema12: ema(&closes, 12),
        ema26: ema(&closes, 26),
        macd: macd_value,
        rsi14,
        bollinger: bands,
        volatility: annualized_volatility(&closes, &series.interval),
        support,
        resistance,
        trend,
        signals,
    })
}
