use marketdesk_models::agent_message::{AgentInput, AgentType};

/// Shape every agent must reply with. Agent-specific fields are added under
/// `details`.
fn response_schema(details: serde_json::Value) -> String {
    let example = serde_json::json!({
        "summary": "<two or three sentence conclusion>",
        "signal": "bullish | bearish | neutral",
        "confidence": 0.65,
        "keyPoints": ["<observation backed by the input data>"],
        "risks": ["<what would invalidate the view>"],
        "details": details,
    });
    serde_json::to_string_pretty(&example).unwrap_or_default()
}

fn input_description(input: AgentInput) -> &'static str {
    match input {
        AgentInput::MarketData => {
            "- `marketData` → latest quote: `price`, `change`, `changePercent`, `previousClose`, \
             `open`, `dayHigh`, `dayLow`, `volume`, `currency`, `marketTime`\n"
        }
        AgentInput::TimeSeries => {
            "- `timeSeries` → `{period, interval, points: [{timestamp, open, high, low, close, volume}]}`, \
             oldest first\n"
        }
        AgentInput::TechnicalInsights => {
            "- `technicalInsights` → precomputed indicators: `sma20`, `sma50`, `ema12`, `ema26`, \
             `macd {macd, signal, histogram}`, `rsi14`, `bollinger {upper, middle, lower, percentB}`, \
             `volatility` (annualized), `support`, `resistance`, `trend`, `signals[]`. \
             Indicators without enough history are null.\n"
        }
        AgentInput::OptionsData => {
            "- `optionsData` → nearest expiration chain: `expiration`, `expirations[]`, \
             `underlyingPrice`, `calls[]`/`puts[]` with `strike`, `lastPrice`, `bid`, `ask`, \
             `volume`, `openInterest`, `impliedVolatility`, `inTheMoney`\n"
        }
        AgentInput::News => {
            "- `news` → recent articles: `title`, `summary`, `publisher`, `publishedAt`, `tickers[]`\n"
        }
    }
}

fn data_format(agent: AgentType) -> String {
    let mut section = String::from(
        "## DATA FORMAT\n\n\
         The user message is a JSON `AgentRequest` with `agentType`, `ticker`, `period` and:\n",
    );
    for input in agent.inputs() {
        section.push_str(input_description(*input));
    }
    section.push_str(
        "- `previousAnalyses` (optional) → `[{agent, analysis}]` from agents that ran earlier \
         in the same session. Build on them; call out disagreements explicitly.\n",
    );
    section
}

fn compose(agent: AgentType, role: &str, rules: &str, details: serde_json::Value) -> String {
    format!(
        "You are the {agent} agent in marketdesk, a market research dashboard. {role}\n\n\
         {data}\n\
         ## INTERPRETATION RULES\n\n\
         {rules}\n\
         - Base every statement on the supplied data; never invent prices or events.\n\
         - `confidence` is a number in [0, 1]. Lower it when inputs are thin or conflicting.\n\n\
         ## RESPONSE FORMAT\n\n\
         Reply with a single JSON object and nothing else:\n\n{schema}\n",
        data = data_format(agent),
        schema = response_schema(details),
    )
}

pub fn technical_analyst_prompt() -> String {
    compose(
        AgentType::TechnicalAnalyst,
        "Judge price action and momentum for the requested period.",
        "- RSI < 30 is oversold, RSI > 70 is overbought; 30-70 is neutral.\n\
         - Price above SMA20 and SMA50 with EMA12 > EMA26 supports an uptrend.\n\
         - MACD above its signal line with a growing histogram confirms momentum.\n\
         - %B below 0 or above 1 marks a close outside the Bollinger Bands.\n\
         - Treat `support` and `resistance` as the nearest levels to watch.",
        serde_json::json!({
            "trend": "uptrend | downtrend | sideways",
            "support": 0.0,
            "resistance": 0.0,
            "momentum": "<short description>"
        }),
    )
}

pub fn fundamental_analyst_prompt() -> String {
    compose(
        AgentType::FundamentalAnalyst,
        "Assess the company behind the ticker from its quote and your general knowledge of its \
         business, flagging anything that may be out of date.",
        "- Relate the current price and day range to the previous close.\n\
         - Comment on valuation only in relative terms; no specific ratios are supplied.\n\
         - Separate facts from the quote from background knowledge.",
        serde_json::json!({
            "valuation": "undervalued | fair | overvalued",
            "businessQuality": "<short description>",
            "catalysts": ["<upcoming event>"]
        }),
    )
}

pub fn sentiment_analyst_prompt() -> String {
    compose(
        AgentType::SentimentAnalyst,
        "Gauge market sentiment from recent news flow.",
        "- Weight recent articles more heavily than older ones.\n\
         - Headlines naming the ticker directly outweigh general market stories.\n\
         - Note when the price move contradicts the tone of the news.",
        serde_json::json!({
            "sentimentScore": 0.0,
            "headlineTone": "positive | negative | mixed",
            "notableHeadlines": ["<title>"]
        }),
    )
}

pub fn options_analyst_prompt() -> String {
    compose(
        AgentType::OptionsAnalyst,
        "Read positioning and implied volatility from the options chain.",
        "- Compare call and put open interest near the money for a put/call skew.\n\
         - Compare implied volatility with the realized `volatility` from the insights.\n\
         - Strikes with outsized open interest often act as magnets into expiration.",
        serde_json::json!({
            "putCallRatio": 0.0,
            "impliedVsRealized": "rich | cheap | in line",
            "keyStrikes": [0.0],
            "strategyIdea": "<one sentence>"
        }),
    )
}

pub fn risk_manager_prompt() -> String {
    compose(
        AgentType::RiskManager,
        "Quantify downside risk and suggest position limits.",
        "- Annualized volatility above 40% is high; below 15% is low.\n\
         - Use the distance to `support` as the first downside reference.\n\
         - Elevated put implied volatility signals demand for protection.\n\
         - When earlier analyses are present, stress-test their conclusions.",
        serde_json::json!({
            "riskLevel": "low | medium | high",
            "maxPositionPercent": 0.0,
            "stopLoss": 0.0,
            "hedges": ["<hedge idea>"]
        }),
    )
}

pub fn portfolio_manager_prompt() -> String {
    compose(
        AgentType::PortfolioManager,
        "Make the final call, weighing every earlier analysis you are given.",
        "- Resolve disagreements between earlier analyses and say which view wins and why.\n\
         - Without earlier analyses, decide from the quote and indicators alone.\n\
         - Size the position conservatively when confidence is below 0.5.",
        serde_json::json!({
            "action": "buy | sell | hold",
            "positionSizePercent": 0.0,
            "timeHorizon": "<e.g. 2-4 weeks>",
            "rationale": "<short description>"
        }),
    )
}

/// Get the system prompt for an agent type.
pub fn system_prompt(agent: AgentType) -> String {
    match agent {
        AgentType::TechnicalAnalyst => technical_analyst_prompt(),
        AgentType::FundamentalAnalyst => fundamental_analyst_prompt(),
        AgentType::SentimentAnalyst => sentiment_analyst_prompt(),
        AgentType::OptionsAnalyst => options_analyst_prompt(),
        AgentType::RiskManager => risk_manager_prompt(),
        AgentType::PortfolioManager => portfolio_manager_prompt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_agent_has_all_sections() {
        for agent in AgentType::ALL {
            let prompt = system_prompt(agent);
            assert!(prompt.contains(agent.as_str()), "{agent} not named");
            for section in ["DATA FORMAT", "INTERPRETATION RULES", "RESPONSE FORMAT"] {
                assert!(prompt.contains(section), "Missing {section} in {agent}");
            }
            assert!(prompt.contains("\"keyPoints\""));
        }
    }

    #[test]
    fn data_format_lists_only_the_agents_inputs() {
        let prompt = fundamental_analyst_prompt();
        assert!(prompt.contains("`marketData`"));
        assert!(!prompt.contains("`optionsData`"));

        let prompt = options_analyst_prompt();
        assert!(prompt.contains("`optionsData`"));
        assert!(prompt.contains("`technicalInsights`"));
        assert!(!prompt.contains("`news`"));
    }

    #[test]
    fn technical_prompt_contains_signal_rules() {
        let prompt = technical_analyst_prompt();
        assert!(prompt.contains("RSI < 30"));
        assert!(prompt.contains("MACD"));
        assert!(prompt.contains("Bollinger"));
    }

    #[test]
    fn portfolio_manager_weighs_previous_analyses() {
        let prompt = portfolio_manager_prompt();
        assert!(prompt.contains("previousAnalyses"));
        assert!(prompt.contains("buy | sell | hold"));
    }
}
