use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream {service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Upstream returned no data for {0}")]
    NoData(String),

    #[error("Malformed upstream payload: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
