//! OpenAI-compatible chat completion adapter, plus the price lookup used by
//! its `get_crypto_price` tool.

pub mod assistant;
pub mod client;
pub mod price;

pub use assistant::ChatCompletionAssistant;
pub use client::OpenAiClient;
pub use price::CoinGeckoClient;
