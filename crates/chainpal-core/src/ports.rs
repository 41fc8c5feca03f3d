use async_trait::async_trait;

use crate::{session::WalletRecord, Result};

/// Conversational backend for free-form text.
///
/// Implementations never fail: transport or parse problems are turned into a
/// fixed apology text by the adapter.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(&self, prompt: &str) -> String;
}

/// Spot-price lookup in USD.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// `Ok(None)` when the asset is unknown to the provider.
    async fn usd_price(&self, asset_id: &str) -> Result<Option<f64>>;
}

/// Generator of fresh throwaway wallets.
pub trait WalletGenerator: Send + Sync {
    fn generate(&self) -> Result<WalletRecord>;
}
