use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;

use chainpal_core::{errors::Error, ports::PriceOracle, Result};

/// CoinGecko `simple/price` lookup, quoted in USD.
#[derive(Clone, Debug)]
pub struct CoinGeckoClient {
    base_url: String,
    http: reqwest::Client,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("price client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

/// CoinGecko ids are lower-case and dash-separated (`shiba-inu`).
fn asset_id(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

#[async_trait]
impl PriceOracle for CoinGeckoClient {
    async fn usd_price(&self, asset: &str) -> Result<Option<f64>> {
        let id = asset_id(asset);
        if id.is_empty() {
            return Ok(None);
        }

        let resp = self
            .http
            .get(format!("{}/simple/price", self.base_url))
            .query(&[("ids", id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await
            .map_err(|e| Error::External(format!("price request error: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::External(format!(
                "price lookup failed: {}",
                resp.status()
            )));
        }

        let prices: HashMap<String, HashMap<String, f64>> = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("price json error: {e}")))?;

        Ok(prices.get(&id).and_then(|quotes| quotes.get("usd")).copied())
    }
}
