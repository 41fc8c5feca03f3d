use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use chainpal_core::{
    errors::Error,
    ports::{Assistant, PriceOracle},
    Result,
};

use crate::client::{ChatMessage, FunctionCall, OpenAiClient, ToolSpec};

pub const APOLOGY_TEXT: &str = "Sorry, I'm having trouble processing your request right now.";
pub const PRICE_TOOL_NAME: &str = "get_crypto_price";

#[derive(Debug, Deserialize)]
struct PriceArgs {
    crypto_name: String,
}

fn price_tool() -> ToolSpec {
    ToolSpec::function(
        PRICE_TOOL_NAME,
        "Get the current price of a cryptocurrency in USD",
        json!({
            "type": "object",
            "properties": {
                "crypto_name": {
                    "type": "string",
                    "description": "The name of the cryptocurrency, e.g. bitcoin or ethereum"
                }
            },
            "required": ["crypto_name"]
        }),
    )
}

/// [`Assistant`] backed by a chat completion endpoint.
///
/// With a price oracle attached, the model is offered `get_crypto_price` and a
/// call to it is answered with a formatted quote instead of the model text.
pub struct ChatCompletionAssistant {
    client: OpenAiClient,
    prices: Option<Arc<dyn PriceOracle>>,
}

impl ChatCompletionAssistant {
    pub fn plain(client: OpenAiClient) -> Self {
        Self {
            client,
            prices: None,
        }
    }

    pub fn with_price_tool(client: OpenAiClient, prices: Arc<dyn PriceOracle>) -> Self {
        Self {
            client,
            prices: Some(prices),
        }
    }

    async fn try_reply(&self, prompt: &str) -> Result<String> {
        let tools = self.prices.as_ref().map(|_| vec![price_tool()]);
        let resp = self
            .client
            .chat_completion(vec![ChatMessage::user(prompt)], tools)
            .await?;

        let message = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::External("chat completion returned no choices".to_string()))?;

        if let (Some(prices), Some(call)) = (&self.prices, message.requested_call()) {
            if call.name == PRICE_TOOL_NAME {
                return price_reply(prices.as_ref(), call).await;
            }
            warn!(tool = %call.name, "model requested an unknown tool");
        }

        message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::External("chat completion returned empty content".to_string()))
    }
}

async fn price_reply(prices: &dyn PriceOracle, call: &FunctionCall) -> Result<String> {
    let args: PriceArgs = serde_json::from_str(&call.arguments)?;
    let name = args.crypto_name.trim();
    debug!(asset = %name, "price tool call");

    Ok(match prices.usd_price(name).await? {
        Some(price) => format!("The current price of {name} is ${price}"),
        None => format!("Sorry, I couldn't find the price for {name}."),
    })
}

#[async_trait]
impl Assistant for ChatCompletionAssistant {
    async fn reply(&self, prompt: &str) -> String {
        match self.try_reply(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(model = %self.client.model(), error = %e, "assistant reply failed");
                APOLOGY_TEXT.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakePrices {
        asked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PriceOracle for FakePrices {
        async fn usd_price(&self, asset_id: &str) -> Result<Option<f64>> {
            self.asked.lock().unwrap().push(asset_id.to_string());
            Ok(match asset_id {
                "bitcoin" => Some(67123.45),
                "broken" => return Err(Error::External("price api down".to_string())),
                _ => None,
            })
        }
    }

    fn client(server: &mockito::ServerGuard) -> OpenAiClient {
        OpenAiClient::new(server.url(), "sk-test", "gpt-test", Duration::from_secs(5)).unwrap()
    }

    fn tool_call_body(arguments: &str) -> String {
        json!({
            "choices": [{
                "index": 0,
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_crypto_price", "arguments": arguments}
                    }]
                }
            }]
        })
        .to_string()
    }

    async fn mock_completion(server: &mut mockito::ServerGuard, body: String) -> mockito::Mock {
        server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn plain_mode_returns_top_choice_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-test",
                "messages": [{"role": "user", "content": "hi there"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"choices": [
                    {"message": {"role": "assistant", "content": "Hello!"}},
                    {"message": {"role": "assistant", "content": "Second"}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let assistant = ChatCompletionAssistant::plain(client(&server));
        assert_eq!(assistant.reply("hi there").await, "Hello!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn tool_call_returns_formatted_price() {
        let mut server = mockito::Server::new_async().await;
        let _mock =
            mock_completion(&mut server, tool_call_body(r#"{"crypto_name":"bitcoin"}"#)).await;

        let prices = Arc::new(FakePrices::default());
        let assistant = ChatCompletionAssistant::with_price_tool(client(&server), prices.clone());
        let reply = assistant.reply("how much is btc?").await;

        let amount = reply
            .strip_prefix("The current price of bitcoin is $")
            .expect("price sentence");
        assert!(amount.parse::<f64>().is_ok(), "{reply}");
        assert_eq!(prices.asked.lock().unwrap().clone(), vec!["bitcoin".to_string()]);
    }

    #[tokio::test]
    async fn tool_mode_advertises_price_function() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"tool_choice": "auto"})),
                Matcher::Regex(r#""name":"get_crypto_price""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"choices": [{"message": {"content": "No tool needed."}}]}).to_string())
            .create_async()
            .await;

        let assistant = ChatCompletionAssistant::with_price_tool(
            client(&server),
            Arc::new(FakePrices::default()),
        );
        assert_eq!(assistant.reply("hello").await, "No tool needed.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_asset_gets_not_found_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock =
            mock_completion(&mut server, tool_call_body(r#"{"crypto_name":"dogecake"}"#)).await;

        let assistant = ChatCompletionAssistant::with_price_tool(
            client(&server),
            Arc::new(FakePrices::default()),
        );
        assert_eq!(
            assistant.reply("price of dogecake").await,
            "Sorry, I couldn't find the price for dogecake."
        );
    }

    #[tokio::test]
    async fn failures_become_apology() {
        let mut server = mockito::Server::new_async().await;
        let _err = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;
        let assistant = ChatCompletionAssistant::plain(client(&server));
        assert_eq!(assistant.reply("hi").await, APOLOGY_TEXT);
    }

    #[tokio::test]
    async fn bad_tool_arguments_and_price_errors_become_apology() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_completion(&mut server, tool_call_body("not json")).await;
        let assistant = ChatCompletionAssistant::with_price_tool(
            client(&server),
            Arc::new(FakePrices::default()),
        );
        assert_eq!(assistant.reply("price?").await, APOLOGY_TEXT);

        let mut server = mockito::Server::new_async().await;
        let _mock =
            mock_completion(&mut server, tool_call_body(r#"{"crypto_name":"broken"}"#)).await;
        let assistant = ChatCompletionAssistant::with_price_tool(
            client(&server),
            Arc::new(FakePrices::default()),
        );
        assert_eq!(assistant.reply("price?").await, APOLOGY_TEXT);
    }

    #[tokio::test]
    async fn empty_choices_become_apology() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_completion(&mut server, json!({"choices": []}).to_string()).await;
        let assistant = ChatCompletionAssistant::plain(client(&server));
        assert_eq!(assistant.reply("hi").await, APOLOGY_TEXT);
    }
}
