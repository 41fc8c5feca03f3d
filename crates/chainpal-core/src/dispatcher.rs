//! Update dispatcher: classifies one inbound update and runs the matching branch.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    chains::{chain_keyboard, display_name},
    commands::{CallbackAction, Command, DELETE_WALLET_DATA, SHOW_KEY_DATA},
    config::Features,
    domain::ChatId,
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, IncomingUpdate, InlineButton, InlineKeyboard, TextMessage},
    },
    ports::{Assistant, WalletGenerator},
    session::{ChatLocks, SessionStore},
    Result,
};

pub const WELCOME_TEXT: &str = "Welcome to the AI-powered bot! How can I help you today?";
pub const CHOOSE_CHAIN_TEXT: &str = "Please choose a chain:";
pub const NO_WALLET_TEXT: &str = "No wallet found. Send /start to create one.";
pub const WALLET_DELETED_TEXT: &str = "Your wallet has been deleted.";
pub const MINI_APP_TEXT: &str = "Open the mini app:";
pub const MINI_APP_MISSING_TEXT: &str = "Mini app is not configured.";
pub const FAILURE_TEXT: &str = "Sorry, something went wrong. Please try again later.";

/// Routes updates to command handlers, wallet actions, or the assistant.
pub struct Dispatcher {
    features: Features,
    mini_app_url: Option<String>,
    messenger: Arc<dyn MessagingPort>,
    assistant: Arc<dyn Assistant>,
    wallets: Arc<dyn WalletGenerator>,
    sessions: Arc<dyn SessionStore>,
    chat_locks: ChatLocks,
}

impl Dispatcher {
    pub fn new(
        features: Features,
        messenger: Arc<dyn MessagingPort>,
        assistant: Arc<dyn Assistant>,
        wallets: Arc<dyn WalletGenerator>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            features,
            mini_app_url: None,
            messenger,
            assistant,
            wallets,
            sessions,
            chat_locks: ChatLocks::default(),
        }
    }

    pub fn with_mini_app_url(mut self, url: Option<String>) -> Self {
        self.mini_app_url = url;
        self
    }

    /// Handle one update.
    ///
    /// Wallet operations for one chat run one at a time; assistant traffic and
    /// chain selection never wait on them. Adapter failures become user-facing
    /// messages; only session-store failures are returned.
    pub async fn handle(&self, update: IncomingUpdate) -> Result<()> {
        match update {
            IncomingUpdate::Text(msg) => self.handle_text(msg).await,
            IncomingUpdate::Callback(q) => self.handle_callback(q).await,
        }
    }

    async fn handle_text(&self, msg: TextMessage) -> Result<()> {
        let chat_id = msg.chat_id;
        match Command::parse(&msg.text) {
            Command::Start => self.start(chat_id).await,
            Command::SetChain if self.features.chain_keyboard => {
                self.send(chat_id, CHOOSE_CHAIN_TEXT, Some(chain_keyboard()))
                    .await;
                Ok(())
            }
            Command::Dock => {
                match &self.mini_app_url {
                    Some(url) => {
                        let keyboard = InlineKeyboard::one_per_row([InlineButton::web_app(
                            "Open mini app",
                            url.clone(),
                        )]);
                        self.send(chat_id, MINI_APP_TEXT, Some(keyboard)).await;
                    }
                    None => self.send(chat_id, MINI_APP_MISSING_TEXT, None).await,
                }
                Ok(())
            }
            Command::SetChain => {
                self.forward_to_assistant(chat_id, &msg.text).await;
                Ok(())
            }
            Command::Chat(text) => {
                self.forward_to_assistant(chat_id, &text).await;
                Ok(())
            }
        }
    }

    async fn start(&self, chat_id: ChatId) -> Result<()> {
        if !self.features.wallets {
            self.send(chat_id, WELCOME_TEXT, None).await;
            return Ok(());
        }

        let _guard = self.chat_locks.lock_chat(chat_id).await;
        let record = match self.wallets.generate() {
            Ok(r) => r,
            Err(e) => {
                error!(%chat_id, error = %e, "wallet generation failed");
                self.send(chat_id, FAILURE_TEXT, None).await;
                return Ok(());
            }
        };

        let previous = match self.sessions.put(chat_id, record.clone()).await {
            Ok(p) => p,
            Err(e) => return Err(self.store_failed(chat_id, e).await),
        };
        if previous.is_some() {
            debug!(%chat_id, "replaced previous wallet");
        }
        info!(%chat_id, address = %record.address, "wallet created");

        let mut text = format!(
            "Welcome! Your new wallet has been created.\n\nAddress: {}",
            record.address
        );
        if self.features.reveal_key_on_start {
            text.push_str(&format!(
                "\nPrivate key: {}\n\nKeep your private key secret!",
                record.private_key
            ));
        }

        let keyboard = InlineKeyboard::one_per_row([
            InlineButton::callback("Show private key", SHOW_KEY_DATA),
            InlineButton::callback("Delete wallet", DELETE_WALLET_DATA),
        ]);
        self.send(chat_id, &text, Some(keyboard)).await;
        Ok(())
    }

    async fn handle_callback(&self, q: CallbackQuery) -> Result<()> {
        let result = match q.chat_id {
            Some(chat_id) => self.run_callback_action(chat_id, &q.data).await,
            None => {
                debug!(callback_id = %q.callback_id, "callback without chat; acknowledging only");
                Ok(())
            }
        };

        // Exactly one acknowledgment per callback, whatever the outcome.
        if let Err(e) = self.messenger.answer_callback_query(&q.callback_id).await {
            warn!(callback_id = %q.callback_id, error = %e, "failed to answer callback query");
        }

        result
    }

    async fn run_callback_action(&self, chat_id: ChatId, data: &str) -> Result<()> {
        match CallbackAction::parse(data) {
            CallbackAction::ShowKey => {
                let _guard = self.chat_locks.lock_chat(chat_id).await;
                let found = match self.sessions.get(chat_id).await {
                    Ok(found) => found,
                    Err(e) => return Err(self.store_failed(chat_id, e).await),
                };
                match found {
                    Some(record) => {
                        let text = format!(
                            "Your private key: {}\n\nNever share it with anyone.",
                            record.private_key
                        );
                        self.send(chat_id, &text, None).await;
                    }
                    None => self.send(chat_id, NO_WALLET_TEXT, None).await,
                }
            }
            CallbackAction::DeleteWallet => {
                let _guard = self.chat_locks.lock_chat(chat_id).await;
                let removed = match self.sessions.delete(chat_id).await {
                    Ok(removed) => removed,
                    Err(e) => return Err(self.store_failed(chat_id, e).await),
                };
                match removed {
                    Some(_) => {
                        info!(%chat_id, "wallet deleted");
                        self.send(chat_id, WALLET_DELETED_TEXT, None).await;
                    }
                    None => self.send(chat_id, NO_WALLET_TEXT, None).await,
                }
            }
            CallbackAction::SelectChain(key) => {
                let text = match display_name(&key) {
                    Some(name) => format!("Chain set to: {name}"),
                    None => format!("Unknown chain: {key}"),
                };
                self.send(chat_id, &text, None).await;
            }
            CallbackAction::Unknown(data) => {
                debug!(%chat_id, %data, "ignoring unknown callback data");
            }
        }
        Ok(())
    }

    async fn forward_to_assistant(&self, chat_id: ChatId, text: &str) {
        let reply = self.assistant.reply(text).await;
        let reply = if reply.trim().is_empty() {
            FAILURE_TEXT.to_string()
        } else {
            reply
        };
        self.send(chat_id, &reply, None).await;
    }

    /// Tell the user and hand the store error back to the caller.
    async fn store_failed(&self, chat_id: ChatId, e: Error) -> Error {
        error!(%chat_id, error = %e, "session store failed");
        self.send(chat_id, FAILURE_TEXT, None).await;
        e
    }

    /// Escape and send; failures are logged and the user gets no reply.
    async fn send(&self, chat_id: ChatId, text: &str, keyboard: Option<InlineKeyboard>) {
        let msg = self.features.escape_mode.render(chat_id, text, keyboard);
        if let Err(e) = self.messenger.send_message(&msg).await {
            error!(%chat_id, error = %e, "failed to send message");
        }
    }
}
