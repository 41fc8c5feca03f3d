use crate::domain::ChatId;

/// Incoming update, already classified by the transport adapter.
///
/// Telegram-specific wire fields live in the Telegram adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IncomingUpdate {
    Text(TextMessage),
    Callback(CallbackQuery),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackQuery {
    /// Absent for presses on inline-mode messages; such presses are only acknowledged.
    pub chat_id: Option<ChatId>,
    pub callback_id: String,
    pub data: String,
}

/// Markup dialect of an outbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    MarkdownV2,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    /// Opaque data echoed back in a callback query.
    Callback(String),
    /// Mini-app URL opened inside the client.
    WebApp(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn web_app(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::WebApp(url.into()),
        }
    }
}

/// Inline keyboard as ordered rows of buttons.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: impl IntoIterator<Item = InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

/// A fully rendered reply, ready for the messenger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub keyboard: Option<InlineKeyboard>,
}
