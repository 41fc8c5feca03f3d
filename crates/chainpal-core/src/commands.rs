//! Classification of inbound text and callback data.

use crate::chains::CHAIN_CALLBACK_PREFIX;

pub const SHOW_KEY_DATA: &str = "show_key";
pub const DELETE_WALLET_DATA: &str = "delete_wallet";

/// Recognized text commands; anything else is forwarded to the assistant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    SetChain,
    Dock,
    Chat(String),
}

impl Command {
    /// Case-insensitive exact match on the whole message text.
    pub fn parse(text: &str) -> Self {
        match text.to_lowercase().as_str() {
            "/start" => Self::Start,
            "/setchain" => Self::SetChain,
            "/dock" => Self::Dock,
            _ => Self::Chat(text.to_string()),
        }
    }
}

/// Actions encoded in inline-button callback data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    ShowKey,
    DeleteWallet,
    SelectChain(String),
    Unknown(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        if data == SHOW_KEY_DATA {
            return Self::ShowKey;
        }
        if data == DELETE_WALLET_DATA {
            return Self::DeleteWallet;
        }
        if let Some(key) = data.strip_prefix(CHAIN_CALLBACK_PREFIX) {
            // `chain:<key>[:...]` selects `<key>`.
            let key = key.split(':').next().unwrap_or_default();
            return Self::SelectChain(key.to_string());
        }
        Self::Unknown(data.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_match_case_insensitively() {
        assert_eq!(Command::parse("/START"), Command::Start);
        assert_eq!(Command::parse("/Start"), Command::Start);
        assert_eq!(Command::parse("/setChain"), Command::SetChain);
        assert_eq!(Command::parse("/dock"), Command::Dock);
    }

    #[test]
    fn commands_require_exact_text() {
        assert_eq!(
            Command::parse("/start now"),
            Command::Chat("/start now".to_string())
        );
        assert_eq!(Command::parse(" /start"), Command::Chat(" /start".to_string()));
        assert_eq!(
            Command::parse("what is /start?"),
            Command::Chat("what is /start?".to_string())
        );
    }

    #[test]
    fn parses_callback_data() {
        assert_eq!(CallbackAction::parse("show_key"), CallbackAction::ShowKey);
        assert_eq!(
            CallbackAction::parse("delete_wallet"),
            CallbackAction::DeleteWallet
        );
        assert_eq!(
            CallbackAction::parse("chain:polygon"),
            CallbackAction::SelectChain("polygon".to_string())
        );
        assert_eq!(
            CallbackAction::parse("chain:"),
            CallbackAction::SelectChain(String::new())
        );
        assert_eq!(
            CallbackAction::parse("show_key_now"),
            CallbackAction::Unknown("show_key_now".to_string())
        );
    }
}
