//! Selectable chains. Purely presentational: the choice is confirmed, not stored.

use crate::messaging::types::{InlineButton, InlineKeyboard};

pub const CHAIN_CALLBACK_PREFIX: &str = "chain:";

/// Chain keys and display names, in keyboard order.
pub const CHAINS: &[(&str, &str)] = &[
    ("ethereum", "Ethereum"),
    ("polygon", "Polygon"),
    ("linea", "Linea"),
    ("airdao", "AirDAO"),
];

pub fn display_name(key: &str) -> Option<&'static str> {
    CHAINS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

/// One button per chain, callback data `chain:<key>`.
pub fn chain_keyboard() -> InlineKeyboard {
    InlineKeyboard::one_per_row(
        CHAINS
            .iter()
            .map(|(key, name)| InlineButton::callback(*name, format!("{CHAIN_CALLBACK_PREFIX}{key}"))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::types::ButtonAction;

    #[test]
    fn looks_up_display_names() {
        assert_eq!(display_name("polygon"), Some("Polygon"));
        assert_eq!(display_name("airdao"), Some("AirDAO"));
        assert_eq!(display_name("Polygon"), None);
        assert_eq!(display_name("solana"), None);
    }

    #[test]
    fn keyboard_has_one_row_per_chain() {
        let kb = chain_keyboard();
        assert_eq!(kb.rows.len(), CHAINS.len());
        assert!(kb.rows.iter().all(|r| r.len() == 1));
        assert_eq!(kb.rows[0][0].label, "Ethereum");
        assert_eq!(
            kb.rows[3][0].action,
            ButtonAction::Callback("chain:airdao".to_string())
        );
    }
}
