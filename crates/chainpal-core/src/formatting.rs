//! Formatting utilities (Telegram MarkdownV2 escaping).

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::{
    domain::ChatId,
    messaging::types::{InlineKeyboard, OutboundMessage, ParseMode},
};

/// Characters Telegram MarkdownV2 requires to be escaped outside entities.
///
/// The backslash itself is not in the set, so escaping is not idempotent.
pub const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

const FENCE: [char; 3] = ['`', '`', '`'];

/// Escape text for Telegram MarkdownV2, keeping fenced code blocks and
/// `*` / `_` emphasis markers literal.
///
/// Single pass over two flags. The emphasis flag is a plain toggle on every
/// `*` or `_` outside a fence, so nested or unmatched markers are not tracked:
/// after an odd number of markers everything up to the next marker stays
/// unescaped.
pub fn escape_markdown_v2(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut in_code_block = false;
    let mut in_emphasis = false;

    let mut i = 0usize;
    while i < chars.len() {
        if chars[i..].starts_with(&FENCE) {
            in_code_block = !in_code_block;
            out.push_str("```");
            i += FENCE.len();
            continue;
        }

        let c = chars[i];
        if !in_code_block && (c == '*' || c == '_') {
            in_emphasis = !in_emphasis;
            out.push(c);
            i += 1;
            continue;
        }

        if !in_code_block && !in_emphasis && MARKDOWN_V2_RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
        i += 1;
    }

    out
}

/// Turn every run of two or more escaped hyphens back into bare hyphens.
///
/// Multi-dash separators (`---`, `a--b`) render badly once escaped.
pub fn collapse_escaped_dashes(text: &str) -> String {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    let re = RUNS.get_or_init(|| Regex::new(r"(?:\\-){2,}").expect("valid regex"));

    re.replace_all(text, |caps: &Captures<'_>| "-".repeat(caps[0].len() / 2))
        .into_owned()
}

/// How outbound text is prepared for the messaging API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EscapeMode {
    /// Text is sent untouched without a parse mode.
    Plain,
    MarkdownV2,
    /// MarkdownV2 escaping followed by [`collapse_escaped_dashes`].
    #[default]
    MarkdownV2CollapseDashes,
}

impl EscapeMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "plain" | "none" => Some(Self::Plain),
            "markdown_v2" | "markdownv2" => Some(Self::MarkdownV2),
            "markdown_v2_collapse_dashes" | "markdownv2_collapse_dashes" => {
                Some(Self::MarkdownV2CollapseDashes)
            }
            _ => None,
        }
    }

    pub fn escape(self, text: &str) -> String {
        match self {
            Self::Plain => text.to_string(),
            Self::MarkdownV2 => escape_markdown_v2(text),
            Self::MarkdownV2CollapseDashes => collapse_escaped_dashes(&escape_markdown_v2(text)),
        }
    }

    pub fn parse_mode(self) -> Option<ParseMode> {
        match self {
            Self::Plain => None,
            Self::MarkdownV2 | Self::MarkdownV2CollapseDashes => Some(ParseMode::MarkdownV2),
        }
    }

    /// Build the outbound message for `text`, escaped for this mode.
    pub fn render(
        self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> OutboundMessage {
        OutboundMessage {
            chat_id,
            text: self.escape(text),
            parse_mode: self.parse_mode(),
            keyboard,
        }
    }
}
