//! Lenient decoding of Telegram webhook bodies.
//!
//! Only the fields the dispatcher needs are modeled; everything else in the
//! update is ignored.

use serde::Deserialize;

use chainpal_core::{
    domain::ChatId,
    messaging::types::{CallbackQuery as CoreCallback, IncomingUpdate, TextMessage},
};

#[derive(Debug, Default, Deserialize)]
pub struct Update {
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub data: Option<String>,
    pub message: Option<Message>,
}

impl Update {
    /// A text message wins over a callback query when both are present.
    pub fn into_incoming(self) -> Option<IncomingUpdate> {
        if let Some(Message {
            chat,
            text: Some(text),
        }) = self.message
        {
            return Some(IncomingUpdate::Text(TextMessage {
                chat_id: ChatId(chat.id),
                text,
            }));
        }

        let q = self.callback_query?;
        Some(IncomingUpdate::Callback(CoreCallback {
            chat_id: q.message.map(|m| ChatId(m.chat.id)),
            callback_id: q.id,
            data: q.data.unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> Option<IncomingUpdate> {
        serde_json::from_str::<Update>(body).unwrap().into_incoming()
    }

    #[test]
    fn decodes_text_message_ignoring_extra_fields() {
        let got = decode(
            r#"{"update_id":1,"message":{"message_id":7,"date":0,
                "from":{"id":5,"is_bot":false,"first_name":"A"},
                "chat":{"id":42,"type":"private"},"text":"/start"}}"#,
        );
        match got {
            Some(IncomingUpdate::Text(m)) => {
                assert_eq!(m.chat_id, ChatId(42));
                assert_eq!(m.text, "/start");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decodes_callback_with_and_without_message() {
        let got = decode(
            r#"{"callback_query":{"id":"cb1","data":"chain:linea",
                "message":{"chat":{"id":-100}}}}"#,
        );
        match got {
            Some(IncomingUpdate::Callback(q)) => {
                assert_eq!(q.chat_id, Some(ChatId(-100)));
                assert_eq!(q.callback_id, "cb1");
                assert_eq!(q.data, "chain:linea");
            }
            other => panic!("unexpected {other:?}"),
        }

        match decode(r#"{"callback_query":{"id":"cb2"}}"#) {
            Some(IncomingUpdate::Callback(q)) => {
                assert_eq!(q.chat_id, None);
                assert_eq!(q.data, "");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_text_message_falls_through_to_callback() {
        let got = decode(
            r#"{"message":{"chat":{"id":1},"sticker":{}},
                "callback_query":{"id":"cb","data":"show_key"}}"#,
        );
        assert!(matches!(got, Some(IncomingUpdate::Callback(_))));
        assert!(decode(r#"{"message":{"chat":{"id":1}}}"#).is_none());
        assert!(decode(r#"{"edited_message":{}}"#).is_none());
    }
}
