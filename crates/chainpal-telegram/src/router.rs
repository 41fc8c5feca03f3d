use std::sync::Arc;

use teloxide::{dispatching::Dispatcher as TgDispatcher, dptree, prelude::*};
use tracing::{error, info, warn};

use chainpal_core::{
    dispatcher::Dispatcher,
    domain::ChatId,
    messaging::types::{CallbackQuery as CoreCallback, IncomingUpdate, TextMessage},
};

/// Long-polling transport; same dispatcher as the webhook, no public URL needed.
pub async fn run_polling(bot: Bot, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "bot started (polling)"),
        Err(e) => warn!(error = %e, "get_me failed"),
    }

    // A webhook registration blocks getUpdates.
    if let Err(e) = bot.delete_webhook().await {
        warn!(error = %e, "failed to delete webhook before polling");
    }

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(on_callback))
        .branch(Update::filter_message().endpoint(on_message));

    TgDispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn on_message(msg: Message, dispatcher: Arc<Dispatcher>) -> ResponseResult<()> {
    if let Some(update) = text_update(&msg) {
        if let Err(e) = dispatcher.handle(update).await {
            error!(chat_id = msg.chat.id.0, error = %e, "update handling failed");
        }
    }
    Ok(())
}

async fn on_callback(q: CallbackQuery, dispatcher: Arc<Dispatcher>) -> ResponseResult<()> {
    if let Err(e) = dispatcher.handle(callback_update(q)).await {
        error!(error = %e, "callback handling failed");
    }
    Ok(())
}

fn text_update(msg: &Message) -> Option<IncomingUpdate> {
    msg.text().map(|text| {
        IncomingUpdate::Text(TextMessage {
            chat_id: ChatId(msg.chat.id.0),
            text: text.to_string(),
        })
    })
}

fn callback_update(q: CallbackQuery) -> IncomingUpdate {
    IncomingUpdate::Callback(CoreCallback {
        chat_id: q.message.as_ref().map(|m| ChatId(m.chat.id.0)),
        callback_id: q.id,
        data: q.data.unwrap_or_default(),
    })
}
