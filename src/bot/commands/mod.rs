//! Discord command implementations organized by category.
//!
//! Every command is a thin prefix command that builds a [`Command`] from its
//! arguments and hands it to the core router together with where it came from.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Finance tracking commands
pub mod finance;

/// General utility commands
pub mod general;

/// Loan tracking commands
pub mod loan;

use super::{BotData, messenger::DiscordMessenger};
use crate::{
    core::router::{self, Command, Origin},
    errors::{Error, Result},
};
use std::sync::Arc;

/// Every command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        general::start(),
        loan::authorize(),
        loan::user_authorize(),
        loan::set(),
        loan::pay(),
        loan::status(),
        loan::history(),
        finance::fin_auth(),
        finance::fin_add_category(),
        finance::fin_categories(),
        finance::fin_set_budget(),
        finance::fin_add_expense(),
        finance::fin_analytics(),
        finance::fin_history(),
    ]
}

/// Routes `command` as issued by the author of `ctx` in its channel.
pub(crate) async fn run(ctx: poise::Context<'_, BotData, Error>, command: Command) -> Result<()> {
    let messenger = DiscordMessenger::new(Arc::clone(&ctx.serenity_context().http));
    let origin = Origin {
        chat_id: ctx.channel_id().get(),
        user_id: ctx.author().id.get(),
    };
    router::dispatch(&ctx.data().services(&messenger), origin, command).await;
    Ok(())
}
