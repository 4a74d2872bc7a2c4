//! `rdx fav`: manage the logged-in user's favorites.

use anyhow::Result;
use clap::{Args, Subcommand};
use futures::executor::block_on;
use rickdex_core::error::ErrorCode;
use rickdex_core::favorites::{Mutation, SkipReason};
use rickdex_core::model::{Record, RecordId};
use rickdex_core::source::PageSource;
use tracing::info;

use crate::context::{Context, Profile};
use crate::output::{self, render_success};
use crate::validate::{parse_record_id, validate_notes};

#[derive(Subcommand, Debug)]
pub enum FavCommand {
    /// Add a character to favorites.
    Add(AddArgs),
    /// Remove a character from favorites.
    #[command(alias = "remove")]
    Rm(IdArgs),
    /// Replace the notes on a favorite.
    Notes(NotesArgs),
    /// Add if absent, remove if present.
    Toggle(AddArgs),
    /// List favorites.
    #[command(alias = "ls")]
    List,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Character id.
    #[arg(value_parser = parse_record_id)]
    pub id: RecordId,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Character id.
    #[arg(value_parser = parse_record_id)]
    pub id: RecordId,

    /// Personal notes to attach.
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args, Debug)]
pub struct NotesArgs {
    /// Character id.
    #[arg(value_parser = parse_record_id)]
    pub id: RecordId,

    /// New notes text.
    pub notes: String,
}

fn skip_message(reason: SkipReason, id: RecordId) -> String {
    match reason {
        SkipReason::NoIdentity => "no user is logged in".to_string(),
        SkipReason::AlreadyFavorite => format!("#{id} is already a favorite"),
        SkipReason::NotFound => format!("#{id} is not a favorite"),
        SkipReason::BlankNotes => "blank notes ignored".to_string(),
    }
}

fn report(ctx: &Context, mutation: Mutation, id: RecordId, applied: &str) -> Result<()> {
    match mutation {
        Mutation::Applied => render_success(ctx.output, applied),
        Mutation::Skipped(SkipReason::NoIdentity) => Err(ErrorCode::NotAuthenticated.into()),
        Mutation::Skipped(reason) => {
            info!(%id, ?reason, "favorites unchanged");
            output::render_notice(ctx.output, &skip_message(reason, id))
        }
    }
}

/// A favorite's stored snapshot, or a fresh copy from the catalog.
fn lookup(ctx: &Context, profile: &Profile, id: RecordId) -> Result<Record> {
    if let Some(entry) = profile.favorites.get(id) {
        return Ok(entry.record);
    }
    Ok(block_on(ctx.source().fetch_record(id))?)
}

pub fn run_fav(command: &FavCommand, ctx: &Context) -> Result<()> {
    let profile = ctx.profile()?;
    profile.require_identity()?;

    match command {
        FavCommand::Add(args) => {
            validate_notes(&args.notes)?;
            let record = lookup(ctx, &profile, args.id)?;
            let mutation = profile.favorites.add(&record, &args.notes)?;
            report(
                ctx,
                mutation,
                args.id,
                &format!("added #{} {} to favorites", record.id, record.name),
            )
        }
        FavCommand::Rm(args) => {
            let mutation = profile.favorites.remove(args.id)?;
            report(ctx, mutation, args.id, &format!("removed #{} from favorites", args.id))
        }
        FavCommand::Notes(args) => {
            validate_notes(&args.notes)?;
            let mutation = profile.favorites.update_notes(args.id, &args.notes)?;
            report(ctx, mutation, args.id, &format!("updated notes on #{}", args.id))
        }
        FavCommand::Toggle(args) => {
            validate_notes(&args.notes)?;
            let record = lookup(ctx, &profile, args.id)?;
            let mutation = profile.favorites.toggle(&record, &args.notes)?;
            let now = if profile.favorites.is_favorite(args.id) {
                "added to"
            } else {
                "removed from"
            };
            report(
                ctx,
                mutation,
                args.id,
                &format!("#{} {} {now} favorites", record.id, record.name),
            )
        }
        FavCommand::List => {
            output::render_list(&profile.favorites.entries(), ctx.output)?;
            Ok(())
        }
    }
}
