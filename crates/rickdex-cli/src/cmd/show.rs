//! `rdx show`: one character with favorite annotations.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use futures::executor::block_on;
use rickdex_core::model::RecordId;
use rickdex_core::source::PageSource;
use rickdex_core::view::{EnrichedRecord, Overlay, project};

use crate::context::Context;
use crate::output::{pretty_kv, pretty_section, render_mode};
use crate::validate::parse_record_id;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Character id.
    #[arg(value_parser = parse_record_id)]
    pub id: RecordId,
}

fn write_pretty(row: &EnrichedRecord, w: &mut dyn Write) -> std::io::Result<()> {
    let record = &row.record;
    pretty_section(w, &format!("#{} {}", record.id, record.name))?;
    pretty_kv(w, "status", record.status.to_string())?;
    pretty_kv(w, "species", &record.species)?;
    if !record.subtype.is_empty() {
        pretty_kv(w, "type", &record.subtype)?;
    }
    pretty_kv(w, "gender", record.gender.to_string())?;
    pretty_kv(w, "origin", &record.origin.name)?;
    pretty_kv(w, "location", &row.location_name)?;
    pretty_kv(w, "episodes", record.episode_refs.len().to_string())?;
    pretty_kv(w, "image", &record.image_ref)?;
    pretty_kv(w, "favorite", if row.is_favorite { "yes" } else { "no" })?;
    if !row.notes.is_empty() {
        pretty_kv(w, "notes", &row.notes)?;
    }
    Ok(())
}

fn write_text(row: &EnrichedRecord, w: &mut dyn Write) -> std::io::Result<()> {
    let record = &row.record;
    writeln!(w, "id\t{}", record.id)?;
    writeln!(w, "name\t{}", record.name)?;
    writeln!(w, "status\t{}", record.status)?;
    writeln!(w, "species\t{}", record.species)?;
    writeln!(w, "location\t{}", row.location_name)?;
    writeln!(w, "favorite\t{}", row.is_favorite)?;
    writeln!(w, "notes\t{}", row.notes)
}

pub fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    let profile = ctx.profile()?;
    let record = block_on(ctx.source().fetch_record(args.id))?;
    let row = project(&record, &Overlay::default(), profile.favorites.as_ref());
    render_mode(ctx.output, &row, write_text, write_pretty)
}
