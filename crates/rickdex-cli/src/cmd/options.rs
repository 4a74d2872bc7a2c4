//! `rdx options`: values available for the categorical filters.

use std::io::Write;

use anyhow::Result;
use futures::executor::block_on;
use rickdex_core::aggregator::LoadOutcome;
use rickdex_core::filter::FilterOptions;

use crate::context::Context;
use crate::output::{pretty_section, render_mode};

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_text(options: &FilterOptions, w: &mut dyn Write) -> std::io::Result<()> {
    for status in &options.statuses {
        writeln!(w, "status\t{status}")?;
    }
    for species in &options.species {
        writeln!(w, "species\t{species}")?;
    }
    for location in &options.locations {
        writeln!(w, "location\t{location}")?;
    }
    Ok(())
}

fn write_pretty(options: &FilterOptions, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Filter options")?;
    writeln!(w, "{:<10} {}", "status", join(&options.statuses))?;
    writeln!(w, "{:<10} {}", "species", join(&options.species))?;
    writeln!(w, "{:<10} {}", "location", join(&options.locations))
}

pub fn run_options(ctx: &Context) -> Result<()> {
    let agg = ctx.aggregator();
    if block_on(agg.load_initial()) == LoadOutcome::Failed {
        return Err(super::list::load_failure(&agg));
    }
    render_mode(ctx.output, &agg.filter_options(), write_text, write_pretty)
}
