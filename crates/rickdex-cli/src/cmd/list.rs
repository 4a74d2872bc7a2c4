//! `rdx list`: browse the catalog with search, filters and sorting.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use futures::executor::block_on;
use futures::future::join_all;
use rickdex_core::aggregator::{DatasetAggregator, LoadOutcome};
use rickdex_core::filter::Predicate;
use rickdex_core::model::Status;
use rickdex_core::sort::{SortDirection, SortField};
use rickdex_core::source::PageSource;
use rickdex_core::view::UNKNOWN_LOCATION;
use tracing::debug;

use crate::context::Context;
use crate::output::{self, OutputMode, pretty_rule};
use crate::validate::{parse_sort_field, parse_status};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive substring of the character name.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Filter by status: alive, dead, unknown.
    #[arg(long, value_parser = parse_status)]
    pub status: Option<Status>,

    /// Filter by exact species (see `rdx options`).
    #[arg(long)]
    pub species: Option<String>,

    /// Filter by exact last known location (see `rdx options`).
    #[arg(long)]
    pub location: Option<String>,

    /// Sort by field: id, name, status, species, gender, origin, location, created.
    #[arg(long, value_parser = parse_sort_field)]
    pub sort: Option<SortField>,

    /// Sort descending instead of ascending.
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Show every character, not just the first page window.
    #[arg(long, conflicts_with_all = ["search", "status", "species", "location"])]
    pub all: bool,

    /// Look up locations reported as unknown.
    #[arg(long)]
    pub resolve_locations: bool,

    /// Maximum rows to print.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl ListArgs {
    pub fn predicate(&self) -> Predicate {
        Predicate {
            text: self.search.clone().unwrap_or_default(),
            status: self.status,
            species: self.species.clone(),
            location: self.location.clone(),
        }
    }
}

/// Apply filters and sort to a loaded aggregator.
///
/// Returns the error slot as an error if any load failed.
pub async fn browse<S: PageSource>(agg: &DatasetAggregator<S>, args: &ListArgs) -> Result<()> {
    if agg.load_initial().await == LoadOutcome::Failed {
        return Err(load_failure(agg));
    }

    let outcome = if args.all {
        agg.show_all().await
    } else {
        agg.set_predicate(args.predicate()).await
    };
    if outcome == LoadOutcome::Failed {
        return Err(load_failure(agg));
    }

    if let Some(field) = args.sort {
        let wanted = if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        // Direction alternates per call.
        if agg.sort(field) != wanted {
            agg.sort(field);
        }
    }

    if args.resolve_locations {
        let unknown: Vec<_> = agg
            .display_projected(&rickdex_core::view::NoFavorites)
            .into_iter()
            .filter(|row| row.location_name == UNKNOWN_LOCATION)
            .map(|row| row.record.id)
            .collect();
        debug!(count = unknown.len(), "resolving unknown locations");
        join_all(unknown.into_iter().map(|id| agg.resolve_location(id))).await;
    }
    Ok(())
}

/// The aggregator's error slot as an error.
pub fn load_failure<S: PageSource>(agg: &DatasetAggregator<S>) -> anyhow::Error {
    agg.error().map_or_else(
        || anyhow::anyhow!("catalog load failed"),
        anyhow::Error::new,
    )
}

pub fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let agg = ctx.aggregator();
    let profile = ctx.profile()?;
    block_on(browse(&agg, args))?;

    let mut rows = agg.display_projected(profile.favorites.as_ref());
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }
    output::render_list(&rows, ctx.output)?;

    if ctx.output == OutputMode::Pretty {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        pretty_rule(&mut out)?;
        writeln!(
            out,
            "showing {} of {} loaded{}",
            rows.len(),
            agg.total_loaded(),
            if agg.has_active_filters() { " (filtered)" } else { "" }
        )?;
    }
    Ok(())
}
