//! [`Renderable`] impls for catalog rows and favorites.

use std::io::{self, Write};

use rickdex_core::model::FavoriteEntry;
use rickdex_core::view::{EnrichedRecord, display_location};

use crate::output::Renderable;

const FAVORITE_MARK: &str = "★";

fn json_line<T: serde::Serialize>(w: &mut dyn Write, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *w, value).map_err(io::Error::other)?;
    writeln!(w)
}

/// Tabs and newlines would break text rows.
fn cell(value: &str) -> String {
    value.replace(['\t', '\n'], " ")
}

impl Renderable for EnrichedRecord {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let record = &self.record;
        let mark = if self.is_favorite { FAVORITE_MARK } else { "" };
        writeln!(w, "#{:<4} {} {mark}", record.id, record.name)?;
        writeln!(
            w,
            "      {} · {} · {}",
            record.status, record.species, self.location_name
        )?;
        if !self.notes.is_empty() {
            writeln!(w, "      notes: {}", self.notes)?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        json_line(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let record = &self.record;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            record.id,
            cell(&record.name),
            record.status,
            cell(&record.species),
            cell(&self.location_name),
            if self.is_favorite { "yes" } else { "no" }
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "STATUS", "SPECIES", "LOCATION", "FAVORITE"]
    }
}

impl Renderable for FavoriteEntry {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let record = &self.record;
        writeln!(w, "#{:<4} {} {FAVORITE_MARK}", record.id, record.name)?;
        writeln!(
            w,
            "      {} · {} · added {}",
            record.status,
            record.species,
            self.added_at.format("%Y-%m-%d %H:%M")
        )?;
        if !self.notes.is_empty() {
            writeln!(w, "      notes: {}", self.notes)?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        json_line(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let record = &self.record;
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            record.id,
            cell(&record.name),
            record.status,
            cell(display_location(record)),
            self.added_at.to_rfc3339(),
            cell(&self.notes)
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "STATUS", "LOCATION", "ADDED", "NOTES"]
    }
}
