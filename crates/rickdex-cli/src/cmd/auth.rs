//! `rdx login`, `rdx logout`, `rdx whoami`: the local identity.
//!
//! There is no remote authentication; logging in just selects whose
//! favorites are active and remembers that choice in the store.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use rickdex_core::session::Identity;
use serde::Serialize;

use crate::context::Context;
use crate::output::{pretty_kv, render_mode, render_success};
use crate::validate::{validate_email, validate_uid};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// User id; scopes the favorites collection.
    pub uid: String,

    /// Email address to display.
    #[arg(long)]
    pub email: Option<String>,

    /// Display name.
    #[arg(long)]
    pub username: Option<String>,
}

impl LoginArgs {
    pub fn identity(&self) -> Result<Identity> {
        validate_uid(&self.uid)?;
        let mut identity = Identity::new(self.uid.clone());
        if let Some(email) = &self.email {
            validate_email(email)?;
            identity = identity.with_email(email.clone());
        }
        if let Some(username) = &self.username {
            identity = identity.with_username(username.trim());
        }
        Ok(identity)
    }
}

#[derive(Debug, Serialize)]
struct Whoami {
    identity: Option<Identity>,
    favorites: usize,
}

pub fn run_login(args: &LoginArgs, ctx: &Context) -> Result<()> {
    let identity = args.identity()?;
    let profile = ctx.profile()?;
    profile.session.login(identity.clone())?;
    render_success(
        ctx.output,
        &format!(
            "logged in as {} ({} favorites)",
            identity.uid,
            profile.favorites.len()
        ),
    )
}

pub fn run_logout(ctx: &Context) -> Result<()> {
    let profile = ctx.profile()?;
    let previous = profile.session.current();
    profile.session.logout()?;
    let message = previous.map_or_else(
        || "nobody was logged in".to_string(),
        |identity| format!("logged out {}", identity.uid),
    );
    render_success(ctx.output, &message)
}

pub fn run_whoami(ctx: &Context) -> Result<()> {
    let profile = ctx.profile()?;
    let whoami = Whoami {
        identity: profile.session.current(),
        favorites: profile.favorites.len(),
    };
    render_mode(
        ctx.output,
        &whoami,
        |w, out| match &w.identity {
            Some(identity) => writeln!(out, "{}\t{}", identity.uid, w.favorites),
            None => writeln!(out, "-"),
        },
        |w, out| match &w.identity {
            Some(identity) => {
                pretty_kv(out, "uid", &identity.uid)?;
                if let Some(email) = &identity.email {
                    pretty_kv(out, "email", email)?;
                }
                if let Some(username) = &identity.username {
                    pretty_kv(out, "username", username)?;
                }
                pretty_kv(out, "favorites", w.favorites.to_string())
            }
            None => writeln!(out, "not logged in"),
        },
    )
}
