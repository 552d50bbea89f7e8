use crate::output::{print_fields, print_json, print_table};
use anyhow::Context as _;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::credentials::CredentialStore;
use lnr_core::duration::format_duration;

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// List every configured profile
    List,
    /// Show the active profile's settings (defaults filled in)
    Show,
    /// Set a setting on the active profile
    Set {
        /// One of: team, output, cache_ttl, page_size
        key: String,
        value: String,
    },
    /// Remove a setting from the active profile
    Unset { key: String },
}

pub fn run(ctx: &Context, subcmd: ProfileSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProfileSubcommand::List => list(ctx, json),
        ProfileSubcommand::Show => show(ctx, json),
        ProfileSubcommand::Set { key, value } => set(ctx, &key, Some(&value), json),
        ProfileSubcommand::Unset { key } => set(ctx, &key, None, json),
    }
}

fn list(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let profiles = ctx.store().list().context("failed to list profiles")?;
    if json {
        return print_json(&profiles);
    }
    if profiles.is_empty() {
        println!("No profiles. Run 'lnr auth login' to create one.");
        return Ok(());
    }
    let rows = profiles
        .iter()
        .map(|p| {
            let active = if p.name == ctx.profile_name() { "*" } else { "" };
            vec![
                active.to_string(),
                p.name.clone(),
                p.workspace.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["", "PROFILE", "WORKSPACE"], rows);
    Ok(())
}

fn show(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let profile = ctx.profile();
    let has_key = ctx.store().credential(&profile.name)?.is_some();

    if json {
        return print_json(&serde_json::json!({
            "profile": profile,
            "effective": {
                "output": profile.output_or_default(),
                "cache_ttl": format_duration(profile.cache_ttl_or_default()),
                "page_size": profile.page_size_or_default(),
            },
            "has_stored_key": has_key,
        }));
    }

    let dash = || "-".to_string();
    print_fields(&[
        ("Profile", profile.name.clone()),
        ("Workspace", profile.workspace.clone().unwrap_or_else(dash)),
        ("Team", profile.team.clone().unwrap_or_else(dash)),
        ("Output", profile.output_or_default().to_string()),
        ("Cache TTL", format_duration(profile.cache_ttl_or_default())),
        ("Page size", profile.page_size_or_default().to_string()),
        ("Stored key", if has_key { "yes" } else { "no" }.to_string()),
    ]);
    Ok(())
}

fn set(ctx: &Context, key: &str, value: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut profile = ctx.profile().clone();
    match value {
        Some(v) => profile.set(key, v)?,
        None => profile.unset(key)?,
    }
    ctx.store()
        .save(&profile)
        .context("failed to save profile settings")?;

    if json {
        return print_json(&profile);
    }
    match value {
        Some(v) => println!("Set {key} = {v} on profile '{}'", profile.name),
        None => println!("Unset {key} on profile '{}'", profile.name),
    }
    Ok(())
}
