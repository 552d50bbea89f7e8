use crate::output::print_json;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::invalidation::CacheKey;
use lnr_core::LnrError;

#[derive(Subcommand)]
pub enum CacheSubcommand {
    /// Drop cached data for the active profile
    Clear {
        /// Only this key (teams, users, projects, labels)
        key: Option<String>,
    },
    /// Print the active profile's cache directory
    Path,
}

pub fn run(ctx: &Context, subcmd: CacheSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CacheSubcommand::Clear { key } => clear(ctx, key.as_deref(), json),
        CacheSubcommand::Path => {
            let dir = ctx.cache().profile_dir(ctx.profile_name());
            if json {
                print_json(&serde_json::json!({ "path": dir }))
            } else {
                println!("{}", dir.display());
                Ok(())
            }
        }
    }
}

fn clear(ctx: &Context, key: Option<&str>, json: bool) -> anyhow::Result<()> {
    let name = ctx.profile_name();
    match key {
        Some(raw) => {
            let key = CacheKey::parse(raw).ok_or_else(|| {
                let known: Vec<_> = CacheKey::ALL.iter().map(|k| k.as_str()).collect();
                LnrError::Validation(format!(
                    "unknown cache key '{raw}': expected one of {}",
                    known.join(", ")
                ))
            })?;
            ctx.cache().invalidate(name, key.as_str())?;
        }
        None => ctx.cache().clear(name)?,
    }

    if json {
        print_json(&serde_json::json!({ "profile": name, "cleared": key.unwrap_or("all") }))
    } else {
        println!("Cleared {} cache for profile '{name}'", key.unwrap_or("all"));
        Ok(())
    }
}
