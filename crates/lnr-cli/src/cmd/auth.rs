use crate::model::Viewer;
use crate::output::{print_fields, print_json};
use crate::queries;
use anyhow::Context as _;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::secret::Secret;
use lnr_core::transport::Transport;
use lnr_core::LnrError;
use std::io::BufRead;

#[derive(Subcommand)]
pub enum AuthSubcommand {
    /// Store an API key for the active profile
    ///
    /// The key comes from --api-key or, when absent, the first line of stdin.
    /// It is checked against the API before it is written.
    Login,
    /// Remove the active profile's key, settings and cache
    Logout,
    /// Show which key the active profile would use
    Status {
        /// Also verify the key against the API
        #[arg(long)]
        check: bool,
    },
}

pub fn run(ctx: &Context, subcmd: AuthSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        AuthSubcommand::Login => login(ctx, json),
        AuthSubcommand::Logout => logout(ctx, json),
        AuthSubcommand::Status { check } => status(ctx, check, json),
    }
}

fn read_key_from_stdin() -> anyhow::Result<Option<Secret>> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read API key from stdin")?;
    Ok(Secret::new(line))
}

fn fetch_viewer(transport: &dyn Transport) -> anyhow::Result<Viewer> {
    let data = transport.query(queries::VIEWER, serde_json::json!({}))?;
    super::entity(&data, "viewer", "viewer")
}

/// Workspace names come from the server; fold anything that would break a
/// settings line into spaces.
fn single_line(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

fn login(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let secret = match ctx.api_key_flag() {
        Some(s) => s.clone(),
        None => read_key_from_stdin()?.ok_or_else(|| {
            LnrError::Validation("no API key given: pass --api-key or pipe it on stdin".to_string())
        })?,
    };
    let name = ctx.profile_name();

    let transport = ctx.transport_with(&secret)?;
    let viewer = fetch_viewer(&transport).context("API key was not accepted")?;

    let store = ctx.store();
    let mut profile = store.load(name)?;
    profile.workspace = Some(single_line(&viewer.organization.name));
    store.save(&profile).context("failed to save profile settings")?;
    store
        .set_credential(name, &secret)
        .with_context(|| format!("failed to store credential for profile '{name}'"))?;
    // A new key may point at a different workspace.
    ctx.cache().clear(name)?;
    tracing::info!(profile = %name, workspace = %viewer.organization.name, "logged in");

    if json {
        print_json(&serde_json::json!({
            "profile": name,
            "workspace": viewer.organization.name,
            "user": viewer.name,
            "email": viewer.email,
        }))?;
    } else {
        println!(
            "Logged in to {} as {} (profile '{name}')",
            viewer.organization.name, viewer.name
        );
    }
    Ok(())
}

fn logout(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let name = ctx.profile_name();
    let store = ctx.store();
    if !store.exists(name)? {
        return Err(LnrError::ProfileNotFound(name.to_string()).into());
    }
    store
        .delete(name)
        .with_context(|| format!("failed to remove profile '{name}'"))?;
    ctx.cache().clear(name)?;

    if json {
        print_json(&serde_json::json!({ "profile": name, "removed": true }))?;
    } else {
        println!("Logged out of profile '{name}'");
    }
    Ok(())
}

fn status(ctx: &Context, check: bool, json: bool) -> anyhow::Result<()> {
    let resolved = ctx.credential()?;
    let profile = ctx.profile();

    let viewer = if check {
        let transport = ctx.transport_with(&resolved.secret)?;
        Some(fetch_viewer(&transport).context("API key was not accepted")?)
    } else {
        None
    };

    if json {
        print_json(&serde_json::json!({
            "profile": profile.name,
            "source": resolved.source,
            "key": resolved.secret.masked(),
            "workspace": profile.workspace,
            "verified": viewer.as_ref().map(|_| true),
            "user": viewer.as_ref().map(|v| v.name.clone()),
        }))?;
        return Ok(());
    }

    let mut fields = vec![
        ("Profile", profile.name.clone()),
        ("Source", resolved.source.to_string()),
        ("Key", resolved.secret.masked()),
        (
            "Workspace",
            profile.workspace.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    if let Some(v) = viewer {
        fields.push(("User", format!("{} ({})", v.name, v.organization.name)));
        fields.push(("Verified", "yes".to_string()));
    }
    print_fields(&fields);
    Ok(())
}
