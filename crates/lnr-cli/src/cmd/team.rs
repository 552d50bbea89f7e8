use crate::model::Team;
use crate::output::print_records;
use crate::queries;
use anyhow::Context as _;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::invalidation::CacheKey;

#[derive(Subcommand)]
pub enum TeamSubcommand {
    /// List teams in the workspace (cached)
    List,
}

pub fn run(ctx: &Context, subcmd: TeamSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TeamSubcommand::List => {
            let teams: Vec<Team> = ctx
                .cached(CacheKey::Teams, || {
                    let transport = ctx.transport()?;
                    super::fetch_all(ctx, &transport, queries::TEAMS, "teams")
                })
                .context("failed to list teams")?;
            print_records(&teams, json)
        }
    }
}
