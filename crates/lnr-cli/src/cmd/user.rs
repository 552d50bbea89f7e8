use crate::model::User;
use crate::output::print_records;
use crate::queries;
use anyhow::Context as _;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::invalidation::CacheKey;

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// List workspace members (cached)
    List {
        /// Include deactivated users
        #[arg(long)]
        all: bool,
    },
}

pub fn run(ctx: &Context, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        UserSubcommand::List { all } => {
            let mut users: Vec<User> = ctx
                .cached(CacheKey::Users, || {
                    let transport = ctx.transport()?;
                    super::fetch_all(ctx, &transport, queries::USERS, "users")
                })
                .context("failed to list users")?;
            if !all {
                users.retain(|u| u.active);
            }
            print_records(&users, json)
        }
    }
}
