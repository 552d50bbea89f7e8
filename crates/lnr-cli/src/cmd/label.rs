use crate::model::Label;
use crate::output::{print_json, print_records};
use crate::queries;
use anyhow::Context as _;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::identifier::{IdentifierResolver, TEAM_KEY};
use lnr_core::invalidation::{CacheKey, Mutation};
use serde_json::json;

#[derive(Subcommand)]
pub enum LabelSubcommand {
    /// List issue labels (cached)
    List,
    /// Create an issue label
    Create {
        name: String,
        /// Hex color, e.g. #ff0000
        #[arg(long)]
        color: Option<String>,
        /// Scope the label to a team (workspace-wide when omitted)
        #[arg(long)]
        team: Option<String>,
    },
}

pub fn run(ctx: &Context, subcmd: LabelSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        LabelSubcommand::List => {
            let labels: Vec<Label> = ctx
                .cached(CacheKey::Labels, || {
                    let transport = ctx.transport()?;
                    super::fetch_all(ctx, &transport, queries::LABELS, "issueLabels")
                })
                .context("failed to list labels")?;
            print_records(&labels, json)
        }
        LabelSubcommand::Create { name, color, team } => {
            create(ctx, &name, color.as_deref(), team.as_deref(), json)
        }
    }
}

fn create(
    ctx: &Context,
    name: &str,
    color: Option<&str>,
    team: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let transport = ctx.transport()?;
    let mut input = json!({ "name": name });
    if let Some(color) = color {
        input["color"] = json!(color);
    }
    if let Some(team) = team {
        input["teamId"] = json!(IdentifierResolver::new(&transport).resolve(team, &TEAM_KEY)?);
    }

    let data = super::apply_mutation(
        ctx,
        &transport,
        Mutation::LabelCreate,
        queries::LABEL_CREATE,
        json!({ "input": input }),
        &format!("create label '{name}'"),
    )?;
    let payload = super::mutation_payload(&data, "issueLabelCreate")?;
    let label: Label = super::entity(&payload, "issueLabel", "created label")?;

    if json {
        print_json(&label)
    } else {
        println!("Created label '{}' ({})", label.name, label.id);
        Ok(())
    }
}
