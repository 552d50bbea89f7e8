use crate::model::Issue;
use crate::output::{format_row, or_dash, print_fields, print_json, Row};
use crate::queries;
use anyhow::Context as _;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::identifier::{IdentifierResolver, ISSUE_KEY, TEAM_KEY};
use lnr_core::invalidation::Mutation;
use lnr_core::pager::Pager;
use lnr_core::transport::Transport;
use lnr_core::LnrError;
use serde_json::{json, Map, Value};

/// Column widths for streamed rows; the title takes the rest.
const STREAM_WIDTHS: &[usize] = &[10, 14, 8, 18];

#[derive(Subcommand)]
pub enum IssueSubcommand {
    /// List issues, newest first as the server returns them
    List {
        /// Team key (defaults to the profile's team; all teams when unset)
        #[arg(long)]
        team: Option<String>,
        /// Follow every page instead of stopping after one
        #[arg(long)]
        all: bool,
        /// Stop after N issues
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Show one issue
    View {
        /// Issue key (ENG-123) or id:<id>
        id: String,
    },
    /// Create an issue
    Create {
        /// Team key (defaults to the profile's team)
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change an issue's title or description
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete (archive) an issue
    Delete { id: String },
}

pub fn run(ctx: &Context, subcmd: IssueSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        IssueSubcommand::List { team, all, limit } => list(ctx, team, all, limit, json),
        IssueSubcommand::View { id } => view(ctx, &id, json),
        IssueSubcommand::Create {
            team,
            title,
            description,
        } => create(ctx, team, &title, description.as_deref(), json),
        IssueSubcommand::Update {
            id,
            title,
            description,
        } => update(ctx, &id, title.as_deref(), description.as_deref(), json),
        IssueSubcommand::Delete { id } => delete(ctx, &id, json),
    }
}

fn list(
    ctx: &Context,
    team: Option<String>,
    all: bool,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let transport = ctx.transport()?;
    let filter = match super::team_token(ctx, team) {
        Some(token) => {
            let team_id = IdentifierResolver::new(&transport).resolve(&token, &TEAM_KEY)?;
            json!({ "team": { "id": { "eq": team_id } } })
        }
        None => Value::Null,
    };
    let limit = if all {
        limit
    } else {
        Some(limit.unwrap_or(ctx.page_size() as usize))
    };

    let document = queries::issues();
    let pager = Pager::new(&transport, document, "issues")
        .variables(json!({ "filter": filter }))
        .page_size(ctx.page_size())
        .limit(limit);
    let issues = pager.fetch_all::<Issue>();

    if json {
        let collected: Vec<Issue> = issues
            .collect::<lnr_core::Result<_>>()
            .context("failed to list issues")?;
        return print_json(&collected);
    }

    println!("{}", format_row(Issue::HEADERS, STREAM_WIDTHS));
    for issue in issues {
        let issue = issue.context("failed to list issues")?;
        println!("{}", format_row(issue.cells().as_slice(), STREAM_WIDTHS));
    }
    Ok(())
}

fn fetch_issue(transport: &dyn Transport, id: &str, token: &str) -> anyhow::Result<Issue> {
    let data = transport.query(&queries::issue(), json!({ "id": id }))?;
    super::entity(&data, "issue", &format!("issue '{token}'"))
}

fn print_issue(issue: &Issue, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(issue);
    }
    print_fields(&[
        ("Issue", issue.identifier.clone()),
        ("Title", issue.title.clone()),
        ("State", or_dash(issue.state.as_ref().map(|s| s.name.as_str()))),
        ("Priority", issue.priority_label().to_string()),
        ("Assignee", or_dash(issue.assignee.as_ref().map(|a| a.name.as_str()))),
        ("Team", or_dash(issue.team.as_ref().map(|t| t.key.as_str()))),
        ("Updated", or_dash(issue.updated_at.as_deref())),
        ("URL", or_dash(issue.url.as_deref())),
    ]);
    if let Some(description) = issue.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!();
        println!("{description}");
    }
    Ok(())
}

fn view(ctx: &Context, token: &str, json: bool) -> anyhow::Result<()> {
    let transport = ctx.transport()?;
    let id = IdentifierResolver::new(&transport).resolve(token, &ISSUE_KEY)?;
    let issue = fetch_issue(&transport, &id, token)?;
    print_issue(&issue, json)
}

fn create(
    ctx: &Context,
    team: Option<String>,
    title: &str,
    description: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if title.trim().is_empty() {
        return Err(LnrError::Validation("title must not be empty".into()).into());
    }
    let transport = ctx.transport()?;
    let team_id = super::require_team_id(ctx, &transport, team)?;
    let mut input = json!({ "teamId": team_id, "title": title });
    if let Some(d) = description {
        input["description"] = json!(d);
    }

    let data = super::apply_mutation(
        ctx,
        &transport,
        Mutation::IssueCreate,
        &queries::issue_create(),
        json!({ "input": input }),
        "create issue",
    )?;
    let payload = super::mutation_payload(&data, "issueCreate")?;
    let issue: Issue = super::entity(&payload, "issue", "created issue")?;

    if json {
        print_json(&issue)
    } else {
        println!("Created {}: {}", issue.identifier, issue.title);
        if let Some(url) = &issue.url {
            println!("{url}");
        }
        Ok(())
    }
}

fn update(
    ctx: &Context,
    token: &str,
    title: Option<&str>,
    description: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut input = Map::new();
    if let Some(t) = title {
        input.insert("title".into(), json!(t));
    }
    if let Some(d) = description {
        input.insert("description".into(), json!(d));
    }
    if input.is_empty() {
        return Err(
            LnrError::Validation("nothing to update: pass --title or --description".into()).into(),
        );
    }

    let transport = ctx.transport()?;
    let id = IdentifierResolver::new(&transport).resolve(token, &ISSUE_KEY)?;
    let data = super::apply_mutation(
        ctx,
        &transport,
        Mutation::IssueUpdate,
        &queries::issue_update(),
        json!({ "id": id, "input": input }),
        &format!("update issue '{token}'"),
    )?;
    let payload = super::mutation_payload(&data, "issueUpdate")?;
    let issue: Issue = super::entity(&payload, "issue", &format!("issue '{token}'"))?;

    if json {
        print_json(&issue)
    } else {
        println!("Updated {}", issue.identifier);
        Ok(())
    }
}

fn delete(ctx: &Context, token: &str, json: bool) -> anyhow::Result<()> {
    let transport = ctx.transport()?;
    let id = IdentifierResolver::new(&transport).resolve(token, &ISSUE_KEY)?;
    let data = super::apply_mutation(
        ctx,
        &transport,
        Mutation::IssueDelete,
        queries::ISSUE_DELETE,
        json!({ "id": id }),
        &format!("delete issue '{token}'"),
    )?;
    super::mutation_payload(&data, "issueDelete")?;

    if json {
        print_json(&json!({ "id": id, "deleted": true }))
    } else {
        println!("Deleted {token}");
        Ok(())
    }
}
