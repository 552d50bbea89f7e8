use crate::model::Project;
use crate::output::{print_json, print_records};
use crate::queries;
use anyhow::Context as _;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::identifier::{IdentifierResolver, PROJECT_NAME};
use lnr_core::invalidation::{CacheKey, Mutation};
use lnr_core::LnrError;
use serde_json::json;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// List projects (cached)
    List,
    /// Create a project
    Create {
        name: String,
        /// Owning team key (defaults to the profile's team)
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename or re-describe a project
    Update {
        /// Project name or id:<id>
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a project
    Delete {
        /// Project name or id:<id>
        project: String,
    },
}

pub fn run(ctx: &Context, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::List => list(ctx, json),
        ProjectSubcommand::Create {
            name,
            team,
            description,
        } => create(ctx, &name, team, description.as_deref(), json),
        ProjectSubcommand::Update {
            project,
            name,
            description,
        } => update(ctx, &project, name.as_deref(), description.as_deref(), json),
        ProjectSubcommand::Delete { project } => delete(ctx, &project, json),
    }
}

fn list(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let projects: Vec<Project> = ctx
        .cached(CacheKey::Projects, || {
            let transport = ctx.transport()?;
            super::fetch_all(ctx, &transport, queries::PROJECTS, "projects")
        })
        .context("failed to list projects")?;
    print_records(&projects, json)
}

fn print_project(project: &Project, verb: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(project)
    } else {
        println!("{verb} project '{}' ({})", project.name, project.id);
        Ok(())
    }
}

fn create(
    ctx: &Context,
    name: &str,
    team: Option<String>,
    description: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let transport = ctx.transport()?;
    let team_id = super::require_team_id(ctx, &transport, team)?;
    let mut input = json!({ "name": name, "teamIds": [team_id] });
    if let Some(d) = description {
        input["description"] = json!(d);
    }

    let data = super::apply_mutation(
        ctx,
        &transport,
        Mutation::ProjectCreate,
        queries::PROJECT_CREATE,
        json!({ "input": input }),
        &format!("create project '{name}'"),
    )?;
    let payload = super::mutation_payload(&data, "projectCreate")?;
    let project: Project = super::entity(&payload, "project", "created project")?;
    print_project(&project, "Created", json)
}

fn update(
    ctx: &Context,
    token: &str,
    name: Option<&str>,
    description: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut input = serde_json::Map::new();
    if let Some(n) = name {
        input.insert("name".into(), json!(n));
    }
    if let Some(d) = description {
        input.insert("description".into(), json!(d));
    }
    if input.is_empty() {
        return Err(LnrError::Validation("nothing to update: pass --name or --description".into()).into());
    }

    let transport = ctx.transport()?;
    let id = IdentifierResolver::new(&transport).resolve(token, &PROJECT_NAME)?;
    let data = super::apply_mutation(
        ctx,
        &transport,
        Mutation::ProjectUpdate,
        queries::PROJECT_UPDATE,
        json!({ "id": id, "input": input }),
        &format!("update project '{token}'"),
    )?;
    let payload = super::mutation_payload(&data, "projectUpdate")?;
    let project: Project = super::entity(&payload, "project", "updated project")?;
    print_project(&project, "Updated", json)
}

fn delete(ctx: &Context, token: &str, json: bool) -> anyhow::Result<()> {
    let transport = ctx.transport()?;
    let id = IdentifierResolver::new(&transport).resolve(token, &PROJECT_NAME)?;
    let data = super::apply_mutation(
        ctx,
        &transport,
        Mutation::ProjectDelete,
        queries::PROJECT_DELETE,
        json!({ "id": id }),
        &format!("delete project '{token}'"),
    )?;
    super::mutation_payload(&data, "projectDelete")?;

    if json {
        print_json(&json!({ "id": id, "deleted": true }))
    } else {
        println!("Deleted project '{token}'");
        Ok(())
    }
}
