use crate::model::Comment;
use crate::output::{print_json, print_records};
use crate::queries;
use anyhow::Context as _;
use clap::Subcommand;
use lnr_core::context::Context;
use lnr_core::identifier::{IdentifierResolver, ISSUE_KEY};
use lnr_core::invalidation::Mutation;
use lnr_core::pager::Pager;
use lnr_core::LnrError;
use serde_json::json;

#[derive(Subcommand)]
pub enum CommentSubcommand {
    /// List comments on an issue
    List {
        /// Issue key (ENG-123) or id:<id>
        issue: String,
    },
    /// Comment on an issue
    Add {
        /// Issue key (ENG-123) or id:<id>
        issue: String,
        /// Markdown body
        body: String,
    },
}

pub fn run(ctx: &Context, subcmd: CommentSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CommentSubcommand::List { issue } => list(ctx, &issue, json),
        CommentSubcommand::Add { issue, body } => add(ctx, &issue, &body, json),
    }
}

fn list(ctx: &Context, token: &str, json: bool) -> anyhow::Result<()> {
    let transport = ctx.transport()?;
    let id = IdentifierResolver::new(&transport).resolve(token, &ISSUE_KEY)?;
    let comments: Vec<Comment> = Pager::new(&transport, queries::COMMENTS, "issue.comments")
        .variables(json!({ "id": id }))
        .page_size(ctx.page_size())
        .not_found_if_null(format!("issue '{token}'"))
        .fetch_all::<Comment>()
        .collect::<lnr_core::Result<_>>()
        .with_context(|| format!("failed to list comments on '{token}'"))?;
    print_records(&comments, json)
}

fn add(ctx: &Context, token: &str, body: &str, json: bool) -> anyhow::Result<()> {
    if body.trim().is_empty() {
        return Err(LnrError::Validation("comment body must not be empty".into()).into());
    }
    let transport = ctx.transport()?;
    let id = IdentifierResolver::new(&transport).resolve(token, &ISSUE_KEY)?;
    let data = super::apply_mutation(
        ctx,
        &transport,
        Mutation::CommentCreate,
        queries::COMMENT_CREATE,
        json!({ "input": { "issueId": id, "body": body } }),
        &format!("comment on '{token}'"),
    )?;
    let payload = super::mutation_payload(&data, "commentCreate")?;
    let comment: Comment = super::entity(&payload, "comment", "created comment")?;

    if json {
        print_json(&comment)
    } else {
        println!("Commented on {token} ({})", comment.id);
        Ok(())
    }
}
