pub mod api;
pub mod auth;
pub mod cache;
pub mod comment;
pub mod issue;
pub mod label;
pub mod profile;
pub mod project;
pub mod team;
pub mod user;

use anyhow::Context as _;
use lnr_core::context::Context;
use lnr_core::identifier::{IdentifierResolver, TEAM_KEY};
use lnr_core::invalidation::Mutation;
use lnr_core::pager::Pager;
use lnr_core::transport::Transport;
use lnr_core::LnrError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Drain a paged connection into memory using the profile's page size.
pub fn fetch_all<T: DeserializeOwned>(
    ctx: &Context,
    transport: &dyn Transport,
    document: &str,
    connection: &str,
) -> lnr_core::Result<Vec<T>> {
    Pager::new(transport, document, connection)
        .page_size(ctx.page_size())
        .fetch_all::<T>()
        .collect()
}

/// Send a mutation and drop the cache keys it makes stale.
///
/// `what` reads as a verb phrase ("create project 'Launch'"). A response with
/// partial errors may still have been applied, so the keys are dropped before
/// that error is returned too.
pub fn apply_mutation(
    ctx: &Context,
    transport: &dyn Transport,
    mutation: Mutation,
    document: &str,
    variables: Value,
    what: &str,
) -> anyhow::Result<Value> {
    match transport.mutate(document, variables) {
        Ok(data) => {
            ctx.invalidate_for(mutation).with_context(|| {
                format!("{what}: applied, but the cached lists could not be dropped")
            })?;
            Ok(data)
        }
        Err(err @ LnrError::PartialApi { .. }) => {
            if let Err(e) = ctx.invalidate_for(mutation) {
                tracing::warn!(?mutation, error = %e, "could not drop cache after partial mutation");
            }
            Err(anyhow::Error::from(err).context(format!("failed to {what}")))
        }
        Err(err) => Err(anyhow::Error::from(err).context(format!("failed to {what}"))),
    }
}

/// Unwrap a `{ <field>: { success, ... } }` mutation payload.
pub fn mutation_payload(data: &Value, field: &str) -> anyhow::Result<Value> {
    let payload = data
        .get(field)
        .filter(|p| !p.is_null())
        .with_context(|| format!("{field}: empty response"))?;
    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        anyhow::bail!("{field} was not applied by the server");
    }
    Ok(payload.clone())
}

/// Decode `value[field]`, treating null as `NotFound(what)`.
pub fn entity<T: DeserializeOwned>(value: &Value, field: &str, what: &str) -> anyhow::Result<T> {
    match value.get(field) {
        None | Some(Value::Null) => Err(LnrError::NotFound(what.to_string()).into()),
        Some(v) => serde_json::from_value(v.clone())
            .with_context(|| format!("unexpected shape for {field}")),
    }
}

/// The team to act on: `--team` or the profile default.
pub fn team_token(ctx: &Context, flag: Option<String>) -> Option<String> {
    flag.or_else(|| ctx.profile().team.clone())
}

/// Internal id for a team key, `--team` first, profile default second.
pub fn require_team_id(
    ctx: &Context,
    transport: &dyn Transport,
    flag: Option<String>,
) -> anyhow::Result<String> {
    let token = team_token(ctx, flag).ok_or_else(|| {
        LnrError::Validation(
            "no team given: pass --team KEY or run 'lnr profile set team KEY'".to_string(),
        )
    })?;
    Ok(IdentifierResolver::new(transport).resolve(&token, &TEAM_KEY)?)
}
