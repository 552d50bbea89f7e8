use crate::output::print_json;
use anyhow::Context as _;
use lnr_core::context::Context;
use lnr_core::pager::Pager;
use lnr_core::secret::redact;
use lnr_core::transport::Transport;
use lnr_core::LnrError;
use serde_json::{Map, Value};
use std::io::Read;

/// `--var key=value`. Values that parse as JSON are sent as JSON; anything
/// else is sent as a string.
pub fn parse_var(s: &str) -> Result<(String, Value), String> {
    match s.split_once('=') {
        Some((k, _)) if k.trim().is_empty() => Err(format!("variable name cannot be empty in: {s}")),
        Some((k, v)) => {
            let value = serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_string()));
            Ok((k.trim().to_string(), value))
        }
        None => Err(format!("expected NAME=VALUE, got: {s}")),
    }
}

/// `@path` reads the document from a file, `@-` from stdin.
fn load_document(query: &str) -> anyhow::Result<String> {
    match query.strip_prefix('@') {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read query from stdin")?;
            Ok(buf)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read query file '{path}'"))
        }
        None => Ok(query.to_string()),
    }
}

pub fn run(
    ctx: &Context,
    query: &str,
    vars: Vec<(String, Value)>,
    paginate: bool,
    connection: Option<&str>,
) -> anyhow::Result<()> {
    let document = load_document(query)?;
    if document.trim().is_empty() {
        return Err(LnrError::Validation("query document is empty".into()).into());
    }
    let variables = Value::Object(vars.into_iter().collect::<Map<_, _>>());
    let credential = ctx.credential()?;
    let transport = ctx.transport_with(&credential.secret)?;

    if paginate {
        let connection = connection.ok_or_else(|| {
            LnrError::Validation("--paginate needs --connection PATH".into())
        })?;
        let items: Vec<Value> = Pager::new(&transport, document, connection)
            .variables(variables)
            .page_size(ctx.page_size())
            .fetch_all::<Value>()
            .collect::<lnr_core::Result<_>>()?;
        return print_json(&items);
    }

    match transport.query(&document, variables) {
        Ok(data) => print_json(&data),
        Err(LnrError::PartialApi { errors, data }) => {
            for e in &errors {
                eprintln!("warning: {}", redact(&e.message, &credential.secret));
            }
            if let Some(data) = &data {
                print_json(data)?;
            }
            Err(LnrError::PartialApi { errors, data }.into())
        }
        Err(e) => Err(e.into()),
    }
}
