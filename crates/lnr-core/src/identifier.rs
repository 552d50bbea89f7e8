//! Shorthand → internal id resolution.
//!
//! A token is taken as an internal id when it is prefixed with `id:` or when
//! it looks like one: ASCII alphanumeric, no hyphen, at least
//! [`MIN_INTERNAL_LEN`] characters. Everything else is a shorthand and costs
//! one lookup query. The shape rule is a guess; `id:` is the escape hatch
//! for ids that do not fit it.

use crate::error::{LnrError, Result};
use crate::transport::Transport;
use serde_json::{json, Value};
use std::sync::OnceLock;

pub const INTERNAL_PREFIX: &str = "id:";
pub const MIN_INTERNAL_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdRef {
    Internal(String),
    Shorthand(String),
}

impl IdRef {
    pub fn classify(token: &str) -> Result<Self> {
        let token = token.trim();
        if let Some(id) = token.strip_prefix(INTERNAL_PREFIX) {
            let id = id.trim();
            if id.is_empty() {
                return Err(LnrError::Validation(format!(
                    "'{token}' has an empty id after '{INTERNAL_PREFIX}'"
                )));
            }
            return Ok(IdRef::Internal(id.to_string()));
        }
        if token.is_empty() {
            return Err(LnrError::Validation("identifier is empty".to_string()));
        }
        if looks_internal(token) {
            Ok(IdRef::Internal(token.to_string()))
        } else {
            Ok(IdRef::Shorthand(token.to_string()))
        }
    }
}

fn looks_internal(token: &str) -> bool {
    token.len() >= MIN_INTERNAL_LEN && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// How to find the internal id for one kind of shorthand.
///
/// `document` must return a connection at `connection` whose `nodes` carry
/// an `id` field. `variables` validates the shorthand before any request.
pub struct Lookup {
    pub kind: &'static str,
    pub document: &'static str,
    pub connection: &'static str,
    pub variables: fn(&str) -> Result<Value>,
}

pub const ISSUE_KEY: Lookup = Lookup {
    kind: "issue",
    document: "query IssueByKey($teamKey: String!, $number: Float!) { \
        issues(filter: { team: { key: { eq: $teamKey } }, number: { eq: $number } }, first: 2) { nodes { id } } }",
    connection: "issues",
    variables: issue_key_variables,
};

pub const TEAM_KEY: Lookup = Lookup {
    kind: "team",
    document: "query TeamByKey($key: String!) { \
        teams(filter: { key: { eq: $key } }, first: 2) { nodes { id } } }",
    connection: "teams",
    variables: team_key_variables,
};

pub const PROJECT_NAME: Lookup = Lookup {
    kind: "project",
    document: "query ProjectByName($name: String!) { \
        projects(filter: { name: { eqIgnoreCase: $name } }, first: 2) { nodes { id } } }",
    connection: "projects",
    variables: project_name_variables,
};

fn issue_key_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)-([0-9]{1,9})$").unwrap())
}

fn team_key_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap())
}

fn issue_key_variables(token: &str) -> Result<Value> {
    let caps = issue_key_re().captures(token).ok_or_else(|| {
        LnrError::Validation(format!("'{token}' is not an issue key (expected e.g. ENG-123)"))
    })?;
    let number: u32 = caps[2]
        .parse()
        .map_err(|_| LnrError::Validation(format!("'{token}' has an invalid issue number")))?;
    Ok(json!({ "teamKey": caps[1].to_ascii_uppercase(), "number": number }))
}

fn team_key_variables(token: &str) -> Result<Value> {
    if !team_key_re().is_match(token) {
        return Err(LnrError::Validation(format!(
            "'{token}' is not a team key (expected e.g. ENG)"
        )));
    }
    Ok(json!({ "key": token.to_ascii_uppercase() }))
}

fn project_name_variables(token: &str) -> Result<Value> {
    Ok(json!({ "name": token }))
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct IdentifierResolver<'a> {
    transport: &'a dyn Transport,
}

impl<'a> IdentifierResolver<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        IdentifierResolver { transport }
    }

    /// Internal ids pass through untouched; shorthands are looked up.
    ///
    /// Zero matches is `NotFound` naming `token` as given. More than one
    /// is a `Validation` error, since picking one would be a guess.
    pub fn resolve(&self, token: &str, lookup: &Lookup) -> Result<String> {
        let shorthand = match IdRef::classify(token)? {
            IdRef::Internal(id) => return Ok(id),
            IdRef::Shorthand(s) => s,
        };
        let variables = (lookup.variables)(&shorthand)?;
        let data = self.transport.query(lookup.document, variables)?;

        let ids: Vec<&str> = data
            .get(lookup.connection)
            .and_then(|c| c.get("nodes"))
            .and_then(Value::as_array)
            .map(|nodes| nodes.iter().filter_map(|n| n.get("id")?.as_str()).collect())
            .unwrap_or_default();

        match ids.as_slice() {
            [] => Err(LnrError::NotFound(format!("{} '{}'", lookup.kind, token.trim()))),
            [id] => {
                tracing::debug!(kind = lookup.kind, shorthand = %shorthand, id, "resolved identifier");
                Ok(id.to_string())
            }
            _ => Err(LnrError::Validation(format!(
                "{} '{}' is ambiguous; pass {INTERNAL_PREFIX}<id> instead",
                lookup.kind,
                token.trim()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Fake {
        response: Value,
        calls: RefCell<Vec<Value>>,
    }

    impl Fake {
        fn returning(response: Value) -> Self {
            Fake {
                response,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Fake {
        fn query(&self, _document: &str, variables: Value) -> Result<Value> {
            self.calls.borrow_mut().push(variables);
            Ok(self.response.clone())
        }
    }

    const UUID_LIKE: &str = "9cfb482a81f4474aa1d5e1d3c5e7b9a2";

    #[test]
    fn classify_shapes() {
        assert_eq!(IdRef::classify(UUID_LIKE).unwrap(), IdRef::Internal(UUID_LIKE.into()));
        assert_eq!(IdRef::classify("ENG-123").unwrap(), IdRef::Shorthand("ENG-123".into()));
        assert_eq!(IdRef::classify("ENG").unwrap(), IdRef::Shorthand("ENG".into()));
        // Long but hyphenated stays a shorthand.
        assert_eq!(
            IdRef::classify("PLATFORMINFRA-123456789").unwrap(),
            IdRef::Shorthand("PLATFORMINFRA-123456789".into())
        );
        // 19 characters is one short.
        assert!(matches!(IdRef::classify("abcdefghij123456789").unwrap(), IdRef::Shorthand(_)));
    }

    #[test]
    fn explicit_prefix_forces_internal() {
        assert_eq!(
            IdRef::classify("id:2f1c-short").unwrap(),
            IdRef::Internal("2f1c-short".into())
        );
        assert!(matches!(IdRef::classify("id:"), Err(LnrError::Validation(_))));
        assert!(matches!(IdRef::classify("  "), Err(LnrError::Validation(_))));
    }

    #[test]
    fn internal_ids_skip_the_network() {
        let fake = Fake::returning(Value::Null);
        let resolver = IdentifierResolver::new(&fake);
        assert_eq!(resolver.resolve(UUID_LIKE, &ISSUE_KEY).unwrap(), UUID_LIKE);
        assert_eq!(resolver.resolve("id:abc", &TEAM_KEY).unwrap(), "abc");
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn issue_key_lookup() {
        let fake = Fake::returning(json!({"issues": {"nodes": [{"id": "issue-uuid"}]}}));
        let resolver = IdentifierResolver::new(&fake);
        assert_eq!(resolver.resolve("eng-42", &ISSUE_KEY).unwrap(), "issue-uuid");
        assert_eq!(fake.calls.borrow()[0], json!({"teamKey": "ENG", "number": 42}));
    }

    #[test]
    fn zero_matches_names_original_token() {
        let fake = Fake::returning(json!({"issues": {"nodes": []}}));
        let err = IdentifierResolver::new(&fake)
            .resolve("ENG-999", &ISSUE_KEY)
            .unwrap_err();
        match err {
            LnrError::NotFound(msg) => assert_eq!(msg, "issue 'ENG-999'"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn null_connection_is_not_found() {
        let fake = Fake::returning(json!({"teams": null}));
        assert!(matches!(
            IdentifierResolver::new(&fake).resolve("ENG", &TEAM_KEY),
            Err(LnrError::NotFound(_))
        ));
    }

    #[test]
    fn multiple_matches_are_ambiguous() {
        let fake = Fake::returning(json!({"projects": {"nodes": [{"id": "p1"}, {"id": "p2"}]}}));
        let err = IdentifierResolver::new(&fake)
            .resolve("Roadmap", &PROJECT_NAME)
            .unwrap_err();
        assert!(matches!(err, LnrError::Validation(msg) if msg.contains("ambiguous")));
    }

    #[test]
    fn malformed_shorthand_rejected_before_request() {
        let fake = Fake::returning(Value::Null);
        let resolver = IdentifierResolver::new(&fake);
        assert!(matches!(
            resolver.resolve("ENG-", &ISSUE_KEY),
            Err(LnrError::Validation(_))
        ));
        assert!(matches!(
            resolver.resolve("not a team", &TEAM_KEY),
            Err(LnrError::Validation(_))
        ));
        assert!(fake.calls.borrow().is_empty());
    }

    #[test]
    fn team_keys_are_uppercased() {
        let fake = Fake::returning(json!({"teams": {"nodes": [{"id": "t1"}]}}));
        IdentifierResolver::new(&fake).resolve("eng", &TEAM_KEY).unwrap();
        assert_eq!(fake.calls.borrow()[0], json!({"key": "ENG"}));
    }
}
