use crate::env::{Environment, API_KEY_VAR, LEGACY_API_KEY_VAR};
use crate::error::{LnrError, Result};
use crate::secret::Secret;
use serde::Serialize;
use std::fmt;

/// Anything that can look up a stored key by profile name.
pub trait CredentialStore {
    /// `Ok(None)` when the profile has no stored key.
    fn credential(&self, profile: &str) -> Result<Option<Secret>>;
}

/// Where a resolved key came from, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    Environment,
    Flag,
    Profile,
    Legacy,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "{API_KEY_VAR} environment variable"),
            CredentialSource::Flag => write!(f, "--api-key flag"),
            CredentialSource::Profile => write!(f, "credentials file"),
            CredentialSource::Legacy => write!(f, "{LEGACY_API_KEY_VAR} environment variable"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub secret: Secret,
    pub source: CredentialSource,
}

/// Resolve the API key for `profile`.
///
/// Precedence:
/// 1. `LNR_API_KEY`
/// 2. `flag` (the per-invocation `--api-key`)
/// 3. the profile's entry in `store`
/// 4. `LINEAR_API_KEY`
///
/// Lower sources are not consulted once a higher one yields a key, so a
/// broken credentials file does not block an environment override. The
/// result depends only on the arguments.
pub fn resolve(
    profile: &str,
    env: &Environment,
    flag: Option<&Secret>,
    store: &impl CredentialStore,
) -> Result<ResolvedCredential> {
    let found = |secret: &Secret, source| ResolvedCredential {
        secret: secret.clone(),
        source,
    };
    if let Some(secret) = &env.api_key {
        return Ok(found(secret, CredentialSource::Environment));
    }
    if let Some(secret) = flag {
        return Ok(found(secret, CredentialSource::Flag));
    }
    if let Some(secret) = store.credential(profile)? {
        return Ok(ResolvedCredential {
            secret,
            source: CredentialSource::Profile,
        });
    }
    if let Some(secret) = &env.legacy_api_key {
        return Ok(found(secret, CredentialSource::Legacy));
    }
    Err(LnrError::NoCredential {
        profile: profile.to_string(),
    })
}
