use crate::cache::Cache;
use crate::credentials::{self, ResolvedCredential};
use crate::env::Environment;
use crate::error::Result;
use crate::invalidation::{CacheKey, Mutation};
use crate::paths::{self, Paths};
use crate::profile::{OutputFormat, Profile, ProfileStore, DEFAULT_PROFILE};
use crate::secret::Secret;
use crate::transport::{HttpTransport, TransportConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Pick the active profile name.
///
/// Priority:
/// 1. `--profile`
/// 2. `LNR_PROFILE`
/// 3. `default`
pub fn select_profile(flag: Option<&str>, env: &Environment) -> Result<String> {
    let name = flag
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .or(env.profile.as_deref())
        .unwrap_or(DEFAULT_PROFILE);
    paths::validate_profile_name(name)?;
    Ok(name.to_string())
}

/// Everything one invocation needs, built once in `main` and passed down.
#[derive(Debug)]
pub struct Context {
    env: Environment,
    paths: Paths,
    store: ProfileStore,
    cache: Cache,
    profile: Profile,
    api_key_flag: Option<Secret>,
    transport: TransportConfig,
}

impl Context {
    pub fn new(env: Environment, profile_flag: Option<&str>, api_key_flag: Option<Secret>) -> Result<Self> {
        let paths = Paths::resolve(&env)?;
        Self::with_paths(env, paths, profile_flag, api_key_flag)
    }

    pub fn with_paths(
        env: Environment,
        paths: Paths,
        profile_flag: Option<&str>,
        api_key_flag: Option<Secret>,
    ) -> Result<Self> {
        let name = select_profile(profile_flag, &env)?;
        let store = ProfileStore::from_paths(&paths);
        let profile = store.load(&name)?;
        let cache = Cache::new(&paths.cache_dir);
        let mut transport = TransportConfig::default();
        if let Some(url) = &env.api_url {
            transport.endpoint = url.clone();
        }
        tracing::debug!(profile = %name, config_dir = %paths.config_dir.display(), "context ready");
        Ok(Context {
            env,
            paths,
            store,
            cache,
            profile,
            api_key_flag,
            transport,
        })
    }

    pub fn profile_name(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn api_key_flag(&self) -> Option<&Secret> {
        self.api_key_flag.as_ref()
    }

    pub fn transport_config(&self) -> &TransportConfig {
        &self.transport
    }

    pub fn cache_ttl(&self) -> Duration {
        self.profile.cache_ttl_or_default()
    }

    pub fn page_size(&self) -> u32 {
        self.profile.page_size_or_default()
    }

    pub fn output(&self) -> OutputFormat {
        self.profile.output_or_default()
    }

    pub fn credential(&self) -> Result<ResolvedCredential> {
        let resolved = credentials::resolve(
            self.profile_name(),
            &self.env,
            self.api_key_flag.as_ref(),
            &self.store,
        )?;
        tracing::debug!(profile = %self.profile_name(), source = ?resolved.source, "resolved credential");
        Ok(resolved)
    }

    /// A transport authenticated with the resolved credential.
    pub fn transport(&self) -> Result<HttpTransport> {
        let resolved = self.credential()?;
        self.transport_with(&resolved.secret)
    }

    /// A transport for an explicit key, used by login before it is stored.
    pub fn transport_with(&self, secret: &Secret) -> Result<HttpTransport> {
        HttpTransport::new(self.transport.clone(), secret)
    }

    /// Cache-first read of `key` for the active profile.
    pub fn cached<T, F>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        self.cache
            .get_or_fetch(self.profile_name(), key.as_str(), self.cache_ttl(), fetch)
    }

    /// Drop every cache entry `mutation` is declared to stale.
    pub fn invalidate_for(&self, mutation: Mutation) -> Result<()> {
        for key in mutation.stale_keys() {
            self.cache.invalidate(self.profile_name(), key.as_str())?;
            tracing::debug!(?mutation, key = %key, "invalidated after mutation");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialSource;
    use crate::error::LnrError;
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn context(env: Environment, flag: Option<&str>) -> (Context, TempDir) {
        let dir = TempDir::new().unwrap();
        let ctx = Context::with_paths(env, Paths::in_dir(dir.path()), flag, None).unwrap();
        (ctx, dir)
    }

    #[test]
    fn profile_selection_precedence() {
        let mut env = Environment::default();
        assert_eq!(select_profile(None, &env).unwrap(), "default");
        env.profile = Some("ci".into());
        assert_eq!(select_profile(None, &env).unwrap(), "ci");
        assert_eq!(select_profile(Some("work"), &env).unwrap(), "work");
        assert_eq!(select_profile(Some(""), &env).unwrap(), "ci");
    }

    #[test]
    fn invalid_profile_name_is_rejected() {
        assert!(matches!(
            select_profile(Some("../../etc"), &Environment::default()),
            Err(LnrError::InvalidProfileName(_))
        ));
    }

    #[test]
    fn loads_profile_settings() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::in_dir(dir.path());
        let store = ProfileStore::from_paths(&paths);
        let mut work = Profile::new("work");
        work.set("page_size", "20").unwrap();
        work.set("cache_ttl", "0").unwrap();
        store.save(&work).unwrap();

        let ctx = Context::with_paths(Environment::default(), paths, Some("work"), None).unwrap();
        assert_eq!(ctx.page_size(), 20);
        assert_eq!(ctx.cache_ttl(), Duration::ZERO);
        assert_eq!(ctx.output(), OutputFormat::Table);
    }

    #[test]
    fn credential_uses_flag_below_env_override() {
        let dir = TempDir::new().unwrap();
        let flag = Secret::new("flag-key");
        let ctx = Context::with_paths(Environment::default(), Paths::in_dir(dir.path()), None, flag).unwrap();
        assert_eq!(ctx.credential().unwrap().source, CredentialSource::Flag);

        let env = Environment {
            api_key: Secret::new("env-key"),
            ..Default::default()
        };
        let ctx = Context::with_paths(env, Paths::in_dir(dir.path()), None, Secret::new("flag-key")).unwrap();
        let resolved = ctx.credential().unwrap();
        assert_eq!(resolved.source, CredentialSource::Environment);
        assert_eq!(resolved.secret.expose(), "env-key");
    }

    #[test]
    fn transport_requires_a_credential() {
        let (ctx, _dir) = context(Environment::default(), Some("work"));
        assert!(matches!(ctx.transport(), Err(LnrError::NoCredential { .. })));
    }

    #[test]
    fn endpoint_override() {
        let env = Environment {
            api_url: Some("http://127.0.0.1:1234/graphql".into()),
            ..Default::default()
        };
        let (ctx, _dir) = context(env, None);
        assert_eq!(ctx.transport_config().endpoint, "http://127.0.0.1:1234/graphql");
    }

    #[test]
    fn cached_reads_hit_after_first_fetch() {
        let (ctx, _dir) = context(Environment::default(), None);
        let calls = Cell::new(0);
        for _ in 0..2 {
            let teams: serde_json::Value = ctx
                .cached(CacheKey::Teams, || {
                    calls.set(calls.get() + 1);
                    Ok(json!([{"key": "ENG"}]))
                })
                .unwrap();
            assert_eq!(teams[0]["key"], "ENG");
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalidate_for_drops_only_declared_keys() {
        let (ctx, _dir) = context(Environment::default(), None);
        for key in CacheKey::ALL {
            ctx.cache().set(ctx.profile_name(), key.as_str(), &1).unwrap();
        }

        ctx.invalidate_for(Mutation::ProjectCreate).unwrap();
        ctx.invalidate_for(Mutation::IssueUpdate).unwrap();

        let ttl = ctx.cache_ttl();
        let present = |key: CacheKey| ctx.cache().get::<i32>(ctx.profile_name(), key.as_str(), ttl).is_some();
        assert!(!present(CacheKey::Projects));
        assert!(present(CacheKey::Teams));
        assert!(present(CacheKey::Users));
        assert!(present(CacheKey::Labels));
    }

    #[test]
    fn profiles_do_not_share_cache() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::in_dir(dir.path());
        let work = Context::with_paths(Environment::default(), paths.clone(), Some("work"), None).unwrap();
        let home = Context::with_paths(Environment::default(), paths, Some("home"), None).unwrap();

        let _: i32 = work.cached(CacheKey::Teams, || Ok(1)).unwrap();
        let fetched = Cell::new(false);
        let _: i32 = home
            .cached(CacheKey::Teams, || {
                fetched.set(true);
                Ok(2)
            })
            .unwrap();
        assert!(fetched.get());
    }
}
