//! Which cached keys each mutation makes stale.
//!
//! Both enums are closed and [`Mutation::stale_keys`] is an exhaustive
//! match, so adding a mutation forces a decision about its cache impact.
//! Issues and comments are never cached; their mutations stale nothing.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKey {
    Teams,
    Users,
    Projects,
    Labels,
}

impl CacheKey {
    pub const ALL: &'static [CacheKey] = &[
        CacheKey::Teams,
        CacheKey::Users,
        CacheKey::Projects,
        CacheKey::Labels,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::Teams => "teams",
            CacheKey::Users => "users",
            CacheKey::Projects => "projects",
            CacheKey::Labels => "labels",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    IssueCreate,
    IssueUpdate,
    IssueDelete,
    CommentCreate,
    ProjectCreate,
    ProjectUpdate,
    ProjectDelete,
    LabelCreate,
}

impl Mutation {
    pub const ALL: &'static [Mutation] = &[
        Mutation::IssueCreate,
        Mutation::IssueUpdate,
        Mutation::IssueDelete,
        Mutation::CommentCreate,
        Mutation::ProjectCreate,
        Mutation::ProjectUpdate,
        Mutation::ProjectDelete,
        Mutation::LabelCreate,
    ];

    pub fn stale_keys(self) -> &'static [CacheKey] {
        match self {
            Mutation::IssueCreate
            | Mutation::IssueUpdate
            | Mutation::IssueDelete
            | Mutation::CommentCreate => &[],
            Mutation::ProjectCreate | Mutation::ProjectUpdate | Mutation::ProjectDelete => {
                &[CacheKey::Projects]
            }
            Mutation::LabelCreate => &[CacheKey::Labels],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn declared_mapping() {
        let expected: &[(Mutation, &[CacheKey])] = &[
            (Mutation::IssueCreate, &[]),
            (Mutation::IssueUpdate, &[]),
            (Mutation::IssueDelete, &[]),
            (Mutation::CommentCreate, &[]),
            (Mutation::ProjectCreate, &[CacheKey::Projects]),
            (Mutation::ProjectUpdate, &[CacheKey::Projects]),
            (Mutation::ProjectDelete, &[CacheKey::Projects]),
            (Mutation::LabelCreate, &[CacheKey::Labels]),
        ];
        assert_eq!(expected.len(), Mutation::ALL.len());
        for (mutation, keys) in expected {
            assert_eq!(mutation.stale_keys(), *keys, "{mutation:?}");
        }
    }

    #[test]
    fn all_lists_are_complete_and_unique() {
        let keys: HashSet<_> = CacheKey::ALL.iter().collect();
        assert_eq!(keys.len(), CacheKey::ALL.len());
        let mutations: HashSet<_> = Mutation::ALL.iter().collect();
        assert_eq!(mutations.len(), Mutation::ALL.len());
    }

    #[test]
    fn cache_key_names_are_valid_and_parse_back() {
        for key in CacheKey::ALL {
            crate::paths::validate_cache_key(key.as_str()).unwrap();
            assert_eq!(CacheKey::parse(key.as_str()), Some(*key));
        }
        assert_eq!(CacheKey::parse("issues"), None);
    }
}
