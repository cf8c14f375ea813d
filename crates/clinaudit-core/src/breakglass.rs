//! Memoized "is this an emergency-access user" lookup.
//!
//! One cache is built per process (or worker) and owned by the `AuditLogger`.
//! Answers are cached per user for the lifetime of the cache.  Concurrent
//! first callers for the same user may each run the lookup; they all store
//! the same answer.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use tracing::{debug, warn};

use crate::traits::RecordStore;

/// Per-user cache of breakglass group membership.
#[derive(Debug, Default)]
pub struct BreakglassCache {
    entries: RwLock<HashMap<String, bool>>,
}

impl BreakglassCache {
    /// ACL group whose members are emergency-access users.
    pub const GROUP: &'static str = "breakglass";

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `user` is in the breakglass group.
    ///
    /// An empty user is never breakglass and triggers no lookup.  A failed
    /// lookup counts as "not breakglass" and is not cached, so the next call
    /// asks the store again.
    pub fn is_breakglass_user(&self, store: &dyn RecordStore, user: &str) -> bool {
        if user.is_empty() {
            return false;
        }

        if let Some(cached) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
        {
            return *cached;
        }

        match store.is_group_member(user, Self::GROUP) {
            Ok(member) => {
                debug!(user = %user, breakglass = member, "breakglass membership cached");
                self.entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(user.to_string(), member);
                member
            }
            Err(e) => {
                warn!(user = %user, error = %e, "breakglass lookup failed; treating user as regular");
                false
            }
        }
    }
}
