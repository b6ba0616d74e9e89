//! Scope registry
//!
//! Maps a caller-chosen scope name to the cancellation state shared by every
//! request issued under it. Entries are created lazily, survive individual
//! requests completing, and are removed only by [`ScopeRegistry::cancel_scope`]
//! or [`ScopeRegistry::cancel_all`].
//!
//! A scope can carry a shared [`CancelHandle`] (transports that accept a
//! signal) and/or a set of per-transaction abort callbacks (transports whose
//! every transaction has its own abort primitive). Cancelling the scope fires
//! both.

mod handle;

pub use handle::{AbortCallback, AbortSet, CancelHandle};

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

/// How a transport wants to be told about cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelModel {
    /// One handle per scope, shared by all of its requests.
    SharedSignal,
    /// Each transaction registers its own abort callback under the scope.
    AbortCallbacks,
}

/// Cancellation signal handed to a transport for one call.
#[derive(Debug)]
pub enum CancelSignal {
    Shared(CancelHandle),
    Callbacks(AbortRegistrar),
}

/// Set once when an entry is cancelled. Its `Arc` identity also tells apart
/// successive entries created under the same scope name.
type Generation = Arc<OnceLock<Option<String>>>;

#[derive(Debug, Default)]
struct ScopeEntry {
    handle: Option<CancelHandle>,
    aborts: AbortSet,
    generation: Generation,
}

impl ScopeEntry {
    fn is_generation(&self, generation: &Generation) -> bool {
        Arc::ptr_eq(&self.generation, generation)
    }

    /// Must run under the registry lock, before the entry leaves it.
    fn mark_cancelled(&self, reason: Option<&str>) {
        let _ = self.generation.set(reason.map(str::to_string));
    }

    fn cancel(mut self, reason: Option<&str>) {
        if let Some(handle) = self.handle.take() {
            handle.cancel(reason);
        }
        self.aborts.abort_all(reason);
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    // insertion ordered
    entries: Vec<(String, ScopeEntry)>,
    next_abort_id: u64,
}

impl RegistryInner {
    fn entry_or_insert(&mut self, scope: &str) -> &mut ScopeEntry {
        let idx = match self.entries.iter().position(|(name, _)| name == scope) {
            Some(idx) => idx,
            None => {
                self.entries.push((scope.to_string(), ScopeEntry::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    fn take_cancelled(&mut self, scope: &str, reason: Option<&str>) -> Option<ScopeEntry> {
        let idx = self.entries.iter().position(|(name, _)| name == scope)?;
        let (_, entry) = self.entries.remove(idx);
        entry.mark_cancelled(reason);
        Some(entry)
    }

    fn find_generation(&mut self, scope: &str, generation: &Generation) -> Option<&mut ScopeEntry> {
        self.entries
            .iter_mut()
            .find(|(name, entry)| name == scope && entry.is_generation(generation))
            .map(|(_, entry)| entry)
    }
}

/// Per-client scope → cancellation registry.
#[derive(Debug, Clone, Default)]
pub struct ScopeRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Existing handle for `scope`, or a new one stored under it.
    pub fn get_or_create_handle(&self, scope: &str) -> CancelHandle {
        let mut inner = self.lock();
        inner
            .entry_or_insert(scope)
            .handle
            .get_or_insert_with(CancelHandle::new)
            .clone()
    }

    /// Ensure `scope` exists and return a registrar through which one
    /// transaction can attach its abort callback.
    pub fn abort_registrar(&self, scope: &str) -> AbortRegistrar {
        let mut inner = self.lock();
        let generation = inner.entry_or_insert(scope).generation.clone();
        inner.next_abort_id += 1;
        AbortRegistrar {
            registry: Arc::downgrade(&self.inner),
            scope: scope.to_string(),
            generation,
            id: inner.next_abort_id,
        }
    }

    /// Attach `abort` to `scope`, creating the scope if needed.
    pub fn register_abort<F>(&self, scope: &str, abort: F) -> AbortRegistration
    where
        F: FnOnce(Option<&str>) + Send + 'static,
    {
        self.abort_registrar(scope).register(abort)
    }

    /// Signal for one call under `scope` in the given model.
    pub fn signal(&self, scope: &str, model: CancelModel) -> CancelSignal {
        match model {
            CancelModel::SharedSignal => CancelSignal::Shared(self.get_or_create_handle(scope)),
            CancelModel::AbortCallbacks => CancelSignal::Callbacks(self.abort_registrar(scope)),
        }
    }

    /// Cancel everything under `scope` and forget it. Unknown scopes are ignored.
    pub fn cancel_scope(&self, scope: &str, reason: Option<&str>) {
        let entry = self.lock().take_cancelled(scope, reason);
        if let Some(entry) = entry {
            tracing::debug!(target: "reqscope::scope", scope = %scope, reason = ?reason, "cancelling scope");
            entry.cancel(reason);
        }
    }

    /// [`cancel_scope`](Self::cancel_scope) without a reason for each name.
    pub fn cancel_scopes<I, S>(&self, scopes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for scope in scopes {
            self.cancel_scope(scope.as_ref(), None);
        }
    }

    /// Cancel every registered scope, then clear the registry.
    pub fn cancel_all(&self) {
        let entries = {
            let mut inner = self.lock();
            for (_, entry) in &inner.entries {
                entry.mark_cancelled(None);
            }
            std::mem::take(&mut inner.entries)
        };
        tracing::debug!(target: "reqscope::scope", count = entries.len(), "cancelling all scopes");
        for (_, entry) in entries {
            entry.cancel(None);
        }
    }

    /// Snapshot of scope names in insertion order.
    pub fn list_scopes(&self) -> Vec<String> {
        self.lock()
            .entries
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.lock().entries.iter().any(|(name, _)| name == scope)
    }

    /// Number of abort callbacks currently registered under `scope`.
    pub fn pending_aborts(&self, scope: &str) -> usize {
        self.lock()
            .entries
            .iter()
            .find(|(name, _)| name == scope)
            .map(|(_, entry)| entry.aborts.len())
            .unwrap_or(0)
    }
}

/// Lets one transaction attach its abort callback to a scope.
///
/// Bound to the scope entry that existed when it was created: if that entry
/// is cancelled before [`register`](Self::register), a newer entry under the
/// same name is never joined.
#[derive(Debug)]
pub struct AbortRegistrar {
    registry: Weak<Mutex<RegistryInner>>,
    scope: String,
    generation: Generation,
    id: u64,
}

impl AbortRegistrar {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Store `abort` under the scope. The returned guard removes it again on
    /// drop, so settled transactions do not accumulate; the scope stays.
    ///
    /// If the scope was cancelled between resolving this registrar and the
    /// call, `abort` is invoked immediately with that cancel's reason.
    pub fn register<F>(self, abort: F) -> AbortRegistration
    where
        F: FnOnce(Option<&str>) + Send + 'static,
    {
        let registration = AbortRegistration {
            registry: self.registry,
            scope: self.scope,
            generation: self.generation,
            id: self.id,
        };

        let attached = match registration.registry.upgrade() {
            Some(inner) => {
                let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
                match guard.find_generation(&registration.scope, &registration.generation) {
                    Some(entry) => {
                        entry.aborts.insert(registration.id, Box::new(abort));
                        None
                    }
                    None => Some(abort),
                }
            }
            None => Some(abort),
        };

        if let Some(abort) = attached {
            let reason = registration.generation.get().cloned().flatten();
            abort(reason.as_deref());
        }
        registration
    }
}

/// Guard for a registered abort callback.
#[derive(Debug)]
pub struct AbortRegistration {
    registry: Weak<Mutex<RegistryInner>>,
    scope: String,
    generation: Generation,
    id: u64,
}

impl Drop for AbortRegistration {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = guard.find_generation(&self.scope, &self.generation) {
            entry.aborts.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn same_scope_shares_one_handle() {
        let registry = ScopeRegistry::new();
        let a = registry.get_or_create_handle("page");
        let b = registry.get_or_create_handle("page");
        assert!(a.same_as(&b));
        assert_eq!(registry.list_scopes(), vec!["page".to_string()]);
    }

    #[test]
    fn cancel_scope_cancels_and_forgets() {
        let registry = ScopeRegistry::new();
        let handle = registry.get_or_create_handle("page");
        registry.cancel_scope("page", Some("left page"));

        assert!(handle.is_cancelled());
        assert_eq!(handle.reason().as_deref(), Some("left page"));
        assert!(!registry.contains("page"));

        let fresh = registry.get_or_create_handle("page");
        assert!(!fresh.is_cancelled());
        assert!(!fresh.same_as(&handle));
    }

    #[test]
    fn unknown_scopes_are_ignored() {
        let registry = ScopeRegistry::new();
        let kept = registry.get_or_create_handle("kept");
        registry.cancel_scope("missing", None);
        registry.cancel_scopes(["missing", "also-missing"]);
        assert!(!kept.is_cancelled());
        assert_eq!(registry.list_scopes(), vec!["kept".to_string()]);
    }

    #[test]
    fn cancel_scopes_only_touches_named() {
        let registry = ScopeRegistry::new();
        let a = registry.get_or_create_handle("a");
        let b = registry.get_or_create_handle("b");
        let c = registry.get_or_create_handle("c");
        registry.cancel_scopes(vec!["a".to_string(), "c".to_string()]);
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(c.is_cancelled());
        assert_eq!(registry.list_scopes(), vec!["b".to_string()]);
    }

    #[test]
    fn cancel_all_clears_registry() {
        let registry = ScopeRegistry::new();
        let handles: Vec<_> = ["x", "y", "z"]
            .iter()
            .map(|s| registry.get_or_create_handle(s))
            .collect();
        registry.cancel_all();
        assert!(handles.iter().all(CancelHandle::is_cancelled));
        assert!(registry.list_scopes().is_empty());
    }

    #[test]
    fn list_scopes_keeps_insertion_order() {
        let registry = ScopeRegistry::new();
        for s in ["b", "a", "c", "a"] {
            registry.get_or_create_handle(s);
        }
        assert_eq!(registry.list_scopes(), vec!["b", "a", "c"]);
    }

    #[test]
    fn abort_callbacks_fire_on_cancel_with_reason() {
        let registry = ScopeRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let reasons = Arc::new(Mutex::new(Vec::new()));

        let mut guards = Vec::new();
        for _ in 0..2 {
            let hits = hits.clone();
            let reasons = reasons.clone();
            guards.push(registry.abort_registrar("upload").register(move |reason| {
                hits.fetch_add(1, Ordering::SeqCst);
                reasons.lock().unwrap().push(reason.map(str::to_string));
            }));
        }
        assert_eq!(registry.pending_aborts("upload"), 2);

        registry.cancel_scope("upload", Some("user"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(
            *reasons.lock().unwrap(),
            vec![Some("user".to_string()), Some("user".to_string())]
        );
        assert!(!registry.contains("upload"));
        drop(guards);
    }

    #[test]
    fn dropped_registration_removes_only_its_callback() {
        let registry = ScopeRegistry::new();
        let first = registry.abort_registrar("s").register(|_| {});
        let second = registry.register_abort("s", |_| {});
        assert_eq!(registry.pending_aborts("s"), 2);

        drop(first);
        assert_eq!(registry.pending_aborts("s"), 1);
        drop(second);
        assert_eq!(registry.pending_aborts("s"), 0);
        assert!(registry.contains("s"));
    }

    #[test]
    fn registering_after_cancel_aborts_immediately() {
        let registry = ScopeRegistry::new();
        let registrar = registry.abort_registrar("gone");
        registry.cancel_scope("gone", None);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _guard = registrar.register(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!registry.contains("gone"));
    }

    #[test]
    fn late_registration_sees_cancel_reason() {
        let registry = ScopeRegistry::new();
        let registrar = registry.abort_registrar("s");
        registry.cancel_scope("s", Some("left page"));

        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        let _guard = registrar.register(move |reason| {
            *slot.lock().unwrap() = Some(reason.map(str::to_string));
        });
        assert_eq!(*seen.lock().unwrap(), Some(Some("left page".to_string())));
    }

    #[test]
    fn registrar_never_joins_a_recreated_scope() {
        let registry = ScopeRegistry::new();
        let stale = registry.abort_registrar("s");
        registry.cancel_scope("s", Some("left page"));
        // another request brings the scope back before `stale` registers
        let fresh = registry.register_abort("s", |_| {});

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let stale = stale.register(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending_aborts("s"), 1);

        // dropping the stale guard leaves the new entry alone
        drop(stale);
        assert_eq!(registry.pending_aborts("s"), 1);
        drop(fresh);
        assert_eq!(registry.pending_aborts("s"), 0);
    }

    #[test]
    fn cancel_all_marks_late_registrations() {
        let registry = ScopeRegistry::new();
        let registrar = registry.abort_registrar("s");
        registry.cancel_all();

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _guard = registrar.register(move |reason| {
            assert_eq!(reason, None);
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(registry.list_scopes().is_empty());
    }

    #[test]
    fn signal_follows_model() {
        let registry = ScopeRegistry::new();
        assert!(matches!(
            registry.signal("s", CancelModel::SharedSignal),
            CancelSignal::Shared(_)
        ));
        assert!(matches!(
            registry.signal("s", CancelModel::AbortCallbacks),
            CancelSignal::Callbacks(_)
        ));
        assert_eq!(registry.list_scopes(), vec!["s".to_string()]);
    }
}
