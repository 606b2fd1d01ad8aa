use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use trek_context::{infer_context, InferRequest};
use trek_core::{Context, ContextType, FilterMode, Priority, Registry};
use trek_store::{TrackerStore, TrekConfig};

use crate::policy::{is_bootstrap, validate_name, visible_set, FilterError, FilterOptions, FilterPolicy};
use crate::report::{registry_report, RegistryReport};

/// Arguments to [`FilterEngine::filter`] and [`FilterEngine::is_visible`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterRequest<'a> {
    /// Preview this context instead of inferring one from live state.
    pub context_type: Option<ContextType>,
    pub ticket_id: Option<&'a str>,
    pub session_id: Option<&'a str>,
    /// Also report the hidden complement. Never changes what is visible.
    pub shadow_mode: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct FilterResult {
    pub context: Context,
    pub context_type: ContextType,
    /// Sorted ascending by name.
    pub visible_capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_capabilities: Option<Vec<String>>,
    pub total_capabilities: usize,
    pub reduced_count: usize,
    pub reduce_percent: u32,
    pub mode: FilterMode,
    pub enabled: bool,
    pub shadow_mode: bool,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextCount {
    pub visible: usize,
    pub total: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct FilterStatistics {
    pub enabled: bool,
    pub mode: FilterMode,
    pub max_priority: Priority,
    pub total_capabilities: usize,
    pub by_context: BTreeMap<ContextType, ContextCount>,
}

/// Stateful capability filter.
///
/// The policy lives behind a single mutex. Every read takes one consistent
/// snapshot, so a concurrent mode change is seen either entirely or not at all.
pub struct FilterEngine<S> {
    store: S,
    registry: Registry,
    policy: Mutex<FilterPolicy>,
}

impl<S: TrackerStore> FilterEngine<S> {
    /// Engine over the built-in registry.
    pub fn new(store: S, options: FilterOptions) -> Result<Self, FilterError> {
        Self::with_registry(store, Registry::builtin().clone(), options)
    }

    pub fn with_registry(
        store: S,
        registry: Registry,
        options: FilterOptions,
    ) -> Result<Self, FilterError> {
        let policy = FilterPolicy::new(options)?;
        debug!(
            enabled = policy.enabled,
            mode = %policy.mode,
            capabilities = registry.len(),
            "capability filter initialized"
        );
        Ok(Self {
            store,
            registry,
            policy: Mutex::new(policy),
        })
    }

    /// Engine seeded from the persisted config flag, default mode, no overrides.
    pub fn from_config(store: S, config: &TrekConfig) -> Self {
        let policy = FilterPolicy::seeded(config.capability_filtering, FilterMode::default());
        debug!(enabled = policy.enabled, "capability filter seeded from config");
        Self {
            store,
            registry: Registry::builtin().clone(),
            policy: Mutex::new(policy),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, FilterPolicy> {
        // Mutators validate before touching the policy, so a poisoned guard
        // still holds a coherent value.
        self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current policy.
    pub fn policy(&self) -> FilterPolicy {
        self.lock().clone()
    }

    // ── Queries ──

    pub fn filter(&self, req: FilterRequest<'_>) -> FilterResult {
        let policy = self.policy();
        self.filter_with(&policy, req)
    }

    fn filter_with(&self, policy: &FilterPolicy, req: FilterRequest<'_>) -> FilterResult {
        let context = match req.context_type {
            Some(ct) => Context::explicit(ct),
            None => infer_context(
                &self.store,
                InferRequest {
                    ticket_id: req.ticket_id,
                    project_id: None,
                    session_id: req.session_id,
                },
            ),
        };
        let context_type = context.context_type;

        let visible = visible_set(&self.registry, policy, context_type);
        let total = self.registry.len();
        let reduced = total.saturating_sub(visible.len());

        let hidden = req.shadow_mode.then(|| {
            self.registry
                .names()
                .into_iter()
                .filter(|name| !visible.contains(name))
                .collect::<Vec<_>>()
        });

        debug!(
            context = %context_type,
            visible = visible.len(),
            total,
            mode = %policy.mode,
            "capabilities filtered"
        );

        FilterResult {
            context,
            context_type,
            visible_capabilities: visible.into_iter().collect(),
            hidden_capabilities: hidden,
            total_capabilities: total,
            reduced_count: reduced,
            reduce_percent: percent_round_half_up(reduced, total),
            mode: policy.mode,
            enabled: policy.enabled,
            shadow_mode: req.shadow_mode,
        }
    }

    /// Whether `name` is visible. Always true while filtering is disabled.
    pub fn is_visible(&self, name: &str, req: FilterRequest<'_>) -> bool {
        let policy = self.policy();
        if !policy.enabled {
            return true;
        }
        if policy.never_show.contains(name) {
            return false;
        }
        if policy.always_show.contains(name) {
            return true;
        }
        self.filter_with(&policy, req)
            .visible_capabilities
            .binary_search_by(|n| n.as_str().cmp(name))
            .is_ok()
    }

    /// Per-context counts from the registry and current policy alone.
    pub fn statistics(&self) -> FilterStatistics {
        let policy = self.policy();
        let by_context = ContextType::ALL
            .iter()
            .map(|&ct| {
                let total = self.registry.list_for_context(ct, Priority::Advanced).len();
                let visible = visible_set(&self.registry, &policy, ct).len();
                (ct, ContextCount { visible, total })
            })
            .collect();
        FilterStatistics {
            enabled: policy.enabled,
            mode: policy.mode,
            max_priority: policy.max_priority,
            total_capabilities: self.registry.len(),
            by_context,
        }
    }

    pub fn report(&self) -> RegistryReport {
        registry_report(&self.registry, &self.policy())
    }

    // ── Mutators ──

    /// Switch mode by name. Unknown names are rejected and leave the policy unchanged.
    pub fn set_mode(&self, mode: &str) -> Result<FilterMode, FilterError> {
        let parsed: FilterMode = mode.parse().map_err(|_| {
            warn!(mode, "rejected unknown filter mode");
            FilterError::InvalidMode(mode.to_string())
        })?;
        let mut policy = self.lock();
        let previous = policy.mode;
        policy.set_mode(parsed);
        info!(from = %previous, to = %parsed, "filter mode changed");
        Ok(parsed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
        info!(enabled, "capability filtering toggled");
    }

    pub fn add_always_show(&self, name: &str) -> Result<(), FilterError> {
        validate_override(name)?;
        self.lock().always_show.insert(name.to_string());
        info!(name, "added always-show override");
        Ok(())
    }

    /// Returns whether the name was present.
    pub fn remove_always_show(&self, name: &str) -> Result<bool, FilterError> {
        validate_override(name)?;
        if is_bootstrap(name) {
            warn!(name, "refused to remove context-inspection capability from always-show");
            return Err(FilterError::ProtectedCapability(name.to_string()));
        }
        Ok(self.lock().always_show.remove(name))
    }

    pub fn add_never_show(&self, name: &str) -> Result<(), FilterError> {
        validate_override(name)?;
        if is_bootstrap(name) {
            warn!(name, "never-show on a context-inspection capability hides it everywhere");
        }
        self.lock().never_show.insert(name.to_string());
        info!(name, "added never-show override");
        Ok(())
    }

    /// Returns whether the name was present.
    pub fn remove_never_show(&self, name: &str) -> Result<bool, FilterError> {
        validate_override(name)?;
        Ok(self.lock().never_show.remove(name))
    }
}

fn validate_override(name: &str) -> Result<(), FilterError> {
    validate_name(name).inspect_err(|_| warn!(name, "rejected malformed override name"))
}

/// `round(part / whole * 100)` with halves rounded up; 0 for an empty whole.
fn percent_round_half_up(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part * 200 + whole) / (whole * 2)) as u32
}
