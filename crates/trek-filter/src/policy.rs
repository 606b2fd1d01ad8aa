use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;
use trek_core::capability::BOOTSTRAP_CAPABILITIES;
use trek_core::{ContextType, FilterMode, Priority, Registry};

/// Override names: lowercase identifier, underscores allowed.
static OVERRIDE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// Rejected policy configuration. Never swallowed: the policy is unchanged
/// whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid filter mode: {0} (expected strict, default, permissive, or full)")]
    InvalidMode(String),
    #[error("invalid capability name for override: {0:?}")]
    InvalidOverrideName(String),
    #[error("{0} is a context-inspection capability and cannot be removed from always-show")]
    ProtectedCapability(String),
}

/// Construction-time policy options.
#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub enabled: bool,
    pub mode: FilterMode,
    pub always_show: Vec<String>,
    pub never_show: Vec<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: FilterMode::Default,
            always_show: Vec::new(),
            never_show: Vec::new(),
        }
    }
}

/// Admission policy. `max_priority` always equals `mode.max_priority()`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    pub enabled: bool,
    pub mode: FilterMode,
    pub max_priority: Priority,
    pub always_show: BTreeSet<String>,
    pub never_show: BTreeSet<String>,
}

impl FilterPolicy {
    pub fn new(options: FilterOptions) -> Result<Self, FilterError> {
        let mut policy = Self::seeded(options.enabled, options.mode);
        for name in options.always_show {
            validate_name(&name)?;
            policy.always_show.insert(name);
        }
        for name in options.never_show {
            validate_name(&name)?;
            policy.never_show.insert(name);
        }
        Ok(policy)
    }

    /// Policy with only the bootstrap always-show set and no deny list.
    pub fn seeded(enabled: bool, mode: FilterMode) -> Self {
        Self {
            enabled,
            mode,
            max_priority: mode.max_priority(),
            always_show: BOOTSTRAP_CAPABILITIES.iter().map(|s| s.to_string()).collect(),
            never_show: BTreeSet::new(),
        }
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
        self.max_priority = mode.max_priority();
    }

    /// Same policy with a different mode; used for what-if reporting.
    pub fn with_mode(&self, mode: FilterMode) -> Self {
        let mut p = self.clone();
        p.set_mode(mode);
        p
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), FilterError> {
    if OVERRIDE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(FilterError::InvalidOverrideName(name.to_string()))
    }
}

pub(crate) fn is_bootstrap(name: &str) -> bool {
    BOOTSTRAP_CAPABILITIES.contains(&name)
}

/// Capabilities visible in `context_type` under `policy`.
///
/// Disabled policies expose every registered capability. Otherwise the
/// priority-admitted set is unioned with registered always-show names and
/// then every never-show name is removed, so deny wins over allow.
pub fn visible_set(
    registry: &Registry,
    policy: &FilterPolicy,
    context_type: ContextType,
) -> BTreeSet<String> {
    if !policy.enabled {
        return registry.names();
    }
    let mut visible = registry.list_for_context(context_type, policy.max_priority);
    visible.extend(
        policy
            .always_show
            .iter()
            .filter(|name| registry.contains(name))
            .cloned(),
    );
    visible.retain(|name| !policy.never_show.contains(name));
    visible
}
