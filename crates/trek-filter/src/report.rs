//! Read-only registry report: where capabilities live and what each mode shows.

use serde::Serialize;
use std::collections::BTreeMap;
use trek_core::{ContextType, FilterMode, Priority, Registry};

use crate::policy::{visible_set, FilterPolicy};

/// Categories larger than this get a consolidation hint.
pub const CONSOLIDATION_THRESHOLD: usize = 6;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub count: usize,
    /// Counts for priorities 1 through 4.
    pub by_priority: [usize; 4],
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContextReport {
    pub total: usize,
    pub visible_by_mode: BTreeMap<String, usize>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsolidationHint {
    LargeCategory { category: String, count: usize },
    BroadAdvanced { capability: String },
}

#[derive(Serialize, Debug, Clone)]
pub struct RegistryReport {
    pub total: usize,
    pub by_category: BTreeMap<String, CategoryReport>,
    pub by_context: BTreeMap<ContextType, ContextReport>,
    pub hints: Vec<ConsolidationHint>,
}

pub fn registry_report(registry: &Registry, policy: &FilterPolicy) -> RegistryReport {
    let mut by_category: BTreeMap<String, CategoryReport> = BTreeMap::new();
    let mut hints = Vec::new();

    for d in registry.iter() {
        let entry = by_category
            .entry(d.category.clone())
            .or_insert(CategoryReport {
                count: 0,
                by_priority: [0; 4],
            });
        entry.count += 1;
        entry.by_priority[usize::from(d.priority.as_u8() - 1)] += 1;

        // Rarely-needed but declared everywhere: a candidate to fold elsewhere.
        if d.priority == Priority::Advanced && d.contexts.len() == ContextType::ALL.len() {
            hints.push(ConsolidationHint::BroadAdvanced {
                capability: d.name.clone(),
            });
        }
    }

    for (category, report) in &by_category {
        if report.count > CONSOLIDATION_THRESHOLD {
            hints.push(ConsolidationHint::LargeCategory {
                category: category.clone(),
                count: report.count,
            });
        }
    }

    let by_context = ContextType::ALL
        .iter()
        .map(|&ct| {
            let visible_by_mode = FilterMode::ALL
                .iter()
                .map(|&mode| {
                    let count = visible_set(registry, &policy.with_mode(mode), ct).len();
                    (mode.to_string(), count)
                })
                .collect();
            let report = ContextReport {
                total: registry.list_for_context(ct, Priority::Advanced).len(),
                visible_by_mode,
            };
            (ct, report)
        })
        .collect();

    RegistryReport {
        total: registry.len(),
        by_category,
        by_context,
        hints,
    }
}
