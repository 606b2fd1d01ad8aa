use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use trek_core::{ContextType, FilterMode, Registry, TicketStatus};
use trek_filter::{visible_set, FilterEngine, FilterOptions, FilterRequest};
use trek_store::SqliteStore;

fn engine(options: FilterOptions) -> FilterEngine<SqliteStore> {
    FilterEngine::new(SqliteStore::open_in_memory().unwrap(), options).unwrap()
}

fn preview(ct: ContextType) -> FilterRequest<'static> {
    FilterRequest {
        context_type: Some(ct),
        ..Default::default()
    }
}

fn visible(e: &FilterEngine<SqliteStore>, ct: ContextType) -> BTreeSet<String> {
    e.filter(preview(ct)).visible_capabilities.into_iter().collect()
}

#[test]
fn modes_are_monotonic_in_every_context() {
    let e = engine(FilterOptions {
        always_show: vec!["backup_database".into()],
        never_show: vec!["get_help".into()],
        ..Default::default()
    });
    for ct in ContextType::ALL {
        let mut previous: Option<BTreeSet<String>> = None;
        for mode in FilterMode::ALL {
            e.set_mode(mode.as_str()).unwrap();
            let current = visible(&e, ct);
            if let Some(prev) = &previous {
                assert!(prev.is_subset(&current), "{ct}: {mode} lost capabilities");
            }
            previous = Some(current);
        }
    }
}

#[test]
fn deny_wins_over_allow() {
    let e = engine(FilterOptions {
        always_show: vec!["list_tickets".into()],
        never_show: vec!["list_tickets".into()],
        ..Default::default()
    });
    for ct in ContextType::ALL {
        assert!(!visible(&e, ct).contains("list_tickets"));
        assert!(!e.is_visible("list_tickets", preview(ct)));
    }
}

#[test]
fn disabled_filtering_fails_open() {
    let e = engine(FilterOptions {
        mode: FilterMode::Strict,
        never_show: vec!["list_tickets".into(), "delete_ticket".into()],
        ..Default::default()
    });
    e.set_enabled(false);
    for d in Registry::builtin().iter() {
        assert!(e.is_visible(&d.name, FilterRequest::default()), "{}", d.name);
    }
    let result = e.filter(preview(ContextType::Review));
    assert_eq!(result.visible_capabilities.len(), result.total_capabilities);
    assert_eq!(result.reduced_count, 0);
    assert!(!result.enabled);
}

#[test]
fn shadow_mode_partitions_registry() {
    let e = engine(FilterOptions {
        never_show: vec!["get_ticket".into()],
        ..Default::default()
    });
    for ct in ContextType::ALL {
        let plain = e.filter(preview(ct));
        let shadow = e.filter(FilterRequest {
            context_type: Some(ct),
            shadow_mode: true,
            ..Default::default()
        });
        // Observing never changes enforcement.
        assert_eq!(plain.visible_capabilities, shadow.visible_capabilities);

        let visible: BTreeSet<String> = shadow.visible_capabilities.iter().cloned().collect();
        let hidden: BTreeSet<String> = shadow.hidden_capabilities.unwrap().into_iter().collect();
        assert!(visible.is_disjoint(&hidden));
        let union: BTreeSet<String> = visible.union(&hidden).cloned().collect();
        assert_eq!(union, Registry::builtin().names());
    }
}

#[test]
fn default_mode_priority_scenario() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .insert_ticket("t1", None, None, TicketStatus::InProgress)
        .unwrap();
    let e = FilterEngine::new(store, FilterOptions::default()).unwrap();
    let req = FilterRequest {
        ticket_id: Some("t1"),
        ..Default::default()
    };
    let result = e.filter(req);
    assert_eq!(result.context_type, ContextType::TicketWork);
    assert!(e.is_visible("list_tickets", req));
    assert!(!e.is_visible("link_files_to_ticket", req));

    e.set_mode("permissive").unwrap();
    assert!(e.is_visible("link_files_to_ticket", req));
}

#[test]
fn bogus_mode_leaves_policy_unchanged() {
    let e = engine(FilterOptions::default());
    let before = e.policy();
    assert!(e.set_mode("bogus").is_err());
    assert_eq!(e.policy(), before);
}

#[test]
fn reduce_percent_matches_counts() {
    let e = engine(FilterOptions {
        mode: FilterMode::Strict,
        ..Default::default()
    });
    let r = e.filter(preview(ContextType::Planning));
    let expected = (r.reduced_count * 100 + r.total_capabilities / 2) / r.total_capabilities;
    assert_eq!(r.reduce_percent as usize, expected);
    assert!(r.reduce_percent > 0);
}

#[test]
fn concurrent_mode_changes_never_mix_thresholds() {
    let e = Arc::new(engine(FilterOptions::default()));
    let registry = Registry::builtin();

    let writer = {
        let e = Arc::clone(&e);
        thread::spawn(move || {
            for i in 0..200 {
                let mode = FilterMode::ALL[i % FilterMode::ALL.len()];
                e.set_mode(mode.as_str()).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let e = Arc::clone(&e);
            thread::spawn(move || {
                for _ in 0..100 {
                    let r = e.filter(preview(ContextType::TicketWork));
                    let policy = e.policy().with_mode(r.mode);
                    let expected: Vec<String> =
                        visible_set(registry, &policy, ContextType::TicketWork)
                            .into_iter()
                            .collect();
                    assert_eq!(r.visible_capabilities, expected);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
}
