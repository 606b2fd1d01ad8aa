use std::path::Path;
use trek_core::ContextType;
use trek_filter::{ConsolidationHint, FilterRequest, FilterResult, FilterStatistics, RegistryReport};

use crate::workspace::{open_engine, print_json};

pub struct ToolsParams<'a> {
    pub repo_root: &'a Path,
    pub context: Option<&'a str>,
    pub ticket: Option<&'a str>,
    pub session: Option<&'a str>,
    pub mode: Option<&'a str>,
    pub shadow: bool,
    pub json: bool,
}

/// `trek tools`
pub fn tools(p: ToolsParams<'_>) -> anyhow::Result<()> {
    let context_type = p
        .context
        .map(|s| s.parse::<ContextType>())
        .transpose()?;
    let engine = open_engine(p.repo_root, p.mode)?;
    let result = engine.filter(FilterRequest {
        context_type,
        ticket_id: p.ticket,
        session_id: p.session,
        shadow_mode: p.shadow,
    });
    if p.json {
        print_json(&result)
    } else {
        print!("{}", render_tools(&result));
        Ok(())
    }
}

/// `trek stats`
pub fn stats(repo_root: &Path, mode: Option<&str>, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(repo_root, mode)?;
    let stats = engine.statistics();
    if json {
        print_json(&stats)
    } else {
        print!("{}", render_stats(&stats));
        Ok(())
    }
}

/// `trek report`
pub fn report(repo_root: &Path, mode: Option<&str>, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(repo_root, mode)?;
    let report = engine.report();
    if json {
        print_json(&report)
    } else {
        print!("{}", render_report(&report));
        Ok(())
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn render_tools(r: &FilterResult) -> String {
    let mut out = format!(
        "Context: {} (mode {}, filtering {})\n",
        r.context_type,
        r.mode,
        on_off(r.enabled)
    );
    out.push_str(&format!(
        "Visible: {}/{} (hidden {}, {}%)\n",
        r.visible_capabilities.len(),
        r.total_capabilities,
        r.reduced_count,
        r.reduce_percent
    ));
    for name in &r.visible_capabilities {
        out.push_str(&format!("  {name}\n"));
    }
    if let Some(hidden) = &r.hidden_capabilities {
        out.push_str("Hidden:\n");
        for name in hidden {
            out.push_str(&format!("  {name}\n"));
        }
    }
    out
}

fn render_stats(s: &FilterStatistics) -> String {
    let mut out = format!(
        "Filtering {} (mode {}, max priority {}), {} capabilities\n",
        on_off(s.enabled),
        s.mode,
        s.max_priority.as_u8(),
        s.total_capabilities
    );
    for (ct, count) in &s.by_context {
        out.push_str(&format!(
            "  {:<12} {:>3} / {:<3}\n",
            ct.as_str(),
            count.visible,
            count.total
        ));
    }
    out
}

fn render_report(r: &RegistryReport) -> String {
    let mut out = format!("{} capabilities\n\nBy category (p1/p2/p3/p4):\n", r.total);
    for (category, c) in &r.by_category {
        let [p1, p2, p3, p4] = c.by_priority;
        out.push_str(&format!(
            "  {category:<20} {:>3}  ({p1}/{p2}/{p3}/{p4})\n",
            c.count
        ));
    }
    out.push_str("\nVisible by mode:\n");
    for (ct, c) in &r.by_context {
        let modes: Vec<String> = c
            .visible_by_mode
            .iter()
            .map(|(mode, n)| format!("{mode}={n}"))
            .collect();
        out.push_str(&format!(
            "  {:<12} total={:<3} {}\n",
            ct.as_str(),
            c.total,
            modes.join(" ")
        ));
    }
    if !r.hints.is_empty() {
        out.push_str("\nConsolidation hints:\n");
        for hint in &r.hints {
            match hint {
                ConsolidationHint::LargeCategory { category, count } => {
                    out.push_str(&format!("  category {category} has {count} capabilities\n"));
                }
                ConsolidationHint::BroadAdvanced { capability } => {
                    out.push_str(&format!(
                        "  {capability} is advanced but declared in every context\n"
                    ));
                }
            }
        }
    }
    out
}
