//! Plain-text summary, one block per variant. Meant for terminals and logs.

use std::fmt::Write;

use crate::{ReportModel, SectionVariant};

pub fn render_text(model: &ReportModel) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, model);
    out
}

fn write_report(out: &mut String, m: &ReportModel) -> std::fmt::Result {
    writeln!(out, "{}", m.cover.title)?;
    writeln!(out, "run {}  engine {} {}", m.integrity.run_id, m.cover.engine_name, m.cover.engine_version)?;

    if m.skipped.count == 0 {
        writeln!(out, "skipped edges: 0")?;
    } else {
        let reasons: Vec<String> = m.skipped.by_reason.iter().map(|(r, n)| format!("{r}={n}")).collect();
        writeln!(out, "skipped edges: {} ({})", m.skipped.count, reasons.join(", "))?;
    }

    for v in &m.variants {
        writeln!(out)?;
        write_variant(out, v)?;
    }
    Ok(())
}

fn write_variant(out: &mut String, v: &SectionVariant) -> std::fmt::Result {
    writeln!(out, "variant {} ({})", v.variant_no, v.build)?;
    writeln!(
        out,
        "  units: {} total, {} assigned ({}), {} unknown",
        v.total_unaccounted, v.assigned_units, v.coverage_pct_1dp, v.unknown_units
    )?;
    writeln!(out, "  rows: {} over {} directions, {} owners", v.rows, v.directions, v.owners_assigned)?;
    let guard = if v.guard_exhausted { "EXHAUSTED" } else { "ok" };
    writeln!(out, "  greedy: {} steps, guard {}", v.greedy_steps, guard)?;
    if !v.top_owners.is_empty() {
        let owners: Vec<String> = v.top_owners.iter().map(|o| format!("{}={}", o.owner_id, o.units)).collect();
        writeln!(out, "  top owners: {}", owners.join(", "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_model;
    use crate::fixtures::*;

    #[test]
    fn text_report_lists_variants_in_order() {
        let m = build_model(&run_record(), &[scenario(2, 8, 0), scenario(1, 5, 3)]).unwrap();
        let t = render_text(&m);
        let v1 = t.find("variant 1 (both_only)").unwrap();
        let v2 = t.find("variant 2 (one_sided)").unwrap();
        assert!(v1 < v2);
        assert!(t.contains("skipped edges: 3 (duplicate_direction=2, invalid_direction_id=1)"));
        assert!(t.contains("  units: 8 total, 5 assigned (62.5%), 3 unknown"));
        assert!(t.contains("  top owners: 5=3, 7=2"));
        assert!(t.contains("guard ok"));
    }
}
