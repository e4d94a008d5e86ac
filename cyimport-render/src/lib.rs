//! Rendering helpers (markdown) for human-readable artifacts.

use cyimport_types::fix::FixAction;
use cyimport_types::report::{ImportReport, RecordState, TerminalReason};

pub fn render_report_md(report: &ImportReport) -> String {
    let mut out = String::new();
    out.push_str("# cyimport report\n\n");
    out.push_str(&format!("- Target: `{}`\n", report.target));
    out.push_str(&format!("- Endpoint: `{}`\n", report.endpoint));
    out.push_str(&format!("- Run: `{}`\n", report.run.id));
    let s = &report.summary;
    out.push_str(&format!(
        "- Records: {} (succeeded {}, failed {}, unfixable {}, unattempted {})\n",
        s.total, s.succeeded, s.failed, s.unfixable, s.unattempted
    ));
    out.push_str(&format!("- Fix rounds: {}\n\n", s.fix_rounds));

    out.push_str("## Records\n\n");
    if report.records.is_empty() {
        out.push_str("_No records._\n");
        return out;
    }

    for r in &report.records {
        out.push_str(&format!("### {}. {}\n\n", r.index + 1, r.instance.name));
        out.push_str(&format!("- State: `{}`\n", state_label(r.state)));
        out.push_str(&format!(
            "- Outcome: `{}`\n",
            reason_label(r.terminal_reason)
        ));
        if r.fix_rounds > 0 {
            out.push_str(&format!("- Fix rounds: {}\n", r.fix_rounds));
        }

        if !r.instance.error_descriptions.is_empty() {
            out.push_str("\n**Errors**\n\n");
            for e in &r.instance.error_descriptions {
                out.push_str(&format!("- {}\n", e));
            }
        }

        if !r.applied_fixes.is_empty() {
            out.push_str("\n**Applied fixes**\n\n");
            for f in &r.applied_fixes {
                out.push_str(&format!(
                    "- `{}` ({}): {}\n",
                    f.rule,
                    action_label(&f.action),
                    f.explanation
                ));
            }
        }

        if let Some(suggested) = &r.suggested_fix {
            out.push_str("\n**Suggested fix**\n\n");
            for line in suggested.lines() {
                out.push_str(&format!("- {}\n", line));
            }
        }

        out.push('\n');
    }

    out
}

fn state_label(s: RecordState) -> &'static str {
    match s {
        RecordState::Unattempted => "unattempted",
        RecordState::Succeeded => "succeeded",
        RecordState::Failed => "failed",
    }
}

fn reason_label(r: TerminalReason) -> &'static str {
    match r {
        TerminalReason::Succeeded => "succeeded",
        TerminalReason::Unfixable => "unfixable",
        TerminalReason::Transport => "transport",
        TerminalReason::FixRoundsExhausted => "fix-rounds-exhausted",
        TerminalReason::AutoFixDisabled => "auto-fix-disabled",
    }
}

fn action_label(a: &FixAction) -> &'static str {
    match a {
        FixAction::RenameWithSuffix { .. } => "rename",
        FixAction::ClearReference { .. } => "clear reference",
    }
}
