//! Process label rules.

use super::{labels, Label, LintResult, NativeRule};
use reft_nf::{Module, Process};

/// The resource labels nf-core pipelines configure.
pub const STANDARD_LABELS: &[&str] = &[
    "process_single",
    "process_low",
    "process_medium",
    "process_high",
    "process_long",
    "process_high_memory",
];

fn is_standard(label: &str) -> bool {
    STANDARD_LABELS.contains(&label)
}

/// Renders names as `[a b c]`.
fn name_list(labels: &[Label<'_>]) -> String {
    let names: Vec<&str> = labels.iter().map(|l| l.name).collect();
    format!("[{}]", names.join(" "))
}

/// More than one standard label on a process.
pub struct ConflictingLabels;

impl NativeRule for ConflictingLabels {
    fn id(&self) -> &'static str {
        "conflicting-labels"
    }

    fn description(&self) -> &'static str {
        "A process should carry at most one standard resource label"
    }

    fn check_process(&self, module: &Module, process: &Process) -> LintResult {
        let standard: Vec<_> = labels(process)
            .into_iter()
            .filter(|l| is_standard(l.name))
            .collect();
        match standard.last() {
            Some(last) if standard.len() > 1 => LintResult::warning(
                module,
                last.line,
                format!(
                    "process '{}' has conflicting labels: {}",
                    process.name,
                    name_list(&standard)
                ),
            ),
            _ => LintResult::default(),
        }
    }
}

pub struct NoStandardLabel;

impl NativeRule for NoStandardLabel {
    fn id(&self) -> &'static str {
        "no-standard-label"
    }

    fn description(&self) -> &'static str {
        "A process should carry one of the standard resource labels"
    }

    fn check_process(&self, module: &Module, process: &Process) -> LintResult {
        if labels(process).iter().any(|l| is_standard(l.name)) {
            return LintResult::default();
        }
        LintResult::warning(
            module,
            process.line,
            format!("process '{}' has no standard label", process.name),
        )
    }
}

pub struct NonStandardLabel;

impl NativeRule for NonStandardLabel {
    fn id(&self) -> &'static str {
        "non-standard-label"
    }

    fn description(&self) -> &'static str {
        "Labels outside the standard resource set"
    }

    fn check_process(&self, module: &Module, process: &Process) -> LintResult {
        let other: Vec<_> = labels(process)
            .into_iter()
            .filter(|l| !is_standard(l.name))
            .collect();
        match other.first() {
            Some(first) => LintResult::warning(
                module,
                first.line,
                format!(
                    "process '{}' has non-standard labels: {}",
                    process.name,
                    name_list(&other)
                ),
            ),
            None => LintResult::default(),
        }
    }
}

/// The same label given twice. Reported once per label name, at its first
/// occurrence.
pub struct DuplicateLabels;

impl NativeRule for DuplicateLabels {
    fn id(&self) -> &'static str {
        "duplicate-labels"
    }

    fn description(&self) -> &'static str {
        "A label should be given at most once per process"
    }

    fn check_label(&self, module: &Module, process: &Process, label: Label<'_>) -> LintResult {
        let all = labels(process);
        let first = all.iter().find(|l| l.name == label.name).map(|l| l.index);
        let count = all.iter().filter(|l| l.name == label.name).count();
        if count < 2 || first != Some(label.index) {
            return LintResult::default();
        }
        LintResult::warning(
            module,
            process.line,
            format!(
                "process '{}' has duplicate label '{}' ({} times)",
                process.name, label.name, count
            ),
        )
    }
}

pub struct NoLabels;

impl NativeRule for NoLabels {
    fn id(&self) -> &'static str {
        "no-labels"
    }

    fn description(&self) -> &'static str {
        "A process should carry at least one label"
    }

    fn check_process(&self, module: &Module, process: &Process) -> LintResult {
        if labels(process).is_empty() {
            LintResult::warning(
                module,
                process.line,
                format!("process '{}' has no labels", process.name),
            )
        } else {
            LintResult::default()
        }
    }
}

pub struct LabelAlphanumerics;

impl NativeRule for LabelAlphanumerics {
    fn id(&self) -> &'static str {
        "label-alphanumerics"
    }

    fn description(&self) -> &'static str {
        "Labels should only use letters, digits and underscores"
    }

    fn check_label(&self, module: &Module, _process: &Process, label: Label<'_>) -> LintResult {
        if label.name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return LintResult::default();
        }
        LintResult::warning(
            module,
            label.line,
            format!(
                "process label '{}' contains non-alphanumeric characters (only letters, numbers and underscores recommended)",
                label.name
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{LintReport, NativeLinter};
    use reft_nf::ModuleBuilder;

    fn run(rule: impl NativeRule + 'static, labels: &[&str]) -> LintReport {
        let mut source = String::from("process FOO {\n");
        for label in labels {
            source.push_str(&format!("    label '{}'\n", label));
        }
        source.push_str("    script:\n    'echo'\n}\n");
        let module = ModuleBuilder::new("/p/main.nf").build_source(&source).unwrap();
        NativeLinter::empty().with_rule(rule).lint(&[module])
    }

    fn messages(report: &LintReport) -> Vec<&str> {
        report.warnings.iter().map(|w| w.message.as_str()).collect()
    }

    #[test]
    fn test_conflicting_labels() {
        assert!(run(ConflictingLabels, &["process_single"]).warnings.is_empty());
        assert!(run(ConflictingLabels, &["custom", "another"]).warnings.is_empty());

        let report = run(ConflictingLabels, &["process_single", "process_high"]);
        assert_eq!(
            messages(&report),
            vec!["process 'FOO' has conflicting labels: [process_single process_high]"]
        );
        assert_eq!(report.warnings[0].line, 3);
    }

    #[test]
    fn test_no_standard_label() {
        assert!(run(NoStandardLabel, &["process_low"]).warnings.is_empty());
        let report = run(NoStandardLabel, &["custom"]);
        assert_eq!(messages(&report), vec!["process 'FOO' has no standard label"]);
        assert_eq!(report.warnings[0].line, 1);
    }

    #[test]
    fn test_non_standard_label() {
        let report = run(NonStandardLabel, &["process_low", "gpu", "big_mem"]);
        assert_eq!(
            messages(&report),
            vec!["process 'FOO' has non-standard labels: [gpu big_mem]"]
        );
        assert_eq!(report.warnings[0].line, 3);
    }

    #[test]
    fn test_duplicate_labels() {
        let report = run(DuplicateLabels, &["a", "b", "a", "b", "a"]);
        assert_eq!(
            messages(&report),
            vec![
                "process 'FOO' has duplicate label 'a' (3 times)",
                "process 'FOO' has duplicate label 'b' (2 times)",
            ]
        );
        assert!(run(DuplicateLabels, &["a", "b"]).warnings.is_empty());
    }

    #[test]
    fn test_no_labels() {
        assert_eq!(
            messages(&run(NoLabels, &[])),
            vec!["process 'FOO' has no labels"]
        );
        assert!(run(NoLabels, &["x"]).warnings.is_empty());
    }

    #[test]
    fn test_label_alphanumerics() {
        let report = run(LabelAlphanumerics, &["process_low", "high-mem"]);
        assert_eq!(
            messages(&report),
            vec!["process label 'high-mem' contains non-alphanumeric characters (only letters, numbers and underscores recommended)"]
        );
        assert_eq!(report.warnings[0].line, 3);
    }
}
