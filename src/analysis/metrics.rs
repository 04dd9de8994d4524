use regex::Regex;
use std::sync::LazyLock;

/// Shown in place of a metric that could not be read from a report.
pub const NOT_AVAILABLE: &str = "N/A";

pub const LACK_OF_COHESION_LABEL: &str = "Lack of cohesion of methods";
pub const CYCLOMATIC_COMPLEXITY_LABEL: &str = "Average Cyclomatic complexity by class";

static LACK_OF_COHESION: LazyLock<Regex> =
    LazyLock::new(|| metric_pattern(LACK_OF_COHESION_LABEL));
static CYCLOMATIC_COMPLEXITY: LazyLock<Regex> =
    LazyLock::new(|| metric_pattern(CYCLOMATIC_COMPLEXITY_LABEL));

/// `<label><whitespace><digits>`, capturing the digits.
fn metric_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"{}\s+(\d+)", regex::escape(label))).expect("escaped label is a valid pattern")
}

/// The two values reported on the pull request.
/// Each is the digit string printed by PhpMetrics, or `None` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMetrics {
    pub lack_of_cohesion: Option<String>,
    pub average_cyclomatic_complexity: Option<String>,
}

impl ExtractedMetrics {
    pub fn lack_of_cohesion_or_na(&self) -> &str {
        self.lack_of_cohesion.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn average_cyclomatic_complexity_or_na(&self) -> &str {
        self.average_cyclomatic_complexity
            .as_deref()
            .unwrap_or(NOT_AVAILABLE)
    }
}

/// Pull both metrics out of a `--report-cli` text report.
/// First occurrence wins; a missing label is not an error.
pub fn extract_metrics(report: &str) -> ExtractedMetrics {
    ExtractedMetrics {
        lack_of_cohesion: first_capture(&LACK_OF_COHESION, report),
        average_cyclomatic_complexity: first_capture(&CYCLOMATIC_COMPLEXITY, report),
    }
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
