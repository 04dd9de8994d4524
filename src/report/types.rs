use crate::analysis::ExtractedMetrics;
use crate::pr::{ChangeStatus, Comment};

/// What the run found for one subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetResult {
    pub status: ChangeStatus,
    /// Number of changed files analyzed
    pub file_count: usize,
    /// Extracted metrics, or None when no PhpMetrics report exists for the subset
    pub metrics: Option<ExtractedMetrics>,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// PR number
    pub pr_number: u64,
    /// One entry per subset, modified first
    pub subsets: Vec<SubsetResult>,
    /// Markdown body that was posted
    pub body: String,
    /// The created comment
    pub comment: Comment,
}
