use serde::Deserialize;

/// Identifies the pull request this run reports on.
/// Built from the event context; read-only for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    /// PR number (e.g., 42)
    pub number: u64,
    /// Ref the workflow was triggered for (e.g., refs/pull/42/merge)
    pub git_ref: String,
}

/// Change status reported by the pull request files endpoint.
/// Only `added` and `modified` are analyzed; `removed`, `renamed` and the
/// rest collapse into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    #[serde(other)]
    Other,
}

/// A single file entry from `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub status: FileStatus,
}

/// The two buckets changed files are analyzed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    Modified,
    Added,
}

impl ChangeStatus {
    /// Buckets in reporting order.
    pub const ALL: [ChangeStatus; 2] = [ChangeStatus::Modified, ChangeStatus::Added];

    /// Lower-case name used in file names and sentences ("modified", "added").
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeStatus::Modified => "modified",
            ChangeStatus::Added => "added",
        }
    }

    /// Capitalized name used in headings ("Modified", "Added").
    pub fn title(self) -> &'static str {
        match self {
            ChangeStatus::Modified => "Modified",
            ChangeStatus::Added => "Added",
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Changed source files split by status. A file is in at most one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedSubsets {
    pub modified: Vec<String>,
    pub added: Vec<String>,
}

impl ChangedSubsets {
    pub fn files(&self, status: ChangeStatus) -> &[String] {
        match status {
            ChangeStatus::Modified => &self.modified,
            ChangeStatus::Added => &self.added,
        }
    }

    /// Space-separated file names, as shown in the run log.
    pub fn joined(&self, status: ChangeStatus) -> String {
        self.files(status).join(" ")
    }
}

/// A comment created on the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub html_url: String,
}
