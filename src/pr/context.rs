use std::path::Path;

use serde::Deserialize;

use super::types::PullRequestContext;
use super::PrError;

/// What the workflow runner tells us about the triggering event.
///
/// Built once in `main` and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub event_name: String,
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
    /// Number of the pull request in the payload, if the event has one
    pub pull_request: Option<u64>,
}

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<PayloadPullRequest>,
}

#[derive(Deserialize)]
struct PayloadPullRequest {
    number: u64,
}

impl EventContext {
    /// Read the context from the standard `GITHUB_*` runner variables.
    pub fn from_env() -> Result<EventContext, PrError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the context from any key/value source.
    ///
    /// The payload file at `GITHUB_EVENT_PATH` is optional; without it the
    /// event carries no pull request.
    pub fn from_lookup<F>(lookup: F) -> Result<EventContext, PrError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| lookup(key).ok_or(PrError::MissingEnv(key));

        let event_name = require("GITHUB_EVENT_NAME")?;
        let repository = require("GITHUB_REPOSITORY")?;
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
            .ok_or_else(|| PrError::InvalidRepository(repository.clone()))?;
        let pull_request = match lookup("GITHUB_EVENT_PATH") {
            Some(path) => read_pull_request_number(Path::new(&path))?,
            None => None,
        };

        // The checkout step needs the ref whenever there is a pull request.
        let git_ref = lookup("GITHUB_REF").filter(|r| !r.trim().is_empty());
        let git_ref = match (pull_request, git_ref) {
            (Some(_), None) => return Err(PrError::MissingEnv("GITHUB_REF")),
            (_, git_ref) => git_ref.unwrap_or_default(),
        };

        Ok(EventContext {
            event_name,
            owner: owner.to_string(),
            repo: repo.to_string(),
            git_ref,
            pull_request,
        })
    }

    /// The pull request this event refers to, or `None` for any other trigger.
    pub fn pull_request(&self) -> Option<PullRequestContext> {
        self.pull_request.map(|number| PullRequestContext {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            number,
            git_ref: self.git_ref.clone(),
        })
    }
}

fn read_pull_request_number(path: &Path) -> Result<Option<u64>, PrError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PrError::EventPayload(format!("{}: {}", path.display(), e)))?;
    let payload: EventPayload = serde_json::from_str(&raw)
        .map_err(|e| PrError::EventPayload(format!("{}: {}", path.display(), e)))?;
    Ok(payload.pull_request.map(|pr| pr.number))
}
