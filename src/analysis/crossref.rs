//! Cross-reference index from pull-request text to the proposal numbers the
//! text claims to close.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::model::{PullRequest, PullRequestState};

static CLOSING_KEYWORD: OnceLock<Regex> = OnceLock::new();

// "fixes #12", "Closed #3", "resolve #9" and the other closing-keyword forms.
fn closing_keyword() -> &'static Regex {
    CLOSING_KEYWORD.get_or_init(|| {
        Regex::new(r"(?i)(?:fix(?:e[sd])?|close[sd]?|resolve[sd]?)\s+#(\d+)")
            .expect("closing-keyword pattern is valid")
    })
}

/// Mapping from `(repository, issue number)` to the distinct pull requests
/// whose title or body references it with a closing keyword.
#[derive(Debug, Default)]
pub struct CrossReferenceIndex {
    links: HashMap<(String, u64), Vec<PullRequest>>,
}

impl CrossReferenceIndex {
    /// Scan every PR's title and body. Untagged PRs are scoped to
    /// `default_repo` so number collisions across repositories stay separate.
    pub fn build(pull_requests: &[PullRequest], default_repo: &str) -> Self {
        let mut links: HashMap<(String, u64), Vec<PullRequest>> = HashMap::new();

        for pr in pull_requests {
            let repo = pr.repo_tag(default_repo).to_string();
            let text = match &pr.body {
                Some(body) => format!("{}\n{}", pr.title, body),
                None => pr.title.clone(),
            };

            for captures in closing_keyword().captures_iter(&text) {
                let number = match captures.get(1).and_then(|m| m.as_str().parse::<u64>().ok()) {
                    Some(n) => n,
                    None => continue,
                };

                let bucket = links.entry((repo.clone(), number)).or_default();
                let duplicate = bucket
                    .iter()
                    .any(|existing| existing.number == pr.number);
                if !duplicate {
                    bucket.push(pr.clone());
                }
            }
        }

        debug!(buckets = links.len(), "cross-reference index built");
        Self { links }
    }

    /// All PRs referencing `(repo, number)`, in snapshot order.
    pub fn linked(&self, repo: &str, number: u64) -> &[PullRequest] {
        self.links
            .get(&(repo.to_string(), number))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn open_linked(&self, repo: &str, number: u64) -> Vec<&PullRequest> {
        self.linked_in_states(repo, number, &[PullRequestState::Open])
    }

    pub fn merged_linked(&self, repo: &str, number: u64) -> Vec<&PullRequest> {
        self.linked_in_states(repo, number, &[PullRequestState::Merged])
    }

    pub fn open_or_merged_linked(&self, repo: &str, number: u64) -> Vec<&PullRequest> {
        self.linked_in_states(
            repo,
            number,
            &[PullRequestState::Open, PullRequestState::Merged],
        )
    }

    fn linked_in_states(
        &self,
        repo: &str,
        number: u64,
        states: &[PullRequestState],
    ) -> Vec<&PullRequest> {
        self.linked(repo, number)
            .iter()
            .filter(|pr| states.contains(&pr.state))
            .collect()
    }
}
