use crate::error::RepoError;
use regex::Regex;
use std::sync::LazyLock;

static REPO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)(/tree/([^/]+)(/(.+))?)?$")
        .expect("repository URL pattern is valid")
});

/// A parsed `https://github.com/owner/repo[/tree/ref[/path]]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub git_ref: Option<String>,
    pub path: Option<String>,
}

impl RepoRef {
    pub fn parse(input: &str) -> Result<Self, RepoError> {
        let trimmed = input.trim();
        let url = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let caps = REPO_URL
            .captures(url)
            .ok_or_else(|| RepoError::InvalidIdentifier {
                input: input.to_string(),
            })?;
        Ok(RepoRef {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
            git_ref: caps.get(4).map(|m| m.as_str().to_string()),
            path: caps.get(6).map(|m| m.as_str().to_string()),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(git_ref) = &self.git_ref {
            write!(f, "@{git_ref}")?;
        }
        if let Some(path) = &self.path {
            write!(f, ":{path}")?;
        }
        Ok(())
    }
}
