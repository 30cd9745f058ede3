use thiserror::Error;

/// Errors raised while building a [`crate::path_tree::PathTree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A path would make one node both a file and a directory.
    #[error("Conflicting path type at '{path}': it is used both as a file and as a directory")]
    ConflictingPathType { path: String },

    /// A path with no usable segments (e.g. "" or "/").
    #[error("Empty path in repository listing")]
    EmptyPath,
}

/// Everything that can go wrong during a user-triggered action.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(
        "Invalid GitHub repository URL '{input}'. Please ensure the URL is in the correct format: \
         https://github.com/owner/repo or https://github.com/owner/repo/tree/branch/path"
    )]
    InvalidIdentifier { input: String },

    #[error(
        "Repository, branch, or path not found. Please check that the URL, branch/tag, and path are correct and accessible."
    )]
    NotFound,

    #[error(
        "GitHub API rate limit exceeded. Please try again later or provide a valid access token to increase your rate limit."
    )]
    RateLimited,

    #[error("Access denied (status {status}). The access token is missing, invalid, or lacks permission.")]
    Unauthorized { status: u16 },

    #[error("The access token contains characters that cannot be sent in an HTTP header.")]
    InvalidToken,

    #[error("Failed to fetch repository data. Status: {status}. Please check your input and try again.")]
    RequestFailed { status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No files selected")]
    NoSelection,

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),

    #[error("Failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The user action an error interrupted. Selects the message prefix and checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    FetchRepository,
    GenerateText,
    GenerateZip,
}

impl ActionKind {
    fn heading(self) -> &'static str {
        match self {
            ActionKind::FetchRepository => "Error fetching repository contents",
            ActionKind::GenerateText => "Error generating text file",
            ActionKind::GenerateZip => "Error generating zip file",
        }
    }

    fn checklist(self) -> &'static [&'static str] {
        match self {
            ActionKind::FetchRepository => &[
                "The repository URL is correct and accessible.",
                "You have the necessary permissions to access the repository.",
                "If it's a private repository, you've provided a valid access token.",
                "The specified branch/tag and path (if any) exist in the repository.",
            ],
            ActionKind::GenerateText | ActionKind::GenerateZip => &[
                "You have selected at least one file from the directory structure.",
                "Your access token (if provided) is valid and has the necessary permissions.",
                "You have a stable internet connection.",
                "The GitHub API is accessible and functioning normally.",
            ],
        }
    }
}

/// Render an error as the single message shown in place of output.
pub fn report(action: ActionKind, error: &RepoError) -> String {
    let mut out = format!("{}: {}\n\nPlease ensure:\n", action.heading(), error);
    for (i, line) in action.checklist().iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, line));
    }
    out
}
