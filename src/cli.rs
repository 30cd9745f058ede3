use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// ghyank – pick files from a GitHub repository and yank them as one prompt
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// https://github.com/owner/repo, optionally with /tree/<ref>[/<path>]
    #[arg(value_name = "URL")]
    pub url: String,

    /// GitHub access token for private repositories and higher rate limits
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Comma-separated extensions selected by default (no dot).
    #[arg(long = "common-ext", value_delimiter = ',', value_name = "EXTENSIONS")]
    pub common_ext: Vec<String>,

    /// Glob patterns to preselect files (e.g., "src/**/*.rs").
    /// Paths are relative to the requested repository path.
    /// Can be specified multiple times.
    #[arg(long, value_name = "PATTERN")]
    pub select: Vec<String>,

    /// Comma-separated extensions whose files are preselected.
    #[arg(long = "select-ext", value_delimiter = ',', value_name = "EXTENSIONS")]
    pub select_ext: Vec<String>,

    /// Skip the TUI: use the default and preselected files and exit.
    #[arg(long)]
    pub headless: bool,

    /// Save the formatted text to FILE (prompt.txt when no FILE is given).
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub output: Option<Option<PathBuf>>,

    /// Write the selected files to a zip archive (partial_repo.zip when no FILE is given).
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub zip: Option<Option<PathBuf>>,

    /// Print the formatted text to stdout instead of copying it.
    #[arg(long)]
    pub dry_run: bool,

    /// Read settings from this TOML file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_file_values() {
        let cli = Cli::try_parse_from([
            "ghyank",
            "https://github.com/o/r",
            "--zip",
            "--output",
            "out.txt",
        ])
        .unwrap();
        assert_eq!(cli.zip, Some(None));
        assert_eq!(cli.output, Some(Some(PathBuf::from("out.txt"))));
    }

    #[test]
    fn repeated_and_delimited_selectors() {
        let cli = Cli::try_parse_from([
            "ghyank",
            "https://github.com/o/r",
            "--select",
            "src/**/*.rs",
            "--select",
            "*.md",
            "--select-ext",
            "toml,yml",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.select, vec!["src/**/*.rs", "*.md"]);
        assert_eq!(cli.select_ext, vec!["toml", "yml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.zip, None);
    }

    #[test]
    fn url_is_required() {
        assert!(Cli::try_parse_from(["ghyank"]).is_err());
    }
}
