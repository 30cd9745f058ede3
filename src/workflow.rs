use crate::cli::Cli;
use crate::config::{Config, Settings, normalize_extension};
use crate::error::{ActionKind, RepoError, report};
use crate::formatter::{FileContent, approx_tokens, format_repo_contents};
use crate::github::{BlobLocator, GitHubClient, listing_entries};
use crate::path_tree::PathTree;
use crate::repo_url::RepoRef;
use crate::selection::SelectionModel;
use crate::tui::{self, TuiAction};
use crate::{clipboard, export};
use anyhow::{Result, anyhow};
use glob::Pattern;
use std::path::PathBuf;

/// Where the yanked files end up.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivery {
    Clipboard,
    Stdout,
    TextFile(PathBuf),
    Zip(PathBuf),
}

impl Delivery {
    fn action_kind(&self) -> ActionKind {
        match self {
            Delivery::Zip(_) => ActionKind::GenerateZip,
            _ => ActionKind::GenerateText,
        }
    }
}

// Print the action's error report and exit, the same way for every failure.
fn fail(action: ActionKind, err: &RepoError) -> ! {
    tracing::debug!(?err, "action failed");
    eprintln!("{}", report(action, err));
    std::process::exit(1);
}

fn or_fail<T>(action: ActionKind, result: Result<T, RepoError>) -> T {
    result.unwrap_or_else(|err| fail(action, &err))
}

// Compiles --select globs up front so a typo fails before any network traffic.
fn compile_patterns(raw: &[String]) -> Result<Vec<Pattern>> {
    raw.iter()
        .map(|s| Pattern::new(s).map_err(|e| anyhow!("Invalid --select glob pattern '{s}': {e}")))
        .collect()
}

fn preselect(model: &mut SelectionModel<BlobLocator>, patterns: &[Pattern], extensions: &[String]) {
    if !patterns.is_empty() {
        let matched = model.select_matching(patterns);
        tracing::info!(matched, "applied --select patterns");
        if matched == 0 {
            tracing::warn!("no files matched the --select patterns");
        }
    }
    for raw in extensions {
        let ext = normalize_extension(raw);
        match model.extensions().get(&ext) {
            Some(group) => model.toggle_extension(group, true),
            None => tracing::warn!(extension = %ext, "no files with this extension"),
        }
    }
}

async fn load_model(
    client: &GitHubClient,
    repo: &RepoRef,
    settings: &Settings,
) -> Result<SelectionModel<BlobLocator>, RepoError> {
    let items = client.fetch_listing(repo).await?;
    let tree = PathTree::build(listing_entries(items))?;
    Ok(SelectionModel::new(tree, &settings.common_extensions))
}

async fn fetch_selected(
    client: &GitHubClient,
    model: &SelectionModel<BlobLocator>,
) -> Result<Vec<FileContent>, RepoError> {
    let selected = model.selected_files();
    if selected.is_empty() {
        return Err(RepoError::NoSelection);
    }
    tracing::info!(files = selected.len(), "fetching selected files");
    client.fetch_contents(&selected).await
}

fn headless_delivery(cli: &Cli, settings: &Settings) -> Delivery {
    if cli.zip.is_some() {
        Delivery::Zip(settings.archive_file.clone())
    } else if cli.output.is_some() {
        Delivery::TextFile(settings.text_file.clone())
    } else if cli.dry_run {
        Delivery::Stdout
    } else {
        Delivery::Clipboard
    }
}

fn interactive_delivery(action: TuiAction, cli: &Cli, settings: &Settings) -> Delivery {
    match action {
        TuiAction::CopyText if cli.dry_run => Delivery::Stdout,
        TuiAction::CopyText => Delivery::Clipboard,
        TuiAction::SaveText => Delivery::TextFile(settings.text_file.clone()),
        TuiAction::DownloadZip => Delivery::Zip(settings.archive_file.clone()),
    }
}

fn render_text(contents: &[FileContent]) -> (String, usize) {
    let text = or_fail(
        ActionKind::GenerateText,
        format_repo_contents(contents).map_err(RepoError::from),
    );
    let tokens = approx_tokens(&text);
    (text, tokens)
}

fn deliver(delivery: &Delivery, contents: &[FileContent]) -> Result<()> {
    let count = contents.len();
    let files = if count == 1 { "file" } else { "files" };

    match delivery {
        Delivery::Zip(path) => {
            or_fail(
                ActionKind::GenerateZip,
                export::build_archive(contents).and_then(|bytes| export::save_bytes(path, &bytes)),
            );
            println!("✅ Wrote {count} {files} to {}.", path.display());
        }
        Delivery::Clipboard => {
            let (text, tokens) = render_text(contents);
            or_fail(ActionKind::GenerateText, clipboard::copy_to_clipboard(&text));
            println!("✅ Copied {count} {files} (≈ {tokens} tokens) to the clipboard.");
        }
        Delivery::TextFile(path) => {
            let (text, tokens) = render_text(contents);
            or_fail(ActionKind::GenerateText, export::save_text(path, &text));
            println!(
                "✅ Saved {count} {files} (≈ {tokens} tokens) to {}.",
                path.display()
            );
        }
        Delivery::Stdout => {
            let (text, tokens) = render_text(contents);
            print!("{text}");
            println!("(Dry run: {count} {files} (≈ {tokens} tokens). Clipboard not affected.)");
        }
    }
    Ok(())
}

// Main orchestrator: resolve settings, fetch the listing, select, fetch, deliver.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, config);
    let patterns = compile_patterns(&cli.select)?;

    let repo = or_fail(ActionKind::FetchRepository, RepoRef::parse(&cli.url));
    tracing::info!(%repo, "resolved repository");

    let client = or_fail(
        ActionKind::FetchRepository,
        GitHubClient::new(
            &settings.api_base,
            settings.token.as_deref(),
            settings.timeout,
            settings.concurrency,
        ),
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let mut model = or_fail(
        ActionKind::FetchRepository,
        runtime.block_on(load_model(&client, &repo, &settings)),
    );
    if model.tree().files().is_empty() {
        println!("No files found in {repo}.");
        return Ok(());
    }
    preselect(&mut model, &patterns, &cli.select_ext);

    let (delivery, model) = if cli.headless {
        (headless_delivery(&cli, &settings), model)
    } else {
        match tui::run_selection(model)? {
            (Some(action), model) => (interactive_delivery(action, &cli, &settings), model),
            (None, _) => {
                println!("Selection cancelled. Exiting.");
                return Ok(());
            }
        }
    };
    tracing::info!(?delivery, selected = model.selected_count(), "delivering selection");

    let contents = or_fail(
        delivery.action_kind(),
        runtime.block_on(fetch_selected(&client, &model)),
    );
    deliver(&delivery, &contents)
}
