/// What the user asked for when leaving the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiAction {
    CopyText,
    SaveText,
    DownloadZip,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum AppMode {
    Normal,
    Filtering,
    Extensions,
}
