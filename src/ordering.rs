use std::cmp::Ordering;

/// Segment name used for the empty leading segment of an absolute path.
pub const ROOT_MARKER: &str = "./";

/// Split a slash-delimited path into its segments.
///
/// A leading `/` becomes the [`ROOT_MARKER`] segment; any other empty segment
/// (`a//b`, trailing `/`) is dropped.
pub fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for (i, part) in path.split('/').enumerate() {
        if part.is_empty() {
            if i == 0 && path.len() > 1 {
                segments.push(ROOT_MARKER);
            }
            continue;
        }
        segments.push(part);
    }
    segments
}

/// One path segment together with whether the path ends there.
///
/// Segments that continue deeper order before segments that end the path,
/// so a directory sorts ahead of a sibling file at the same depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentKey<'a> {
    pub terminal: bool,
    pub name: &'a str,
}

impl Ord for SegmentKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.terminal
            .cmp(&other.terminal)
            .then_with(|| locale_cmp(self.name, other.name))
    }
}

impl PartialOrd for SegmentKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn segment_keys(path: &str) -> Vec<SegmentKey<'_>> {
    let segments = split_segments(path);
    let last = segments.len().saturating_sub(1);
    segments
        .into_iter()
        .enumerate()
        .map(|(i, name)| SegmentKey {
            terminal: i == last,
            name,
        })
        .collect()
}

/// Canonical order used for the tree view and for the final listing.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    segment_keys(a).cmp(&segment_keys(b))
}

/// Case-insensitive comparison with lowercase ahead of uppercase, falling back
/// to byte order so distinct strings never compare equal.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}
