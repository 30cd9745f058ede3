use super::app_state::{AppMode, TuiAction};
use crate::path_tree::{NodeId, ROOT};
use crate::selection::{SelectionModel, TriState};
use crate::tree_view::{TreeRow, matching_nodes, render_rows};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashSet;

pub struct TuiApp<M> {
    pub(super) model: SelectionModel<M>,
    pub(super) collapsed: HashSet<NodeId>,
    pub(super) cursor: Option<NodeId>,
    pub(super) scroll_offset: usize,
    pub(super) quit: bool,
    pub(super) action: Option<TuiAction>,
    pub(super) mode: AppMode,
    pub(super) filter_input: String,
    /// Cursor position in chars, not bytes.
    pub(super) filter_cursor_pos: usize,
    /// Extension groups in display order (largest first).
    pub(super) ext_order: Vec<usize>,
    pub(super) ext_cursor: usize,
    pub(super) list_viewport_height: usize,
}

impl<M> TuiApp<M> {
    pub fn new(model: SelectionModel<M>) -> Self {
        let ext_order = model.extensions().by_member_count();
        let mut app = TuiApp {
            model,
            collapsed: HashSet::new(),
            cursor: None,
            scroll_offset: 0,
            quit: false,
            action: None,
            mode: AppMode::Normal,
            filter_input: String::new(),
            filter_cursor_pos: 0,
            ext_order,
            ext_cursor: 0,
            list_viewport_height: 0, // set by the renderer
        };
        app.cursor = app.visible_rows().first().map(|row| row.node);
        app
    }

    pub fn into_parts(self) -> (Option<TuiAction>, SelectionModel<M>) {
        (self.action, self.model)
    }

    pub(super) fn visible_rows(&self) -> Vec<TreeRow> {
        if self.filter_input.is_empty() {
            render_rows(&self.model, &self.collapsed, None)
        } else {
            let keep = matching_nodes(&self.model, &self.filter_input);
            render_rows(&self.model, &self.collapsed, Some(&keep))
        }
    }

    pub(super) fn cursor_position(&self, rows: &[TreeRow]) -> Option<usize> {
        let cursor = self.cursor?;
        rows.iter().position(|row| row.node == cursor)
    }

    pub(super) fn move_cursor(&mut self, delta: i32) {
        let rows = self.visible_rows();
        if rows.is_empty() {
            self.cursor = None;
            return;
        }
        let next = match self.cursor_position(&rows) {
            Some(pos) => (pos as i32 + delta).rem_euclid(rows.len() as i32) as usize,
            None if delta > 0 => 0,
            None => rows.len() - 1,
        };
        self.cursor = Some(rows[next].node);
        self.clamp_scroll(&rows);
    }

    pub(super) fn toggle_current(&mut self) {
        let Some(id) = self.cursor else {
            return;
        };
        let checked = self.model.state(id) != TriState::Checked;
        self.model.toggle_node(id, checked);
    }

    pub(super) fn select_all_visible(&mut self) {
        let files: Vec<NodeId> = self
            .visible_rows()
            .into_iter()
            .filter(|row| !row.is_dir)
            .map(|row| row.node)
            .collect();
        self.model.set_files(files, true);
    }

    pub(super) fn deselect_all_visible(&mut self) {
        let ids: Vec<NodeId> = self.visible_rows().into_iter().map(|row| row.node).collect();
        self.model.set_files(ids, false);
    }

    pub(super) fn toggle_fold(&mut self) {
        let Some(id) = self.cursor else {
            return;
        };
        if !self.model.tree().node(id).is_dir() {
            return;
        }
        if !self.collapsed.remove(&id) {
            self.collapsed.insert(id);
        }
        self.ensure_cursor_visible();
    }

    pub(super) fn expand_all(&mut self) {
        self.collapsed.clear();
        self.ensure_cursor_visible();
    }

    /// Top-level directories stay open so the tree never shrinks to nothing.
    pub(super) fn collapse_all(&mut self) {
        let tree = self.model.tree();
        self.collapsed = tree
            .preorder()
            .into_iter()
            .filter(|&id| tree.node(id).is_dir() && tree.node(id).depth > 1)
            .collect();
        self.ensure_cursor_visible();
    }

    /// Move the cursor to its closest visible ancestor, or the first row.
    pub(super) fn ensure_cursor_visible(&mut self) {
        let rows = self.visible_rows();
        let visible: HashSet<NodeId> = rows.iter().map(|row| row.node).collect();
        let mut candidate = self.cursor;
        while let Some(id) = candidate {
            if visible.contains(&id) {
                break;
            }
            candidate = self.model.tree().parent(id).filter(|&p| p != ROOT);
        }
        self.cursor = candidate.or_else(|| rows.first().map(|row| row.node));
        self.clamp_scroll(&rows);
    }

    pub(super) fn clamp_scroll(&mut self, rows: &[TreeRow]) {
        let height = self.list_viewport_height;
        if height == 0 {
            return;
        }
        if let Some(pos) = self.cursor_position(rows) {
            if pos < self.scroll_offset {
                self.scroll_offset = pos;
            } else if pos >= self.scroll_offset + height {
                self.scroll_offset = pos + 1 - height;
            }
        }
        self.scroll_offset = self.scroll_offset.min(rows.len().saturating_sub(height));
    }

    pub(super) fn move_ext_cursor(&mut self, delta: i32) {
        if self.ext_order.is_empty() {
            return;
        }
        self.ext_cursor =
            (self.ext_cursor as i32 + delta).rem_euclid(self.ext_order.len() as i32) as usize;
    }

    pub(super) fn toggle_current_extension(&mut self) {
        let Some(&group) = self.ext_order.get(self.ext_cursor) else {
            return;
        };
        let checked = self.model.group_state(group) != TriState::Checked;
        self.model.toggle_extension(group, checked);
    }

    fn confirm(&mut self, action: TuiAction) {
        self.action = Some(action);
        self.quit = true;
    }

    fn filter_byte_index(&self) -> usize {
        self.filter_input
            .char_indices()
            .nth(self.filter_cursor_pos)
            .map_or(self.filter_input.len(), |(i, _)| i)
    }

    // --- Event handling sub-methods ---
    pub(super) fn handle_normal_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('/') => self.mode = AppMode::Filtering,
            KeyCode::Char('e') if !self.ext_order.is_empty() => self.mode = AppMode::Extensions,
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('y') => self.confirm(TuiAction::CopyText),
            KeyCode::Char('w') => self.confirm(TuiAction::SaveText),
            KeyCode::Char('z') => self.confirm(TuiAction::DownloadZip),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current(),
            KeyCode::Char('o') | KeyCode::Tab => self.toggle_fold(),
            KeyCode::Char('*') => self.expand_all(),
            KeyCode::Char('-') => self.collapse_all(),
            KeyCode::Char('a') => {
                if key_event.modifiers.is_empty() || key_event.modifiers == KeyModifiers::CONTROL {
                    self.select_all_visible();
                }
            }
            KeyCode::Char('d') => {
                if key_event.modifiers.is_empty() {
                    self.deselect_all_visible();
                }
            }
            _ => {}
        }
    }

    pub(super) fn handle_filtering_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter => {
                self.mode = AppMode::Normal;
                self.ensure_cursor_visible();
            }
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.filter_input.clear();
                self.filter_cursor_pos = 0;
                self.ensure_cursor_visible();
            }
            KeyCode::Char(c) => {
                let at = self.filter_byte_index();
                self.filter_input.insert(at, c);
                self.filter_cursor_pos += 1;
                self.ensure_cursor_visible();
            }
            KeyCode::Backspace => {
                if self.filter_cursor_pos > 0 {
                    self.filter_cursor_pos -= 1;
                    let at = self.filter_byte_index();
                    self.filter_input.remove(at);
                    self.ensure_cursor_visible();
                }
            }
            KeyCode::Left => {
                self.filter_cursor_pos = self.filter_cursor_pos.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.filter_cursor_pos < self.filter_input.chars().count() {
                    self.filter_cursor_pos += 1;
                }
            }
            _ => {}
        }
    }

    pub(super) fn handle_extension_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_ext_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_ext_cursor(1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current_extension(),
            KeyCode::Char('e') | KeyCode::Esc => self.mode = AppMode::Normal,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_tree::{PathEntry, PathTree};

    fn app_of(paths: &[&str]) -> TuiApp<()> {
        let tree = PathTree::build(paths.iter().map(|p| PathEntry::new(*p, ()))).unwrap();
        TuiApp::new(SelectionModel::new(tree, &HashSet::new()))
    }

    fn sample() -> TuiApp<()> {
        app_of(&["/a/x.rs", "/a/y.md", "/b.txt", "/c.rs"])
    }

    fn press(app: &mut TuiApp<()>, code: KeyCode) {
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        match app.mode {
            AppMode::Normal => app.handle_normal_mode_input(key),
            AppMode::Filtering => app.handle_filtering_mode_input(key),
            AppMode::Extensions => app.handle_extension_mode_input(key),
        }
    }

    fn id_of(app: &TuiApp<()>, name: &str) -> NodeId {
        let tree = app.model.tree();
        tree.preorder()
            .into_iter()
            .find(|&id| tree.node(id).name == name)
            .unwrap()
    }

    fn visible_names(app: &TuiApp<()>) -> Vec<String> {
        app.visible_rows()
            .iter()
            .map(|row| app.model.tree().node(row.node).name.clone())
            .collect()
    }

    #[test]
    fn cursor_wraps_around_visible_rows() {
        let mut app = sample();
        assert_eq!(app.cursor, Some(id_of(&app, "./")));
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.cursor, Some(id_of(&app, "c.rs")));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.cursor, Some(id_of(&app, "./")));
    }

    #[test]
    fn space_on_directory_cascades() {
        let mut app = sample();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.model.state(id_of(&app, "x.rs")), TriState::Checked);
        assert_eq!(app.model.state(id_of(&app, "y.md")), TriState::Checked);
        assert_eq!(app.model.state(id_of(&app, "./")), TriState::Indeterminate);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.model.selected_count(), 0);
    }

    #[test]
    fn collapse_all_moves_cursor_to_visible_ancestor() {
        let mut app = sample();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.cursor, Some(id_of(&app, "x.rs")));
        press(&mut app, KeyCode::Char('-'));
        assert_eq!(app.cursor, Some(id_of(&app, "a")));
        assert_eq!(visible_names(&app), vec!["./", "a", "b.txt", "c.rs"]);
        press(&mut app, KeyCode::Char('*'));
        assert_eq!(visible_names(&app).len(), 6);
    }

    #[test]
    fn fold_toggles_only_directories() {
        let mut app = sample();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Tab);
        assert_eq!(visible_names(&app), vec!["./", "a", "b.txt", "c.rs"]);
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(visible_names(&app).len(), 6);
    }

    #[test]
    fn filter_limits_select_all() {
        let mut app = sample();
        press(&mut app, KeyCode::Char('/'));
        for c in "MD".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(visible_names(&app), vec!["./", "a", "y.md"]);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.model.selected_count(), 1);
        assert_eq!(app.model.state(id_of(&app, "y.md")), TriState::Checked);

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert!(app.filter_input.is_empty());
        assert_eq!(visible_names(&app).len(), 6);
    }

    #[test]
    fn filter_editing_handles_multibyte_chars() {
        let mut app = sample();
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('é'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.filter_input, "x");
        assert_eq!(app.filter_cursor_pos, 0);
    }

    #[test]
    fn extension_bar_toggles_groups_by_count() {
        let mut app = sample();
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.mode, AppMode::Extensions);

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.model.state(id_of(&app, "x.rs")), TriState::Checked);
        assert_eq!(app.model.state(id_of(&app, "c.rs")), TriState::Checked);

        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.model.state(id_of(&app, "y.md")), TriState::Checked);
        assert_eq!(app.model.state(id_of(&app, "a")), TriState::Checked);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn action_keys_confirm_and_quit() {
        let mut app = sample();
        press(&mut app, KeyCode::Char('z'));
        assert!(app.quit);
        let (action, _) = app.into_parts();
        assert_eq!(action, Some(TuiAction::DownloadZip));

        let mut app = sample();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.quit);
        assert_eq!(app.into_parts().0, None);
    }
}
