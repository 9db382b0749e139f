use std::collections::BTreeSet;

/// Highlight and selection over the filesystem table, independent of any
/// widget. Highlight is the transient visual focus; selection is the set
/// of rows an action will operate on. The store never looks at row
/// contents, only at indices and the current row count.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    highlight: Option<usize>,
    selected: BTreeSet<usize>,
    last_selected: Option<usize>,
}

impl SelectionStore {
    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Moves the highlight by `delta` rows, wrapping cyclically. Returns
    /// true when the move wrapped past the first or last row. No-op on an
    /// empty table.
    pub fn move_highlight(&mut self, delta: isize, row_count: usize) -> bool {
        if row_count == 0 {
            self.highlight = None;
            return false;
        }
        let Some(current) = self.highlight else {
            self.highlight = Some(0);
            return false;
        };

        let next = current as isize + delta;
        let wrapped = next < 0 || next >= row_count as isize;
        let next = next.rem_euclid(row_count as isize) as usize;
        self.highlight = Some(next);
        wrapped
    }

    /// Adds the highlighted row to the selection. Set semantics: adding a
    /// row that is already selected changes nothing.
    pub fn extend_with_highlight(&mut self) -> bool {
        let Some(row) = self.highlight else {
            return false;
        };
        self.selected.insert(row);
        self.last_selected = Some(row);
        true
    }

    /// Selects every row between the last explicitly selected row and the
    /// highlight, inclusive, unioned into the existing selection. With no
    /// prior selection the range starts at row 0.
    pub fn range_select(&mut self) -> bool {
        let Some(row) = self.highlight else {
            return false;
        };
        let anchor = self.last_selected.unwrap_or(0);
        let (start, end) = if anchor <= row { (anchor, row) } else { (row, anchor) };
        self.selected.extend(start..=end);
        self.last_selected = Some(row);
        true
    }

    pub fn select_all(&mut self, row_count: usize) {
        self.selected = (0..row_count).collect();
        self.last_selected = self.highlight;
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.last_selected = None;
    }

    /// The rows a toolbar action operates on: the selection, or the
    /// highlighted row alone when nothing is selected. Ascending table
    /// order either way.
    pub fn target_rows(&self) -> Vec<usize> {
        if self.selected.is_empty() {
            self.highlight.into_iter().collect()
        } else {
            self.selected.iter().copied().collect()
        }
    }

    /// Re-validates against a new row count after a refresh: prunes
    /// selection members that no longer exist and clamps the highlight to
    /// the last valid row if the highlighted row vanished. A table that
    /// was never highlighted starts at the first row.
    pub fn revalidate(&mut self, row_count: usize) {
        self.selected.retain(|&index| index < row_count);
        self.last_selected = self.last_selected.filter(|&index| index < row_count);

        if row_count == 0 {
            self.highlight = None;
            return;
        }
        self.highlight = Some(match self.highlight {
            None => 0,
            Some(index) if index < row_count => index,
            Some(_) => row_count - 1,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionStore;

    fn store_at(row: usize, row_count: usize) -> SelectionStore {
        let mut store = SelectionStore::default();
        store.move_highlight(1, row_count); // first move lands on row 0
        while store.highlight() != Some(row) {
            store.move_highlight(1, row_count);
        }
        store
    }

    #[test]
    fn highlight_wraps_both_ways() {
        let mut store = SelectionStore::default();
        store.move_highlight(1, 3);
        assert_eq!(store.highlight(), Some(0));

        assert!(store.move_highlight(-1, 3));
        assert_eq!(store.highlight(), Some(2));

        assert!(store.move_highlight(1, 3));
        assert_eq!(store.highlight(), Some(0));

        assert!(!store.move_highlight(1, 3));
        assert_eq!(store.highlight(), Some(1));
    }

    #[test]
    fn empty_table_has_no_highlight() {
        let mut store = SelectionStore::default();
        assert!(!store.move_highlight(1, 0));
        assert_eq!(store.highlight(), None);
    }

    #[test]
    fn extend_is_monotonic_set_semantics() {
        let mut store = store_at(2, 5);
        store.extend_with_highlight();
        store.extend_with_highlight();
        assert_eq!(store.selected().len(), 1);
        assert!(store.is_selected(2));
    }

    #[test]
    fn range_select_without_prior_selection_starts_at_zero() {
        let mut store = store_at(5, 8);
        store.range_select();
        assert_eq!(
            store.selected().iter().copied().collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn range_select_unions_from_last_selected() {
        let mut store = store_at(1, 8);
        store.extend_with_highlight();
        while store.highlight() != Some(4) {
            store.move_highlight(1, 8);
        }
        store.range_select();
        assert_eq!(
            store.selected().iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn range_select_downwards_still_ascends() {
        let mut store = store_at(4, 8);
        store.extend_with_highlight();
        store.move_highlight(-1, 8);
        store.move_highlight(-1, 8);
        store.range_select();
        assert_eq!(
            store.selected().iter().copied().collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn select_all_covers_every_row() {
        let mut store = store_at(0, 4);
        store.select_all(4);
        assert_eq!(store.selected().len(), 4);
    }

    #[test]
    fn target_rows_fall_back_to_highlight() {
        let mut store = store_at(3, 5);
        assert_eq!(store.target_rows(), vec![3]);
        store.extend_with_highlight();
        store.move_highlight(-2, 5);
        store.extend_with_highlight();
        assert_eq!(store.target_rows(), vec![1, 3]);
    }

    #[test]
    fn revalidate_prunes_and_clamps() {
        let mut store = store_at(4, 6);
        store.select_all(6);
        store.revalidate(3);
        assert_eq!(store.highlight(), Some(2));
        assert_eq!(
            store.selected().iter().copied().collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        store.revalidate(0);
        assert_eq!(store.highlight(), None);
        assert!(store.selected().is_empty());
    }

    #[test]
    fn fresh_population_highlights_first_row() {
        let mut store = SelectionStore::default();
        store.revalidate(5);
        assert_eq!(store.highlight(), Some(0));
    }

    #[test]
    fn surviving_highlight_is_kept_across_refresh() {
        let mut store = store_at(1, 5);
        store.revalidate(4);
        assert_eq!(store.highlight(), Some(1));
    }
}
