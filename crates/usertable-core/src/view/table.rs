use crate::models::Record;
use crate::sync::SyncController;

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Position of the visible window over the record list. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// The requested page, pulled back onto the last page if rows went away.
    pub fn current_page(&self, total: usize) -> usize {
        self.page.min(self.page_count(total))
    }

    pub fn set_page(&mut self, page: usize, total: usize) {
        self.page = page.clamp(1, self.page_count(total));
    }

    pub fn set_page_size(&mut self, page_size: usize, total: usize) {
        self.page_size = page_size.max(1);
        self.page = self.current_page(total);
    }

    pub fn window<'a>(&self, records: &'a [Record]) -> &'a [Record] {
        let start = (self.current_page(records.len()) - 1) * self.page_size;
        let end = (start + self.page_size).min(records.len());
        &records[start.min(end)..end]
    }
}

/// Paginated table over the synced records.
///
/// Every change of the visible window goes through here so that the open
/// edit is cancelled, including moves to the page already shown.
pub struct TableView {
    sync: SyncController,
    pager: Pager,
}

impl TableView {
    pub fn new(sync: SyncController, page_size: usize) -> Self {
        Self {
            sync,
            pager: Pager::new(page_size),
        }
    }

    pub fn sync(&self) -> &SyncController {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncController {
        &mut self.sync
    }

    pub fn pager(&self) -> Pager {
        self.pager
    }

    /// Rows on the current page
    pub fn visible(&self) -> &[Record] {
        self.pager.window(self.sync.list_records())
    }

    pub fn current_page(&self) -> usize {
        self.pager.current_page(self.total())
    }

    pub fn page_count(&self) -> usize {
        self.pager.page_count(self.total())
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        let total = self.total();
        self.pager.set_page(page, total);
        self.sync.on_navigate();
        self.pager.current_page(total)
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to_page(self.current_page() + 1)
    }

    pub fn prev_page(&mut self) -> usize {
        self.go_to_page(self.current_page().saturating_sub(1))
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        let total = self.total();
        self.pager.set_page_size(page_size, total);
        self.sync.on_navigate();
    }

    fn total(&self) -> usize {
        self.sync.list_records().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::InMemoryStore;
    use crate::models::RecordKey;
    use crate::sync::RollbackPolicy;

    async fn table(page_size: usize) -> TableView {
        let store = Arc::new(InMemoryStore::seeded());
        let mut sync = SyncController::new(store, RollbackPolicy::default());
        sync.load_from_remote().await.unwrap();
        TableView::new(sync, page_size)
    }

    #[test]
    fn test_pager_counts_and_clamps() {
        let mut pager = Pager::new(10);
        assert_eq!(pager.page_count(0), 1);
        assert_eq!(pager.page_count(10), 1);
        assert_eq!(pager.page_count(11), 2);

        pager.set_page(5, 11);
        assert_eq!(pager.current_page(11), 2);
        pager.set_page(0, 11);
        assert_eq!(pager.current_page(11), 1);

        assert_eq!(Pager::new(0).page_size(), 1);
    }

    #[tokio::test]
    async fn test_window_follows_page() {
        let mut view = table(5).await;
        assert_eq!(view.page_count(), 3);
        assert_eq!(view.visible().len(), 5);
        assert_eq!(view.visible()[0].key, RecordKey(1));

        view.go_to_page(3);
        let keys: Vec<u64> = view.visible().iter().map(|r| r.key.0).collect();
        assert_eq!(keys, vec![11, 12]);

        assert_eq!(view.prev_page(), 2);
        assert_eq!(view.visible()[0].key, RecordKey(6));
    }

    #[tokio::test]
    async fn test_navigation_cancels_unrelated_edit() {
        let mut view = table(5).await;
        view.sync_mut().begin_edit(RecordKey(2)).unwrap();

        view.next_page();
        assert!(view.sync().current_edit().is_none());

        view.sync_mut().begin_edit(RecordKey(7)).unwrap();
        view.go_to_page(view.current_page());
        assert!(view.sync().current_edit().is_none());

        view.sync_mut().begin_edit(RecordKey(7)).unwrap();
        view.set_page_size(20);
        assert!(view.sync().current_edit().is_none());
        assert_eq!(view.page_count(), 1);
    }

    #[tokio::test]
    async fn test_last_page_shrinks_after_delete() {
        let mut view = table(11).await;
        view.go_to_page(2);
        assert_eq!(view.visible().len(), 1);

        view.sync_mut().delete_record(RecordKey(12)).unwrap();
        view.sync_mut().settle().await;
        assert_eq!(view.current_page(), 1);
        assert_eq!(view.visible().len(), 11);
    }
}
