//! Story page records and the generation-stamped page store.
//!
//! [`PageStore`] is the single owner of the page sequence and the current
//! page index.  Pages are created in bulk when a story arrives, then mutated
//! exactly once per asset slot by [`PageStore::apply_assets`].  Every
//! replacement of the sequence bumps a generation stamp; asset results carry
//! the stamp they were spawned under, so a late result from a replaced story
//! can never land on the new story's pages.

use std::sync::Arc;

use crate::audio::PcmClip;

// ---------------------------------------------------------------------------
// StoryPage
// ---------------------------------------------------------------------------

/// One page of the current story.
#[derive(Debug, Clone)]
pub struct StoryPage {
    /// Narrative text — immutable once created; also the prompt source for
    /// the page's illustration and narration.
    pub text: String,
    /// Illustration reference (`data:image/png;base64,…`).  Set once on
    /// first fetch success, never overwritten.
    pub image_url: Option<String>,
    /// Decoded narration clip.  Set once on first fetch success, never
    /// overwritten.
    pub audio: Option<Arc<PcmClip>>,
    /// True from creation until the illustration fetch settles.
    pub loading_image: bool,
    /// True from creation until the narration fetch settles.
    pub loading_audio: bool,
    /// An asset load is currently outstanding for this page.
    in_flight: bool,
}

impl StoryPage {
    fn new(text: String) -> Self {
        Self {
            text,
            image_url: None,
            audio: None,
            loading_image: true,
            loading_audio: true,
            in_flight: false,
        }
    }

    /// Both asset slots are filled.
    pub fn assets_resolved(&self) -> bool {
        self.image_url.is_some() && self.audio.is_some()
    }
}

// ---------------------------------------------------------------------------
// AssetUpdate
// ---------------------------------------------------------------------------

/// The committed result of one page's asset load.
///
/// `generation` is the store generation the load was spawned under; a
/// mismatch at apply time means the story has been replaced and the result
/// is silently discarded.
#[derive(Debug, Clone)]
pub struct AssetUpdate {
    pub generation: u64,
    pub index: usize,
    /// Illustration reference on success, `None` on failure (or when the
    /// slot was already filled and the fetch was skipped).
    pub image_url: Option<String>,
    /// Decoded narration on success, `None` on failure or skip.
    pub audio: Option<Arc<PcmClip>>,
}

// ---------------------------------------------------------------------------
// PageStore
// ---------------------------------------------------------------------------

/// Ordered page sequence + current index + generation stamp.
///
/// The index is always valid while pages exist; replacing the sequence
/// resets it to 0.  Navigation clamps at both ends (no wraparound).
#[derive(Debug, Default)]
pub struct PageStore {
    pages: Vec<StoryPage>,
    current: usize,
    generation: u64,
}

impl PageStore {
    /// An empty store at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation stamp.  Bumped by every [`replace_all`](Self::replace_all).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StoryPage> {
        self.pages.get(index)
    }

    /// All pages in order.
    pub fn pages(&self) -> &[StoryPage] {
        &self.pages
    }

    /// Index of the current page (0 when the store is empty).
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> Option<&StoryPage> {
        self.pages.get(self.current)
    }

    /// Replace the whole sequence with fresh pages for `texts`.
    ///
    /// All pages start with both loading flags set and no assets; the
    /// current index resets to 0 and the generation stamp is bumped.
    /// Returns the new generation.
    pub fn replace_all(&mut self, texts: Vec<String>) -> u64 {
        self.pages = texts.into_iter().map(StoryPage::new).collect();
        self.current = 0;
        self.generation += 1;
        self.generation
    }

    /// Advance to the next page.  No-op at the last page.
    /// Returns whether the index changed.
    pub fn go_next(&mut self) -> bool {
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Step back to the previous page.  No-op at the first page.
    /// Returns whether the index changed.
    pub fn go_prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Whether an asset load should fire for `index`.
    ///
    /// False once both slots are resolved, and while a load is already
    /// outstanding — revisiting a page never double-fetches.  A page whose
    /// load settled with failures reports true again, so revisiting is the
    /// retry path.
    pub fn needs_assets(&self, index: usize) -> bool {
        match self.pages.get(index) {
            Some(page) => !page.in_flight && !page.assets_resolved(),
            None => false,
        }
    }

    /// Record that a load has been spawned for `index`.
    ///
    /// Re-arms the loading flags for whichever slots are still empty (a
    /// retry after a partial failure loads only the missing side).
    pub fn mark_requested(&mut self, index: usize) {
        if let Some(page) = self.pages.get_mut(index) {
            page.in_flight = true;
            page.loading_image = page.image_url.is_none();
            page.loading_audio = page.audio.is_none();
        }
    }

    /// Commit one page's asset results.
    ///
    /// Rejects stale generations and out-of-range indices (late results
    /// from a replaced story are silently discarded).  Loading flags always
    /// clear; each slot is set only if currently empty, so a value is never
    /// overwritten after first success.  Returns whether the update landed.
    pub fn apply_assets(&mut self, update: AssetUpdate) -> bool {
        if update.generation != self.generation {
            return false;
        }
        let Some(page) = self.pages.get_mut(update.index) else {
            return false;
        };

        page.loading_image = false;
        page.loading_audio = false;
        page.in_flight = false;

        if page.image_url.is_none() {
            page.image_url = update.image_url;
        }
        if page.audio.is_none() {
            page.audio = update.audio;
        }

        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode_speech;

    fn clip() -> Arc<PcmClip> {
        Arc::new(decode_speech(&[0x00, 0x10, 0x00, 0xF0]).unwrap())
    }

    fn five_pages() -> PageStore {
        let mut store = PageStore::new();
        store.replace_all((1..=5).map(|i| format!("Page {i}")).collect());
        store
    }

    fn full_update(store: &PageStore, index: usize) -> AssetUpdate {
        AssetUpdate {
            generation: store.generation(),
            index,
            image_url: Some("data:image/png;base64,AAAA".into()),
            audio: Some(clip()),
        }
    }

    // ---- creation ----------------------------------------------------------

    #[test]
    fn new_store_is_empty_at_index_zero() {
        let store = PageStore::new();
        assert!(store.is_empty());
        assert_eq!(store.current_index(), 0);
        assert!(store.current_page().is_none());
    }

    #[test]
    fn replace_all_creates_loading_pages() {
        let store = five_pages();
        assert_eq!(store.len(), 5);
        assert_eq!(store.current_index(), 0);
        for i in 0..5 {
            let page = store.get(i).unwrap();
            assert!(page.loading_image);
            assert!(page.loading_audio);
            assert!(page.image_url.is_none());
            assert!(page.audio.is_none());
        }
    }

    #[test]
    fn replace_all_resets_index_and_bumps_generation() {
        let mut store = five_pages();
        store.go_next();
        store.go_next();
        assert_eq!(store.current_index(), 2);

        let g1 = store.generation();
        let g2 = store.replace_all(vec!["only page".into()]);
        assert_eq!(g2, g1 + 1);
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.len(), 1);
    }

    // ---- navigation clamping -----------------------------------------------

    #[test]
    fn go_next_never_passes_the_last_page() {
        let mut store = five_pages();
        for _ in 0..20 {
            store.go_next();
        }
        assert_eq!(store.current_index(), 4);
        assert!(!store.go_next());
    }

    #[test]
    fn go_prev_never_passes_the_first_page() {
        let mut store = five_pages();
        store.go_next();
        for _ in 0..20 {
            store.go_prev();
        }
        assert_eq!(store.current_index(), 0);
        assert!(!store.go_prev());
    }

    #[test]
    fn navigation_on_empty_store_is_a_noop() {
        let mut store = PageStore::new();
        assert!(!store.go_next());
        assert!(!store.go_prev());
        assert_eq!(store.current_index(), 0);
    }

    // ---- needs_assets guard ------------------------------------------------

    #[test]
    fn fresh_page_needs_assets() {
        let store = five_pages();
        assert!(store.needs_assets(0));
    }

    #[test]
    fn in_flight_page_does_not_need_assets() {
        let mut store = five_pages();
        store.mark_requested(0);
        assert!(!store.needs_assets(0));
    }

    #[test]
    fn resolved_page_does_not_need_assets() {
        let mut store = five_pages();
        store.mark_requested(0);
        let update = full_update(&store, 0);
        assert!(store.apply_assets(update));
        assert!(!store.needs_assets(0));
    }

    #[test]
    fn failed_page_needs_assets_again() {
        let mut store = five_pages();
        store.mark_requested(0);
        let applied = store.apply_assets(AssetUpdate {
            generation: store.generation(),
            index: 0,
            image_url: None,
            audio: None,
        });
        assert!(applied);
        // Flags cleared, slots empty — revisiting retries.
        let page = store.get(0).unwrap();
        assert!(!page.loading_image);
        assert!(!page.loading_audio);
        assert!(store.needs_assets(0));
    }

    #[test]
    fn out_of_range_index_does_not_need_assets() {
        let store = five_pages();
        assert!(!store.needs_assets(5));
    }

    // ---- apply_assets ------------------------------------------------------

    #[test]
    fn partial_failure_sets_only_the_successful_slot() {
        let mut store = five_pages();
        store.mark_requested(0);
        let applied = store.apply_assets(AssetUpdate {
            generation: store.generation(),
            index: 0,
            image_url: None,
            audio: Some(clip()),
        });
        assert!(applied);

        let page = store.get(0).unwrap();
        assert!(page.image_url.is_none());
        assert!(page.audio.is_some());
        assert!(!page.loading_image);
        assert!(!page.loading_audio);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut store = five_pages();
        store.mark_requested(0);
        let stale = full_update(&store, 0);

        store.replace_all(vec!["new story".into()]);
        assert!(!store.apply_assets(stale));

        // The new story's page is untouched.
        let page = store.get(0).unwrap();
        assert!(page.image_url.is_none());
        assert!(page.loading_image);
    }

    #[test]
    fn out_of_range_index_is_discarded() {
        let mut store = five_pages();
        let mut update = full_update(&store, 0);
        update.index = 17;
        assert!(!store.apply_assets(update));
    }

    #[test]
    fn assets_are_never_overwritten_after_first_success() {
        let mut store = five_pages();
        store.mark_requested(0);
        assert!(store.apply_assets(full_update(&store, 0)));

        let first_url = store.get(0).unwrap().image_url.clone();

        let mut second = full_update(&store, 0);
        second.image_url = Some("data:image/png;base64,BBBB".into());
        assert!(store.apply_assets(second));

        assert_eq!(store.get(0).unwrap().image_url, first_url);
    }

    #[test]
    fn retry_after_partial_failure_rearms_only_missing_slot() {
        let mut store = five_pages();
        store.mark_requested(0);
        store.apply_assets(AssetUpdate {
            generation: store.generation(),
            index: 0,
            image_url: None,
            audio: Some(clip()),
        });

        store.mark_requested(0);
        let page = store.get(0).unwrap();
        assert!(page.loading_image);
        assert!(!page.loading_audio);
    }
}
