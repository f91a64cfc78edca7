//! Per-page asset loading.
//!
//! [`load_page_assets`] requests a page's illustration and narration
//! concurrently, decodes the narration on success, and returns both sides
//! regardless of individual failures — one asset failing never cancels or
//! fails the other.  The result is committed by the caller via
//! [`PageStore::apply_assets`](crate::story::PageStore::apply_assets) only
//! after both sides have settled.

use std::sync::Arc;

use crate::audio::{decode_speech, PcmClip};
use crate::gen::StoryBackend;

// ---------------------------------------------------------------------------
// AssetOutcome
// ---------------------------------------------------------------------------

/// The settled result of one page's asset load.
///
/// Each side is success-with-value or failure-with-message; a skipped side
/// (slot already filled) is `None`/`None`.
#[derive(Debug, Clone, Default)]
pub struct AssetOutcome {
    pub image_url: Option<String>,
    pub image_error: Option<String>,
    pub audio: Option<Arc<PcmClip>>,
    pub audio_error: Option<String>,
}

// ---------------------------------------------------------------------------
// load_page_assets
// ---------------------------------------------------------------------------

/// Fetch the missing assets for one page.
///
/// The illustration and narration requests run concurrently and are joined —
/// neither result is visible to the caller until both have settled.
/// Narration bytes are decoded into a [`PcmClip`] only when the fetch
/// succeeds; a decode failure counts as an audio-side failure.
///
/// `need_image` / `need_audio` skip sides whose slot is already filled, so a
/// retry after a partial failure fetches only what is missing.
pub async fn load_page_assets(
    backend: &dyn StoryBackend,
    page_text: &str,
    need_image: bool,
    need_audio: bool,
) -> AssetOutcome {
    let image_side = async {
        if !need_image {
            return (None, None);
        }
        match backend.illustration(page_text).await {
            Ok(url) => (Some(url), None),
            Err(e) => (None, Some(e.to_string())),
        }
    };

    let audio_side = async {
        if !need_audio {
            return (None, None);
        }
        match backend.narration(page_text).await {
            Ok(bytes) => match decode_speech(&bytes) {
                Ok(clip) => (Some(Arc::new(clip)), None),
                Err(e) => (None, Some(e.to_string())),
            },
            Err(e) => (None, Some(e.to_string())),
        }
    };

    let ((image_url, image_error), (audio, audio_error)) = tokio::join!(image_side, audio_side);

    AssetOutcome {
        image_url,
        image_error,
        audio,
        audio_error,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
