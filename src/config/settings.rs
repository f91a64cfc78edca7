//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Settings for the generation backend (story text, illustrations, narration,
/// chat).
///
/// All connection details live here; nothing is hardcoded in the API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the generative-language REST endpoint.
    pub base_url: String,
    /// API key — `None` means unauthenticated (e.g. a local proxy).
    pub api_key: Option<String>,
    /// Model used for story text generation.
    pub story_model: String,
    /// Model used for illustration generation.
    pub image_model: String,
    /// Model used for narration speech synthesis.
    pub tts_model: String,
    /// Model used for the chat companion.
    pub chat_model: String,
    /// Prebuilt voice name for narration.
    pub voice: String,
    /// Maximum seconds to wait for any single generation response.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            story_model: "gemini-2.5-flash".into(),
            image_model: "imagen-4.0-generate-001".into(),
            tts_model: "gemini-2.5-flash-preview-tts".into(),
            chat_model: "gemini-2.5-flash".into(),
            voice: "Kore".into(),
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// StoryConfig
// ---------------------------------------------------------------------------

/// Settings for story structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    /// Number of pages requested per story.
    pub page_count: usize,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self { page_count: 5 }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for narration audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate of the raw narration PCM delivered by the speech model
    /// (must be 24 000).
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Initial window size `(width, height)` in logical pixels.
    pub window_size: (f32, f32),
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            window_size: (540.0, 680.0),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use story_time::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation backend settings.
    pub generation: GenerationConfig,
    /// Story structure settings.
    pub story: StoryConfig,
    /// Narration audio settings.
    pub audio: AudioConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
