//! Story Time window — egui/eframe application.
//!
//! # Architecture
//!
//! [`StoryTimeApp`] is the top-level [`eframe::App`] that owns the UI state
//! and two channel endpoints:
//!
//! * `command_tx` — sends [`StoryCommand`] to the story runner.
//! * `event_rx`  — receives [`StoryEvent`] from the runner.
//!
//! Every frame it drains pending events (non-blocking), then renders one of
//! two views:
//!
//! | View | Content |
//! |------|---------|
//! | Story | topic form → "dreaming up" spinner → page card with illustration, text, navigation and read-aloud controls |
//! | Chat | transcript with the companion + input row |
//!
//! Illustrations arrive as `data:image/png;base64,…` references and are
//! decoded into textures on first display, cached per page index.

use std::collections::HashMap;

use base64::{engine::general_purpose, Engine as _};
use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::story::{PageView, StoryCommand, StoryEvent};

// ---------------------------------------------------------------------------
// View selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveView {
    Story,
    Chat,
}

/// One rendered chat transcript line.
struct ChatLine {
    from_user: bool,
    text: String,
}

// ---------------------------------------------------------------------------
// StoryTimeApp
// ---------------------------------------------------------------------------

/// eframe application — the storybook window.
pub struct StoryTimeApp {
    // ── View state ───────────────────────────────────────────────────────
    view: ActiveView,

    // ── Story state ──────────────────────────────────────────────────────
    topic_input: String,
    pages: Vec<PageView>,
    current_index: usize,
    story_loading: bool,
    story_error: Option<String>,
    is_playing: bool,
    /// Decoded illustration textures by page index; `None` marks a
    /// reference that failed to decode so it is not retried every frame.
    textures: HashMap<usize, Option<egui::TextureHandle>>,

    // ── Chat state ───────────────────────────────────────────────────────
    chat_input: String,
    chat_lines: Vec<ChatLine>,
    chat_waiting: bool,

    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<StoryCommand>,
    event_rx: mpsc::Receiver<StoryEvent>,

    // ── Configuration ────────────────────────────────────────────────────
    config: AppConfig,
}

impl StoryTimeApp {
    /// Create a new [`StoryTimeApp`].
    ///
    /// * `command_tx` — sender end of the runner command channel.
    /// * `event_rx`  — receiver end of the runner event channel.
    /// * `config`    — loaded application configuration.
    pub fn new(
        command_tx: mpsc::Sender<StoryCommand>,
        event_rx: mpsc::Receiver<StoryEvent>,
        config: AppConfig,
    ) -> Self {
        Self {
            view: ActiveView::Story,
            topic_input: String::new(),
            pages: Vec::new(),
            current_index: 0,
            story_loading: false,
            story_error: None,
            is_playing: false,
            textures: HashMap::new(),
            chat_input: String::new(),
            chat_lines: Vec::new(),
            chat_waiting: false,
            command_tx,
            event_rx,
            config,
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending runner events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                StoryEvent::StoryStarted => {
                    self.story_loading = true;
                    self.story_error = None;
                }
                StoryEvent::StoryReady { pages, index } => {
                    self.pages = pages;
                    self.current_index = index;
                    self.story_loading = false;
                    self.is_playing = false;
                    self.textures.clear();
                }
                StoryEvent::StoryFailed { message } => {
                    self.story_loading = false;
                    self.story_error = Some(message);
                }
                StoryEvent::PageChanged { index } => {
                    self.current_index = index;
                }
                StoryEvent::PageUpdated { index, page } => {
                    if let Some(slot) = self.pages.get_mut(index) {
                        *slot = page;
                        self.textures.remove(&index);
                    }
                }
                StoryEvent::PlaybackStarted { .. } => {
                    self.is_playing = true;
                }
                StoryEvent::PlaybackStopped => {
                    self.is_playing = false;
                }
                StoryEvent::ChatReply { text } => {
                    self.chat_waiting = false;
                    self.chat_lines.push(ChatLine {
                        from_user: false,
                        text,
                    });
                }
                StoryEvent::ChatFailed { message } => {
                    self.chat_waiting = false;
                    self.chat_lines.push(ChatLine {
                        from_user: false,
                        text: message,
                    });
                }
                StoryEvent::ChatCleared => {
                    self.chat_lines.clear();
                    self.chat_waiting = false;
                }
            }
        }
    }

    fn send(&self, cmd: StoryCommand) {
        // try_send keeps the UI thread non-blocking; a full channel only
        // happens when the runner is gone, in which case there is nothing
        // useful to do with the command anyway.
        let _ = self.command_tx.try_send(cmd);
    }

    // ── Story view ───────────────────────────────────────────────────────

    fn submit_topic(&mut self) {
        if self.topic_input.trim().is_empty() {
            self.story_error = Some(crate::story::runner::TOPIC_MISSING_MESSAGE.into());
            return;
        }
        self.send(StoryCommand::CreateStory {
            topic: self.topic_input.clone(),
        });
    }

    /// Render the topic form shown before any story exists.
    fn draw_topic_form(&mut self, ui: &mut egui::Ui) {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("What should the story be about?")
                    .size(20.0)
                    .strong()
                    .color(egui::Color32::from_rgb(70, 110, 220)),
            );
            ui.label(
                egui::RichText::new(format!(
                    "I'll dream up a {}-page story just for you!",
                    self.config.story.page_count
                ))
                .color(egui::Color32::from_rgb(130, 130, 130)),
            );
            ui.add_space(12.0);

            let response = ui.add(
                egui::TextEdit::singleline(&mut self.topic_input)
                    .hint_text("e.g., a friendly dragon")
                    .desired_width(280.0),
            );
            if response.changed() {
                self.story_error = None;
            }
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            ui.add_space(8.0);
            if ui.button("Create Story").clicked() || submitted {
                self.submit_topic();
            }

            if let Some(ref error) = self.story_error {
                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new(error.as_str())
                        .color(egui::Color32::from_rgb(220, 70, 70))
                        .strong(),
                );
            }
        });
    }

    /// Render the "dreaming up" spinner while the story text is generated.
    fn draw_story_loading(&self, ui: &mut egui::Ui) {
        ui.add_space(48.0);
        ui.vertical_centered(|ui| {
            ui.add(egui::Spinner::new().size(32.0));
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new("Dreaming up a new story...")
                    .size(16.0)
                    .strong()
                    .color(egui::Color32::from_rgb(150, 90, 200)),
            );
        });
    }

    /// Render the current page: illustration, text, and controls.
    fn draw_page(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let index = self.current_index;
        let Some(page) = self.pages.get(index).cloned() else {
            return;
        };

        ui.vertical_centered(|ui| {
            self.draw_illustration(ui, ctx, index, &page);

            ui.add_space(8.0);
            ui.label(egui::RichText::new(page.text.as_str()).size(16.0));
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                ui.with_layout(
                    egui::Layout::left_to_right(egui::Align::Center).with_main_justify(true),
                    |ui| {
                        let at_first = index == 0;
                        let at_last = index + 1 >= self.pages.len();

                        if ui.add_enabled(!at_first, egui::Button::new("⬅")).clicked() {
                            self.send(StoryCommand::PrevPage);
                        }

                        let play_label = if self.is_playing {
                            "⏹ Stop"
                        } else {
                            "🔊 Read Aloud"
                        };
                        let can_play = page.has_audio && !page.loading_audio;
                        if ui
                            .add_enabled(can_play, egui::Button::new(play_label))
                            .clicked()
                        {
                            self.send(StoryCommand::TogglePlayback);
                        }
                        if page.loading_audio {
                            ui.add(egui::Spinner::new().size(14.0));
                        }

                        if ui.add_enabled(!at_last, egui::Button::new("➡")).clicked() {
                            self.send(StoryCommand::NextPage);
                        }
                    },
                );
            });

            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(format!("Page {} of {}", index + 1, self.pages.len()))
                    .color(egui::Color32::from_rgb(130, 130, 130)),
            );

            ui.add_space(8.0);
            if ui.button("✨ New story").clicked() {
                self.pages.clear();
                self.textures.clear();
                self.topic_input.clear();
                self.is_playing = false;
            }
        });
    }

    /// Render the illustration area: spinner while loading, the decoded
    /// texture on success, a playful placeholder on failure.
    fn draw_illustration(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        index: usize,
        page: &PageView,
    ) {
        const SIDE: f32 = 300.0;

        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(SIDE, SIDE), egui::Sense::hover());
        ui.painter().rect_filled(
            rect,
            egui::CornerRadius::same(12),
            egui::Color32::from_rgb(225, 235, 250),
        );

        if page.loading_image {
            ui.put(rect, egui::Spinner::new().size(28.0));
            return;
        }

        match self.texture_for(ctx, index, page) {
            Some(texture) => {
                let image = egui::Image::new((texture.id(), rect.size()))
                    .corner_radius(egui::CornerRadius::same(12));
                ui.put(rect, image);
            }
            None => {
                ui.put(
                    rect,
                    egui::Label::new(
                        egui::RichText::new("🎨 Oops! The picture is playing hide-and-seek.")
                            .color(egui::Color32::from_rgb(120, 120, 120)),
                    ),
                );
            }
        }
    }

    /// Decode the page's illustration reference into a texture, caching the
    /// result (including decode failures) per page index.
    fn texture_for(
        &mut self,
        ctx: &egui::Context,
        index: usize,
        page: &PageView,
    ) -> Option<&egui::TextureHandle> {
        if !self.textures.contains_key(&index) {
            let decoded = page
                .image_url
                .as_deref()
                .and_then(decode_data_url)
                .and_then(|bytes| match image::load_from_memory(&bytes) {
                    Ok(img) => Some(img.to_rgba8()),
                    Err(e) => {
                        log::warn!("illustration for page {index} failed to decode: {e}");
                        None
                    }
                })
                .map(|rgba| {
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    ctx.load_texture(
                        format!("story-page-{index}"),
                        color,
                        egui::TextureOptions::LINEAR,
                    )
                });
            self.textures.insert(index, decoded);
        }
        self.textures.get(&index).and_then(|t| t.as_ref())
    }

    fn draw_story_view(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if self.story_loading {
            self.draw_story_loading(ui);
        } else if self.pages.is_empty() {
            self.draw_topic_form(ui);
        } else {
            self.draw_page(ui, ctx);
        }
    }

    // ── Chat view ────────────────────────────────────────────────────────

    fn submit_chat(&mut self) {
        let message = self.chat_input.trim().to_string();
        if message.is_empty() || self.chat_waiting {
            return;
        }
        self.chat_lines.push(ChatLine {
            from_user: true,
            text: message.clone(),
        });
        self.chat_waiting = true;
        self.chat_input.clear();
        self.send(StoryCommand::SendChat { message });
    }

    fn draw_chat_view(&mut self, ui: &mut egui::Ui) {
        let input_height = 40.0;
        let transcript_height = ui.available_height() - input_height;

        egui::ScrollArea::vertical()
            .max_height(transcript_height)
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if self.chat_lines.is_empty() && !self.chat_waiting {
                    ui.add_space(24.0);
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new("Say hi to Sparky! 🤖")
                                .size(16.0)
                                .color(egui::Color32::from_rgb(130, 130, 130)),
                        );
                    });
                }

                for line in &self.chat_lines {
                    let (who, color) = if line.from_user {
                        ("You", egui::Color32::from_rgb(70, 110, 220))
                    } else {
                        ("Sparky", egui::Color32::from_rgb(150, 90, 200))
                    };
                    ui.label(
                        egui::RichText::new(format!("{who}: {}", line.text)).color(color),
                    );
                    ui.add_space(4.0);
                }

                if self.chat_waiting {
                    ui.add(egui::Spinner::new().size(14.0));
                }
            });

        ui.separator();
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.chat_input)
                    .hint_text("Ask Sparky anything...")
                    .desired_width(ui.available_width() - 140.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let can_send = !self.chat_waiting && !self.chat_input.trim().is_empty();
            if ui.add_enabled(can_send, egui::Button::new("Send")).clicked() || submitted {
                self.submit_chat();
            }
            if ui.button("New chat").clicked() {
                self.send(StoryCommand::NewChat);
            }
        });
    }

    // ── Header ───────────────────────────────────────────────────────────

    fn draw_header(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("Story Time")
                    .size(26.0)
                    .strong()
                    .color(egui::Color32::from_rgb(90, 100, 230)),
            );
        });
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.with_layout(
                egui::Layout::left_to_right(egui::Align::Center).with_main_justify(true),
                |ui| {
                    if ui
                        .selectable_label(self.view == ActiveView::Story, "📖 Story Time")
                        .clicked()
                    {
                        self.view = ActiveView::Story;
                    }
                    if ui
                        .selectable_label(self.view == ActiveView::Chat, "💬 Chat with Sparky")
                        .clicked()
                    {
                        self.view = ActiveView::Chat;
                    }
                },
            );
        });
        ui.separator();
    }

    /// Whether anything is in flight that the UI should animate/poll for.
    fn is_busy(&self) -> bool {
        self.story_loading
            || self.chat_waiting
            || self.is_playing
            || self
                .pages
                .get(self.current_index)
                .is_some_and(|p| p.loading_image || p.loading_audio)
    }
}

// ---------------------------------------------------------------------------
// Data URL decoding
// ---------------------------------------------------------------------------

/// Extract the raw bytes from a `data:…;base64,…` reference.
fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let (_, payload) = url.split_once("base64,")?;
    general_purpose::STANDARD.decode(payload).ok()
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for StoryTimeApp {
    /// Called every frame by eframe.  Drains runner events, then renders the
    /// active view.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        // Events arrive on a channel, not through input, so keep repainting
        // while work is in flight (fast) and otherwise at a slow poll rate.
        let repaint_after = if self.is_busy() {
            std::time::Duration::from_millis(100)
        } else {
            std::time::Duration::from_millis(500)
        };
        ctx.request_repaint_after(repaint_after);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_header(ui);
            match self.view {
                ActiveView::Story => self.draw_story_view(ui, ctx),
                ActiveView::Chat => self.draw_chat_view(ui),
            }
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("Story Time window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
