//! Host bridge controller.
//!
//! [`RichEditor`] is the only thing the host application talks to. Commands
//! are encoded and pushed into the surface without waiting for anything;
//! what the document says back arrives later as [`SurfaceEvent`]s that the
//! host feeds in from its own loop.

use crate::config::{ChangeCallback, EditorConfig, EditorOptions, HeightCallback, LoadEndCallback};
use crate::surface::{RenderingSurface, SurfaceEvent};
use quill_core::height::HeightSync;
use quill_core::protocol::{Command, CommandEncoder, EditorEvent, decode_message};
use quill_core::template::{DocumentTemplate, render_document};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Build the initial document for `options`.
pub fn document(options: &EditorOptions) -> String {
    render_document(&DocumentTemplate {
        content: options.value.as_deref().unwrap_or_default(),
        bg_color: options.bg_color.as_deref(),
        custom_styles: options.custom_styles.as_deref(),
    })
}

/// A decoded inbound signal.
enum Inbound {
    LoadEnd,
    Event(EditorEvent),
}

pub struct RichEditor<S: RenderingSurface> {
    id: Uuid,
    span: tracing::Span,
    surface: S,
    encoder: CommandEncoder,
    options: EditorOptions,
    on_change: Option<ChangeCallback>,
    on_load_end: Option<LoadEndCallback>,
    on_height_change: Option<HeightCallback>,
    /// Last value the host supplied.
    controlled: Option<String>,
    content: String,
    height: HeightSync,
    loaded: bool,
}

impl<S: RenderingSurface + std::fmt::Debug> std::fmt::Debug for RichEditor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RichEditor")
            .field("id", &self.id)
            .field("surface", &self.surface)
            .field("content", &self.content)
            .field("height", &self.height)
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl<S: RenderingSurface> RichEditor<S> {
    /// Create the controller and load the initial document into `surface`.
    pub fn new(config: EditorConfig, mut surface: S) -> Self {
        let EditorConfig {
            options,
            on_change,
            on_load_end,
            on_height_change,
        } = config;

        let id = Uuid::new_v4();
        let span = tracing::info_span!("editor", id = %id);
        let encoder = CommandEncoder::new(&options.namespace);
        let height = HeightSync::new(options.initial_height, options.max_height);
        let content = options.value.clone().unwrap_or_default();

        {
            let _enter = span.enter();
            if let Err(e) = surface.load(document(&options)) {
                tracing::warn!(error = %e, "failed to load document");
            }
        }

        Self {
            id,
            span,
            surface,
            encoder,
            controlled: options.value.clone(),
            options,
            on_change,
            on_load_end,
            on_height_change,
            content,
            height,
            loaded: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Latest known content of the editable root.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current layout height.
    pub fn height(&self) -> u32 {
        self.height.current()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    // ────────────────────────────────────────────────────────────────
    // Commands
    // ────────────────────────────────────────────────────────────────

    pub fn focus(&mut self) {
        self.transmit(Command::focus());
    }

    pub fn blur(&mut self) {
        self.transmit(Command::blur());
    }

    /// Replace the document content. `None` clears it.
    pub fn set_value(&mut self, value: Option<&str>) {
        self.controlled = value.map(str::to_string);
        self.content = value.unwrap_or_default().to_string();
        self.transmit(Command::set_html(value));
    }

    pub fn insert_html(&mut self, html: &str) {
        self.transmit(Command::insert_html(html));
    }

    pub fn surround_selection(&mut self, before: &str, after: &str) {
        self.transmit(Command::surround_selection(before, after));
    }

    pub fn surround_selection_tag(&mut self, tag_name: &str) {
        self.transmit(Command::surround_selection_tag(tag_name));
    }

    pub fn toggle_selection_tag(&mut self, tag_name: &str) {
        self.transmit(Command::toggle_selection_tag(tag_name));
    }

    pub fn set_placeholder(&mut self, text: &str) {
        self.transmit(Command::set_placeholder(text));
    }

    pub fn inject_css(&mut self, css: &str) {
        self.transmit(Command::inject_css(css));
    }

    /// Change the configured placeholder. Applied right away once loaded.
    pub fn update_placeholder(&mut self, placeholder: Option<String>) {
        if placeholder == self.options.placeholder {
            return;
        }
        self.options.placeholder = placeholder;
        if !self.loaded {
            return;
        }
        if let Some(text) = self.options.placeholder.clone() {
            self.set_placeholder(&text);
        }
    }

    /// Change the configured extra CSS. Applied right away once loaded.
    pub fn update_injected_css(&mut self, css: Option<String>) {
        if css == self.options.injected_css {
            return;
        }
        self.options.injected_css = css;
        if !self.loaded {
            return;
        }
        if let Some(css) = self.options.injected_css.clone() {
            self.inject_css(&css);
        }
    }

    fn transmit(&mut self, command: Command) {
        let _enter = self.span.enter();
        let script = self.encoder.encode(&command);
        tracing::trace!(command = %command.name, script = %script, "transmit");
        if let Err(e) = self.surface.inject(script) {
            tracing::warn!(command = %command.name, error = %e, "command not delivered");
        }
    }

    // ────────────────────────────────────────────────────────────────
    // Inbound
    // ────────────────────────────────────────────────────────────────

    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::LoadEnd => self.handle_load_end(),
            SurfaceEvent::Message(raw) => self.handle_message(&raw),
        }
    }

    /// Decode and apply one raw document message. Undecodable messages are
    /// dropped.
    pub fn handle_message(&mut self, raw: &str) {
        if let Some(event) = self.decode(raw) {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: EditorEvent) {
        let _enter = self.span.clone().entered();
        match event {
            EditorEvent::ContentChange { html } => {
                let changed = self.controlled.as_deref() != Some(html.as_str());
                self.content = html;
                if changed {
                    if let Some(on_change) = self.on_change.as_mut() {
                        on_change(&self.content);
                    }
                }
            }
            EditorEvent::DocumentHeight { height } => {
                if self.height.apply(height) {
                    let current = self.height.current();
                    if let Some(on_height_change) = self.on_height_change.as_mut() {
                        on_height_change(current);
                    }
                }
            }
        }
    }

    /// The first load completion applies the placeholder and injected CSS;
    /// any later one is ignored.
    pub fn handle_load_end(&mut self) {
        let span = self.span.clone();
        let _enter = span.enter();
        if self.loaded {
            tracing::debug!("repeated load completion ignored");
            return;
        }
        self.loaded = true;
        tracing::info!("document loaded");

        if let Some(text) = self.options.placeholder.clone() {
            self.set_placeholder(&text);
        }
        if let Some(css) = self.options.injected_css.clone() {
            self.inject_css(&css);
        }
        if let Some(on_load_end) = self.on_load_end.as_mut() {
            on_load_end();
        }
    }

    /// Apply a batch of surface events in order. With height coalescing on,
    /// only the last height report of the batch is applied.
    pub fn handle_batch(&mut self, batch: Vec<SurfaceEvent>) {
        let inbound: Vec<Inbound> = batch
            .into_iter()
            .filter_map(|event| match event {
                SurfaceEvent::LoadEnd => Some(Inbound::LoadEnd),
                SurfaceEvent::Message(raw) => self.decode(&raw).map(Inbound::Event),
            })
            .collect();

        let last_height = if self.options.coalesce_height_events {
            inbound.iter().rposition(|i| {
                matches!(i, Inbound::Event(EditorEvent::DocumentHeight { .. }))
            })
        } else {
            None
        };

        for (index, item) in inbound.into_iter().enumerate() {
            match item {
                Inbound::LoadEnd => self.handle_load_end(),
                Inbound::Event(EditorEvent::DocumentHeight { height })
                    if last_height.is_some_and(|last| last != index) =>
                {
                    tracing::trace!(height, "height report coalesced");
                }
                Inbound::Event(event) => self.handle_event(event),
            }
        }
    }

    /// Wait for the next surface event and apply it. Returns `false` once
    /// the surface has shut down.
    pub async fn pump(&mut self, events: &mut mpsc::Receiver<SurfaceEvent>) -> bool {
        match events.recv().await {
            Some(event) => {
                self.handle_surface_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply everything already queued without waiting. Returns how many
    /// surface events were taken off the queue.
    pub fn drain(&mut self, events: &mut mpsc::Receiver<SurfaceEvent>) -> usize {
        let mut batch = Vec::new();
        while let Ok(event) = events.try_recv() {
            batch.push(event);
        }
        let taken = batch.len();
        self.handle_batch(batch);
        taken
    }

    fn decode(&self, raw: &str) -> Option<EditorEvent> {
        match decode_message(raw) {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                tracing::debug!(parent: &self.span, raw = %raw, "unknown event ignored");
                None
            }
            Err(e) => {
                tracing::debug!(parent: &self.span, error = %e, raw = %raw, "message dropped");
                None
            }
        }
    }
}
