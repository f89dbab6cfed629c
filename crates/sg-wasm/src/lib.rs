//! WASM bridge for SketchGen: the editor engine behind a browser canvas.
//!
//! Built with `wasm-pack build --target web`. The page owns the toolbar,
//! property panel and dialogs; it forwards canvas events here and reads
//! state back as JSON strings.

mod render2d;

use base64::Engine as _;
use render2d::Canvas2dSurface;
use serde_json::json;
use sg_core::{BackgroundImage, CanvasDimensions, ShapeId, ShapePatch, Snapshot};
use sg_editor::generation::GenerationForm;
use sg_editor::shortcuts::ShortcutAction;
use sg_editor::{Editor, EditorConfig, GenerationPanel, Modifiers, PendingImage, ToolKind};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The canvas controller the page talks to.
///
/// Wraps an [`Editor`] drawing through a Canvas2D context. Every editing
/// call redraws; [`SketchCanvas::frame`] only redraws when an image has
/// finished loading since the last draw.
#[wasm_bindgen]
pub struct SketchCanvas {
    editor: Editor,
    dirty: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl SketchCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(ctx: CanvasRenderingContext2d, width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        init_logging();

        let config = EditorConfig {
            dimensions: CanvasDimensions::new(width, height),
            ..Default::default()
        };
        Self::build(ctx, config)
    }

    /// Create a controller from an `EditorConfig` JSON object. Unknown or
    /// malformed input falls back to the defaults.
    pub fn with_config(ctx: CanvasRenderingContext2d, config_json: &str) -> SketchCanvas {
        console_error_panic_hook_setup();
        init_logging();

        let config = EditorConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("invalid editor config, using defaults: {e}");
            EditorConfig::default()
        });
        Self::build(ctx, config)
    }

    /// Redraw if an image decoded since the last draw. Call once per
    /// animation frame. Returns `true` when it drew.
    pub fn frame(&mut self) -> bool {
        if !self.dirty.replace(false) {
            return false;
        }
        self.editor.surface_mut().present();
        true
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) {
        self.editor
            .pointer_down(x, y, modifiers(shift, ctrl, alt, meta));
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) {
        self.editor
            .pointer_move(x, y, modifiers(shift, ctrl, alt, meta));
    }

    /// Returns the UI state JSON (see [`SketchCanvas::state_json`]) so the
    /// page can refresh its panels after a gesture.
    pub fn pointer_up(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        self.editor
            .pointer_up(x, y, modifiers(shift, ctrl, alt, meta));
        self.state_json()
    }

    /// Handle a key press. Returns JSON:
    /// `{"handled":bool,"action":"<name>"|null,"state":{...}}`.
    /// The page should `preventDefault()` when `handled` is true.
    pub fn key_down(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let action = self
            .editor
            .key_down(key, modifiers(shift, ctrl, alt, meta));
        json!({
            "handled": action.is_some(),
            "action": action.map(action_name),
            "state": self.state(),
        })
        .to_string()
    }

    // ─── Tools & selection ───────────────────────────────────────────────

    /// Switch tools by name. Returns `false` for an unknown name.
    pub fn set_tool(&mut self, name: &str) -> bool {
        match ToolKind::parse(name) {
            Some(kind) => {
                self.editor.set_tool(kind);
                true
            }
            None => {
                log::warn!("unknown tool {name:?}");
                false
            }
        }
    }

    pub fn tool(&self) -> String {
        self.editor.tool().as_str().to_string()
    }

    /// Select a shape by id; an empty string clears the selection.
    pub fn select(&mut self, id: &str) {
        let id = (!id.is_empty()).then(|| ShapeId::intern(id));
        self.editor.select_shape(id);
    }

    /// Selected shape id, or empty string if none.
    pub fn selected_id(&self) -> String {
        self.editor
            .selected()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// The selected shape as JSON, or `null`.
    pub fn selected_shape_json(&self) -> String {
        serde_json::to_string(&self.editor.selected_shape()).unwrap_or_else(|_| "null".into())
    }

    pub fn delete_selected(&mut self) -> bool {
        self.editor.delete_selected().is_some()
    }

    pub fn bring_to_front(&mut self) -> bool {
        self.editor
            .selected()
            .is_some_and(|id| self.editor.bring_to_front(id))
    }

    pub fn send_to_back(&mut self) -> bool {
        self.editor
            .selected()
            .is_some_and(|id| self.editor.send_to_back(id))
    }

    // ─── Property panel ──────────────────────────────────────────────────

    /// Apply a discrete property change (color picker, toggle) to the
    /// selected shape and save it. `patch_json` holds the changed fields
    /// only, e.g. `{"strokeColor":"#ff0000"}`.
    pub fn commit_property(&mut self, patch_json: &str) -> bool {
        self.with_selected_patch(patch_json, |ed, id, patch| {
            ed.commit_property_edit(id, patch)
        })
    }

    /// Apply a live slider change without saving history. Call
    /// [`SketchCanvas::finish_property`] on release.
    pub fn preview_property(&mut self, patch_json: &str) -> bool {
        self.with_selected_patch(patch_json, |ed, id, patch| {
            ed.preview_property_edit(id, patch)
        })
    }

    pub fn finish_property(&mut self) {
        self.editor.finish_property_edit();
    }

    // ─── Drawing settings ────────────────────────────────────────────────

    pub fn settings_json(&self) -> String {
        serde_json::to_string(self.editor.settings()).unwrap_or_else(|_| "{}".into())
    }

    pub fn set_stroke_color(&mut self, color: &str) {
        self.editor.set_stroke_color(color);
    }

    pub fn set_fill_color(&mut self, color: &str) {
        self.editor.set_fill_color(color);
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.editor.set_stroke_width(width);
    }

    pub fn set_corner_radius(&mut self, radius: f64) {
        self.editor.set_corner_radius(radius);
    }

    pub fn set_fill_enabled(&mut self, enabled: bool) {
        self.editor.set_fill_enabled(enabled);
    }

    // ─── Canvas ──────────────────────────────────────────────────────────

    pub fn set_dimensions(&mut self, width: f64, height: f64) {
        self.editor
            .set_dimensions(CanvasDimensions::new(width, height));
    }

    /// Install a background image. `width`/`height` are its natural size.
    pub fn set_background_image(&mut self, url: &str, width: f64, height: f64, opacity: f64) {
        self.editor.set_background_image(Some(BackgroundImage {
            url: url.to_string(),
            width,
            height,
            opacity,
        }));
    }

    pub fn clear_background_image(&mut self) {
        self.editor.set_background_image(None);
    }

    pub fn set_background_opacity(&mut self, opacity: f64) {
        self.editor.set_background_opacity(opacity);
    }

    /// Stage an uploaded image for the image tool.
    pub fn set_pending_image(&mut self, src: &str, width: f64, height: f64) {
        self.editor.set_pending_image(Some(PendingImage {
            src: src.to_string(),
            width,
            height,
        }));
    }

    pub fn clear_pending_image(&mut self) {
        self.editor.set_pending_image(None);
    }

    /// Returns the new dark-mode flag.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.editor.toggle_dark_mode()
    }

    pub fn clear_shapes(&mut self) {
        self.editor.clear_shapes();
    }

    /// Remove every shape and the background, and reset history.
    pub fn clear_canvas(&mut self) {
        self.editor.clear_canvas();
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    // ─── Import / export ─────────────────────────────────────────────────

    pub fn shapes_json(&self) -> String {
        serde_json::to_string(self.editor.shapes().as_slice()).unwrap_or_else(|_| "[]".into())
    }

    /// Snapshot JSON of the whole drawing, or an empty string on failure.
    pub fn export_json(&self) -> String {
        self.editor.export_json().unwrap_or_else(|e| {
            log::error!("snapshot export failed: {e}");
            String::new()
        })
    }

    /// Load a snapshot. Returns JSON: `{"ok":true}` or `{"ok":false,"error":"..."}`.
    /// On error the drawing is left untouched.
    pub fn import_json(&mut self, json: &str) -> String {
        ok_or_error(self.editor.import_json(json))
    }

    pub fn export_svg(&self) -> String {
        self.editor.export_svg()
    }

    /// PNG bytes at the configured multiplier, or an empty array on failure.
    pub fn export_png(&self) -> Vec<u8> {
        self.png().unwrap_or_default()
    }

    /// PNG as a `data:` URL, or an empty string on failure.
    pub fn export_png_data_url(&self) -> String {
        self.png().map(|png| png_data_url(&png)).unwrap_or_default()
    }

    /// UI state JSON: current tool, selection, history flags and theme.
    pub fn state_json(&self) -> String {
        self.state().to_string()
    }
}

impl SketchCanvas {
    fn build(ctx: CanvasRenderingContext2d, config: EditorConfig) -> Self {
        let surface = Canvas2dSurface::new(ctx, config.dimensions);
        let dirty = surface.dirty_flag();
        log::info!(
            "canvas ready ({}×{})",
            config.dimensions.width,
            config.dimensions.height
        );
        Self {
            editor: Editor::new(Box::new(surface), config),
            dirty,
        }
    }

    fn state(&self) -> serde_json::Value {
        json!({
            "tool": self.editor.tool().as_str(),
            "selected": self.editor.selected().map(|id| id.as_str().to_string()),
            "canUndo": self.editor.can_undo(),
            "canRedo": self.editor.can_redo(),
            "darkMode": self.editor.is_dark_mode(),
            "shapeCount": self.editor.shapes().len(),
        })
    }

    fn png(&self) -> Option<Vec<u8>> {
        self.editor
            .export_raster()
            .map_err(|e| log::error!("PNG export failed: {e}"))
            .ok()
    }

    fn with_selected_patch<E: std::fmt::Display>(
        &mut self,
        patch_json: &str,
        apply: impl FnOnce(&mut Editor, ShapeId, &ShapePatch) -> Result<(), E>,
    ) -> bool {
        let Some(id) = self.editor.selected() else {
            return false;
        };
        let patch: ShapePatch = match serde_json::from_str(patch_json) {
            Ok(patch) => patch,
            Err(e) => {
                log::warn!("invalid property patch: {e}");
                return false;
            }
        };
        match apply(&mut self.editor, id, &patch) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("property edit on {id} failed: {e}");
                false
            }
        }
    }
}

// ─── Generation panel ────────────────────────────────────────────────────

/// Host side of the image-generation dialog.
///
/// The page performs the HTTP request itself: [`GenerationClient::begin`]
/// returns the request body plus a token, and the page reports back through
/// [`GenerationClient::resolve`] or [`GenerationClient::fail`].
#[wasm_bindgen]
#[derive(Default)]
pub struct GenerationClient {
    panel: GenerationPanel,
}

#[wasm_bindgen]
impl GenerationClient {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form_json(&self) -> String {
        serde_json::to_string(&self.panel.form).unwrap_or_else(|_| "{}".into())
    }

    /// Replace the form. Missing fields take their defaults.
    pub fn set_form(&mut self, form_json: &str) -> String {
        let result = serde_json::from_str::<GenerationForm>(form_json).map(|form| {
            self.panel.form = form;
        });
        ok_or_error(result)
    }

    /// Start a request, exporting the canvas when the form asks for it.
    /// Returns JSON: `{"ok":true,"token":n,"model":"...","request":{...}}`
    /// or `{"ok":false,"error":"..."}`.
    pub fn begin(&mut self, canvas: &SketchCanvas) -> String {
        let canvas_image = if self.panel.form.use_canvas {
            canvas.png().map(|png| png_data_url(&png))
        } else {
            None
        };
        match self.panel.begin(canvas_image) {
            Ok((token, request)) => json!({
                "ok": true,
                "token": token.id(),
                "model": request.model(),
                "request": request,
            })
            .to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Report the endpoint's HTTP status and body. Returns JSON:
    /// `{"ok":true,"stale":bool}` or `{"ok":false,"error":"..."}`.
    pub fn resolve(&mut self, token: u32, status: u16, body: &str) -> String {
        match self.panel.resolve(token_from(token), status, body) {
            Ok(applied) => json!({ "ok": true, "stale": !applied }).to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Report a network failure. Returns `false` for a stale token.
    pub fn fail(&mut self, token: u32, message: &str) -> bool {
        self.panel.fail(token_from(token), message)
    }

    pub fn reset(&mut self) {
        self.panel.reset();
    }

    /// `{"generating":bool,"image":"..."|null,"error":"..."|null}`
    pub fn state_json(&self) -> String {
        json!({
            "generating": self.panel.is_generating(),
            "image": self.panel.generated_image(),
            "error": self.panel.error(),
        })
        .to_string()
    }

    /// Place the generated image on the canvas. Returns the new shape id,
    /// or an empty string if there was nothing to add.
    pub fn add_to_canvas(&mut self, canvas: &mut SketchCanvas) -> String {
        match self.panel.add_to_canvas(&mut canvas.editor) {
            Ok(id) => id.map(|id| id.as_str().to_string()).unwrap_or_default(),
            Err(e) => {
                log::error!("adding generated image failed: {e}");
                String::new()
            }
        }
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// The lighting presets offered by the generation dialog, as JSON.
#[wasm_bindgen]
pub fn lighting_presets_json() -> String {
    serde_json::to_string(&sg_editor::presets::LIGHTING_PRESETS).unwrap_or_else(|_| "[]".into())
}

/// Validate snapshot JSON. Returns `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_snapshot(json: &str) -> String {
    ok_or_error(Snapshot::from_json(json).map(|_| ()))
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        ctrl,
        shift,
        alt,
        meta,
    }
}

fn token_from(token: u32) -> sg_editor::generation::RequestToken {
    sg_editor::generation::RequestToken::from_id(u64::from(token))
}

fn action_name(action: ShortcutAction) -> String {
    match action {
        ShortcutAction::Tool(kind) => format!("tool:{}", kind.as_str()),
        ShortcutAction::Undo => "undo".into(),
        ShortcutAction::Redo => "redo".into(),
        ShortcutAction::Delete => "delete".into(),
        ShortcutAction::BringToFront => "bringToFront".into(),
        ShortcutAction::SendToBack => "sendToBack".into(),
        ShortcutAction::FinishPath => "finishPath".into(),
    }
}

fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

fn ok_or_error<E: std::fmt::Display>(result: Result<(), E>) -> String {
    match result {
        Ok(()) => r#"{"ok":true}"#.to_string(),
        Err(e) => error_json(&e.to_string()),
    }
}

fn error_json(message: &str) -> String {
    json!({ "ok": false, "error": message }).to_string()
}

fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if console_log::init_with_level(log::Level::Debug).is_err() {
            web_sys::console::warn_1(&"logger already initialised".into());
        }
    });
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("SketchGen WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shortcut_actions_have_stable_names() {
        assert_eq!(action_name(ShortcutAction::Tool(ToolKind::Bezier)), "tool:bezier");
        assert_eq!(action_name(ShortcutAction::BringToFront), "bringToFront");
    }

    #[test]
    fn results_become_ok_error_json() {
        assert_eq!(ok_or_error::<String>(Ok(())), r#"{"ok":true}"#);
        let err: serde_json::Value =
            serde_json::from_str(&validate_snapshot("{ nope")).unwrap();
        assert_eq!(err["ok"], false);
        assert!(err["error"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn png_data_url_is_base64() {
        assert_eq!(png_data_url(&[0x89, b'P', b'N', b'G']), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn presets_list_includes_none() {
        let presets: serde_json::Value = serde_json::from_str(&lighting_presets_json()).unwrap();
        assert_eq!(presets[0]["key"], "none");
    }

    #[test]
    fn form_json_is_accepted_and_stale_failures_ignored() {
        let mut client = GenerationClient::new();
        assert_eq!(
            client.set_form(r#"{"prompt":"","useCanvas":false}"#),
            r#"{"ok":true}"#
        );
        assert!(!client.panel.is_generating());
        assert!(!client.fail(1, "offline"));
    }
}
