//! Editor application state.
//!
//! One explicit object owns the shape list, history, settings, canvas
//! state and the canvas synchronizer. Every operation leaves the surface in
//! sync with the model. Structural changes save exactly one history
//! snapshot after they are applied.

use crate::config::EditorConfig;
use crate::history::History;
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sync::{CanvasSync, SceneState};
use crate::tools::{PendingImage, Tool, ToolContext, ToolKind, ToolOutcome, tool_for};
use kurbo::Point;
use sg_core::{
    BackgroundImage, CanvasDimensions, DrawingSettings, ModelError, Shape, ShapeId, ShapeList,
    ShapePatch, Snapshot, SnapshotError,
};
use sg_render::{CanvasTheme, RasterError, SurfaceAdapter, hit};

pub struct Editor {
    shapes: ShapeList,
    history: History,
    settings: DrawingSettings,
    dimensions: CanvasDimensions,
    background: Option<BackgroundImage>,
    selected: Option<ShapeId>,
    tool: Box<dyn Tool>,
    pending_image: Option<PendingImage>,
    dark_mode: bool,
    config: EditorConfig,
    sync: CanvasSync,
}

impl Editor {
    /// A blank editor drawing onto `surface`.
    ///
    /// History starts with one snapshot of the empty canvas, so the first
    /// shape added can be undone.
    pub fn new(surface: Box<dyn SurfaceAdapter>, config: EditorConfig) -> Self {
        let mut history = History::new(config.max_history);
        history.save(&[]);
        let mut editor = Self {
            shapes: ShapeList::new(),
            history,
            settings: DrawingSettings::default(),
            dimensions: config.dimensions,
            background: None,
            selected: None,
            tool: tool_for(ToolKind::Select),
            pending_image: None,
            dark_mode: false,
            sync: CanvasSync::new(surface, config.uniform_scale_epsilon),
            config,
        };
        editor.sync_background();
        editor.render();
        editor
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn shapes(&self) -> &ShapeList {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> &DrawingSettings {
        &self.settings
    }

    pub fn dimensions(&self) -> CanvasDimensions {
        self.dimensions
    }

    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    pub fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.shapes.get(self.selected?)
    }

    pub fn tool(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn pending_image(&self) -> Option<&PendingImage> {
        self.pending_image.as_ref()
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &dyn SurfaceAdapter {
        self.sync.surface()
    }

    pub fn surface_mut(&mut self) -> &mut dyn SurfaceAdapter {
        self.sync.surface_mut()
    }

    // ─── Shape operations ────────────────────────────────────────────────

    pub fn add_shape(&mut self, shape: Shape) -> Result<(), ModelError> {
        let id = shape.id;
        self.shapes.add(shape)?;
        log::debug!("added {id}");
        self.save_and_render();
        Ok(())
    }

    /// Merge a patch into a shape without saving history.
    pub fn update_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> Result<(), ModelError> {
        self.shapes.update(id, patch)?;
        self.render();
        Ok(())
    }

    /// A discrete property edit: update, then save once.
    pub fn commit_property_edit(
        &mut self,
        id: ShapeId,
        patch: &ShapePatch,
    ) -> Result<(), ModelError> {
        self.shapes.update(id, patch)?;
        self.save_and_render();
        Ok(())
    }

    /// A live edit (slider drag). Call [`finish_property_edit`] when it ends.
    ///
    /// [`finish_property_edit`]: Editor::finish_property_edit
    pub fn preview_property_edit(
        &mut self,
        id: ShapeId,
        patch: &ShapePatch,
    ) -> Result<(), ModelError> {
        self.update_shape(id, patch)
    }

    pub fn finish_property_edit(&mut self) {
        self.save_and_render();
    }

    pub fn delete_shape(&mut self, id: ShapeId) -> Result<Shape, ModelError> {
        let removed = self.shapes.remove(id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        log::debug!("deleted {id}");
        self.save_and_render();
        Ok(removed)
    }

    /// Delete the selected shape, if any.
    pub fn delete_selected(&mut self) -> Option<Shape> {
        let id = self.selected?;
        self.delete_shape(id).ok()
    }

    pub fn select_shape(&mut self, id: Option<ShapeId>) {
        self.selected = id.filter(|id| self.shapes.contains(*id));
        self.render();
    }

    pub fn bring_to_front(&mut self, id: ShapeId) -> bool {
        let changed = self.shapes.bring_to_front(id);
        if changed {
            self.save_and_render();
        }
        changed
    }

    pub fn send_to_back(&mut self, id: ShapeId) -> bool {
        let changed = self.shapes.send_to_back(id);
        if changed {
            self.save_and_render();
        }
        changed
    }

    /// Remove every shape. Background and history are kept.
    pub fn clear_shapes(&mut self) {
        self.shapes.clear();
        self.selected = None;
        self.save_and_render();
    }

    /// Remove every shape and the background, and forget all history.
    pub fn clear_canvas(&mut self) {
        self.shapes.clear();
        self.selected = None;
        self.background = None;
        self.history.clear();
        self.sync_background();
        self.render();
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(shapes) => {
                self.restore(shapes);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(shapes) => {
                self.restore(shapes);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, shapes: Vec<Shape>) {
        self.shapes.replace_all(shapes);
        if let Some(id) = self.selected
            && !self.shapes.contains(id)
        {
            self.selected = None;
        }
        self.render();
    }

    // ─── Canvas state ────────────────────────────────────────────────────

    pub fn set_dimensions(&mut self, dimensions: CanvasDimensions) {
        self.dimensions = dimensions;
        self.sync_background();
        self.save_and_render();
    }

    pub fn set_background_image(&mut self, image: Option<BackgroundImage>) {
        self.background = image;
        self.sync_background();
        self.save_and_render();
    }

    /// Adjust the background opacity. Not recorded in history.
    pub fn set_background_opacity(&mut self, opacity: f64) {
        let Some(bg) = self.background.as_mut() else {
            log::debug!("background opacity change without a background");
            return;
        };
        bg.opacity = opacity.clamp(0.0, 1.0);
        self.sync_background();
    }

    pub fn set_pending_image(&mut self, image: Option<PendingImage>) {
        self.pending_image = image;
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.render();
        self.dark_mode
    }

    /// Switch tools. In-progress drawing is dropped and the selection cleared.
    pub fn set_tool(&mut self, kind: ToolKind) {
        self.tool.reset();
        self.sync.clear_overlay();
        if self.tool.kind() != kind {
            self.tool = tool_for(kind);
            log::debug!("tool → {}", kind.as_str());
        }
        self.selected = None;
        self.render();
    }

    // ─── Settings ────────────────────────────────────────────────────────

    pub fn set_settings(&mut self, settings: DrawingSettings) {
        self.settings = settings;
    }

    pub fn set_stroke_color(&mut self, color: impl Into<String>) {
        self.settings.stroke_color = color.into();
    }

    pub fn set_fill_color(&mut self, color: impl Into<String>) {
        self.settings.fill_color = color.into();
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.settings.stroke_width = width.max(0.0);
    }

    pub fn set_corner_radius(&mut self, radius: f64) {
        self.settings.corner_radius = radius.max(0.0);
    }

    pub fn set_fill_enabled(&mut self, enabled: bool) {
        self.settings.fill_enabled = enabled;
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f64, y: f64, modifiers: Modifiers) {
        let hit = if self.tool.kind() == ToolKind::Select {
            self.sync.surface_mut().surface_mut().begin_gesture(x, y)
        } else {
            hit::pick(self.sync.surface().surface(), Point::new(x, y))
        };
        self.dispatch(&InputEvent::PointerDown { x, y, modifiers }, hit);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, modifiers: Modifiers) {
        let surface = self.sync.surface_mut();
        if surface.surface().in_gesture() {
            surface.surface_mut().update_gesture(x, y);
            surface.present();
            return;
        }
        self.dispatch(&InputEvent::PointerMove { x, y, modifiers }, None);
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, modifiers: Modifiers) {
        if self.sync.surface().surface().in_gesture() {
            self.sync.surface_mut().surface_mut().end_gesture();
            self.complete_gestures();
            return;
        }
        self.dispatch(&InputEvent::PointerUp { x, y, modifiers }, None);
    }

    /// Handle a key press. Returns the action it triggered, if any.
    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(key, modifiers)?;
        match action {
            ShortcutAction::Tool(kind) => self.set_tool(kind),
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::Delete => {
                self.delete_selected();
            }
            ShortcutAction::BringToFront => {
                if let Some(id) = self.selected {
                    self.bring_to_front(id);
                }
            }
            ShortcutAction::SendToBack => {
                if let Some(id) = self.selected {
                    self.send_to_back(id);
                }
            }
            ShortcutAction::FinishPath => {
                let ctx = ToolContext {
                    settings: &self.settings,
                    config: &self.config,
                    hit: None,
                    pending_image: self.pending_image.as_ref(),
                };
                let outcome = self.tool.finish(&ctx);
                self.apply(outcome);
            }
        }
        Some(action)
    }

    /// Fold every finished gesture back into the model.
    ///
    /// Saves one history snapshot if anything changed. Returns the number
    /// of shapes updated.
    pub fn complete_gestures(&mut self) -> usize {
        let mut updated = 0;
        for id in self.sync.take_completed() {
            let Some(shape) = self.shapes.get(id).cloned() else {
                log::debug!("gesture completed on unknown shape {id}");
                continue;
            };
            let Some(patch) = self.sync.complete_gesture(&shape) else {
                continue;
            };
            match self.shapes.update(id, &patch) {
                Ok(()) => updated += 1,
                Err(e) => log::warn!("gesture update rejected: {e}"),
            }
        }
        if updated > 0 {
            self.save_and_render();
        }
        updated
    }

    fn dispatch(&mut self, event: &InputEvent, hit: Option<ShapeId>) {
        let ctx = ToolContext {
            settings: &self.settings,
            config: &self.config,
            hit,
            pending_image: self.pending_image.as_ref(),
        };
        let outcome = self.tool.handle(event, &ctx);
        self.apply(outcome);
    }

    fn apply(&mut self, outcome: ToolOutcome) {
        match outcome {
            ToolOutcome::None => {}
            ToolOutcome::Preview(overlay) => self.sync.show_overlay(overlay),
            ToolOutcome::Discard => self.sync.clear_overlay(),
            ToolOutcome::Commit(shape) => {
                self.sync.clear_overlay();
                if let Err(e) = self.add_shape(shape) {
                    log::warn!("commit rejected: {e}");
                }
            }
            ToolOutcome::Select(id) => {
                self.selected = id;
                self.sync.surface_mut().present();
            }
            ToolOutcome::Delete(id) => {
                if let Err(e) = self.delete_shape(id) {
                    log::warn!("delete rejected: {e}");
                }
            }
        }
    }

    // ─── Export / import ─────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.shapes.as_slice(),
            self.dimensions,
            self.background.as_ref(),
        )
    }

    pub fn export_json(&self) -> Result<String, SnapshotError> {
        let json = self.snapshot().to_json()?;
        log::info!("exported {} shapes as JSON", self.shapes.len());
        Ok(json)
    }

    /// Replace the drawing with a snapshot.
    ///
    /// The document is parsed and validated first; on error nothing
    /// changes. On success one history snapshot is saved.
    pub fn import_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let snapshot = Snapshot::from_json(json)?;
        self.dimensions = snapshot.dimensions;
        self.shapes.clear();
        self.selected = None;
        for shape in snapshot.shapes {
            self.shapes
                .add(shape)
                .map_err(|e| SnapshotError::Invalid(e.to_string()))?;
        }
        self.background = snapshot.background_image;
        self.sync_background();
        self.save_and_render();
        Ok(())
    }

    pub fn export_svg(&self) -> String {
        sg_core::svg::export_svg(self.shapes.as_slice(), self.dimensions)
    }

    /// PNG of the drawing at the configured multiplier.
    pub fn export_raster(&self) -> Result<Vec<u8>, RasterError> {
        self.sync.surface().export_raster(self.config.raster_multiplier)
    }

    // ─── Sync ────────────────────────────────────────────────────────────

    fn theme(&self) -> CanvasTheme {
        if self.dark_mode {
            CanvasTheme::Dark
        } else {
            CanvasTheme::Light
        }
    }

    fn render(&mut self) {
        let state = SceneState {
            dimensions: self.dimensions,
            tool: self.tool.kind(),
            selected: self.selected,
            theme: self.theme(),
        };
        self.sync.render(self.shapes.as_slice(), state);
    }

    fn sync_background(&mut self) {
        self.sync
            .sync_background(self.background.as_ref(), self.dimensions);
    }

    fn save_and_render(&mut self) {
        self.history.save(self.shapes.as_slice());
        self.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sg_core::ShapeKind;
    use sg_render::RecordingSurface;

    fn editor() -> Editor {
        Editor::new(
            Box::new(RecordingSurface::new(CanvasDimensions::default())),
            EditorConfig::default(),
        )
    }

    fn circle(id: &str) -> Shape {
        Shape::with_id(ShapeId::intern(id), 50.0, 50.0, ShapeKind::Circle { radius: 10.0 })
            .fill("#ff0000")
    }

    #[test]
    fn first_add_is_undoable() {
        let mut ed = editor();
        ed.add_shape(circle("undoable")).unwrap();
        assert!(ed.can_undo());
        assert!(ed.undo());
        assert!(ed.shapes().is_empty());
    }

    #[test]
    fn duplicate_add_keeps_history_untouched() {
        let mut ed = editor();
        ed.add_shape(circle("dup")).unwrap();
        let len = ed.history().len();
        assert_eq!(
            ed.add_shape(circle("dup")),
            Err(ModelError::DuplicateId(ShapeId::intern("dup")))
        );
        assert_eq!(ed.history().len(), len);
    }

    #[test]
    fn set_tool_clears_selection() {
        let mut ed = editor();
        ed.add_shape(circle("sel")).unwrap();
        ed.select_shape(Some(ShapeId::intern("sel")));
        assert_eq!(ed.selected(), Some(ShapeId::intern("sel")));
        ed.set_tool(ToolKind::Rectangle);
        assert_eq!(ed.selected(), None);
        assert_eq!(ed.tool(), ToolKind::Rectangle);
    }

    #[test]
    fn background_opacity_skips_history() {
        let mut ed = editor();
        ed.set_background_image(Some(BackgroundImage {
            url: "bg.png".into(),
            width: 100.0,
            height: 100.0,
            opacity: 1.0,
        }));
        let len = ed.history().len();
        ed.set_background_opacity(0.3);
        assert_eq!(ed.history().len(), len);
        assert_eq!(ed.background_image().map(|b| b.opacity), Some(0.3));
        assert_eq!(
            ed.surface().surface().background().map(|b| b.opacity),
            Some(0.3)
        );
    }

    #[test]
    fn clear_canvas_forgets_history() {
        let mut ed = editor();
        ed.add_shape(circle("gone")).unwrap();
        ed.clear_canvas();
        assert!(ed.shapes().is_empty());
        assert_eq!(ed.history().index(), -1);
        assert!(!ed.can_undo());
    }

    #[test]
    fn shapes_are_interactive_only_in_select_mode() {
        let mut ed = editor();
        ed.add_shape(circle("inter")).unwrap();
        assert!(ed.surface().surface().primitives()[0].interactive);
        ed.set_tool(ToolKind::Line);
        assert!(!ed.surface().surface().primitives()[0].interactive);
    }

    #[test]
    fn dark_mode_changes_canvas_background() {
        let mut ed = editor();
        assert!(ed.toggle_dark_mode());
        assert_eq!(ed.surface().surface().theme, CanvasTheme::Dark);
    }
}
