pub mod config;
pub mod editor;
pub mod generation;
pub mod history;
pub mod input;
pub mod presets;
pub mod shortcuts;
pub mod sync;
pub mod tools;

pub use config::EditorConfig;
pub use editor::Editor;
pub use generation::{GenerationError, GenerationPanel, GenerationRequest, GenerationResponse};
pub use history::History;
pub use input::{InputEvent, Modifiers};
pub use tools::{PendingImage, ToolKind};
