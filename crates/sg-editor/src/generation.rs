//! Client side of the image-generation endpoint.
//!
//! The panel never performs I/O. [`GenerationPanel::begin`] validates the
//! form and hands back a request plus a [`RequestToken`]; the host sends
//! it and reports the result through [`GenerationPanel::resolve`] or
//! [`GenerationPanel::fail`]. Only the newest token is honoured, so a
//! response arriving after a reset is dropped.

use crate::editor::Editor;
use crate::presets::{NO_PRESET, compose_prompt};
use serde::{Deserialize, Serialize};
use sg_core::{ModelError, Shape, ShapeId, ShapeKind};
use thiserror::Error;

/// Where a generated image lands when added to the canvas.
pub const PLACEMENT: (f64, f64) = (100.0, 100.0);
/// Size of a generated image on the canvas.
pub const PLACED_SIZE: f64 = 512.0;
pub const DEFAULT_MATERIAL_WEIGHT: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Preview,
    Final,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Preview => "preview",
            Quality::Final => "final",
        }
    }
}

/// Image model the endpoint uses for a quality tier.
pub fn model_for_quality(quality: Quality) -> &'static str {
    match quality {
        Quality::Preview => "gemini-2.5-flash-image",
        Quality::Final => "gemini-3-pro-image-preview",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub canvas_image: Option<String>,
    pub use_canvas: bool,
    pub quality: Quality,
    pub preset: String,
    pub material_reference: Option<String>,
    pub material_weight: f64,
}

impl GenerationRequest {
    /// Prompt after the lighting preset is applied.
    pub fn composed_prompt(&self) -> String {
        compose_prompt(&self.prompt, &self.preset)
    }

    pub fn model(&self) -> &'static str {
        model_for_quality(self.quality)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationResponse {
    pub success: bool,
    pub image_url: Option<String>,
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("Please enter a prompt")]
    EmptyPrompt,
    #[error("a generation request is already in flight")]
    Busy,
    #[error("Failed to export canvas")]
    CanvasExport,
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("No image URL received")]
    MissingImage,
    #[error("invalid response: {0}")]
    Parse(String),
}

/// Interpret an endpoint reply.
pub fn parse_response(status: u16, body: &str) -> Result<GenerationResponse, GenerationError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| "Failed to generate image".into());
        return Err(GenerationError::Status { status, message });
    }
    let response: GenerationResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;
    match &response.image_url {
        Some(url) if response.success && !url.is_empty() => Ok(response),
        _ => Err(GenerationError::MissingImage),
    }
}

/// Identifies one submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Numeric form, for hosts that keep the token outside Rust.
    pub fn id(self) -> u64 {
        self.0
    }

    pub fn from_id(id: u64) -> Self {
        Self(id)
    }
}

/// User-editable generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationForm {
    pub prompt: String,
    pub use_canvas: bool,
    pub quality: Quality,
    pub preset: String,
    pub material_reference: Option<String>,
    pub material_weight: f64,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            use_canvas: true,
            quality: Quality::Preview,
            preset: NO_PRESET.into(),
            material_reference: None,
            material_weight: DEFAULT_MATERIAL_WEIGHT,
        }
    }
}

#[derive(Debug, Default)]
pub struct GenerationPanel {
    pub form: GenerationForm,
    last_token: u64,
    in_flight: Option<RequestToken>,
    generated: Option<GenerationResponse>,
    error: Option<String>,
}

impl GenerationPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Data URL of the last generated image, until it is added or reset.
    pub fn generated_image(&self) -> Option<&str> {
        self.generated.as_ref()?.image_url.as_deref()
    }

    pub fn generated(&self) -> Option<&GenerationResponse> {
        self.generated.as_ref()
    }

    /// Message to show the user after a failed request.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Validate the form and start a request.
    ///
    /// `canvas_image` is the PNG data URL of the canvas; it is required
    /// when the form asks to include the canvas.
    pub fn begin(
        &mut self,
        canvas_image: Option<String>,
    ) -> Result<(RequestToken, GenerationRequest), GenerationError> {
        if self.in_flight.is_some() {
            log::warn!("generation requested while another is in flight");
            return Err(GenerationError::Busy);
        }
        if self.form.prompt.trim().is_empty() {
            return Err(self.reject(GenerationError::EmptyPrompt));
        }
        let canvas_image = match (self.form.use_canvas, canvas_image) {
            (true, None) => return Err(self.reject(GenerationError::CanvasExport)),
            (true, image) => image,
            (false, _) => None,
        };
        self.error = None;
        self.generated = None;
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        self.in_flight = Some(token);

        let form = &self.form;
        let request = GenerationRequest {
            prompt: form.prompt.clone(),
            canvas_image,
            use_canvas: form.use_canvas,
            quality: form.quality,
            preset: form.preset.clone(),
            material_reference: form.material_reference.clone(),
            material_weight: form.material_weight.clamp(0.0, 1.0),
        };
        log::info!(
            "generation {} started ({}, preset {})",
            token.0,
            request.quality.as_str(),
            request.preset
        );
        Ok((token, request))
    }

    /// Report the endpoint's reply. Returns `Ok(false)` for a stale token.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        status: u16,
        body: &str,
    ) -> Result<bool, GenerationError> {
        if !self.settle(token) {
            return Ok(false);
        }
        match parse_response(status, body) {
            Ok(response) => {
                log::info!("generation {} finished", token.0);
                self.generated = Some(response);
                Ok(true)
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Report a transport failure. Returns `false` for a stale token.
    pub fn fail(&mut self, token: RequestToken, message: impl Into<String>) -> bool {
        if !self.settle(token) {
            return false;
        }
        self.reject(GenerationError::Network(message.into()));
        true
    }

    /// Drop the in-flight request, result and error.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.generated = None;
        self.error = None;
    }

    /// Place the generated image on the canvas and clear it from the panel.
    pub fn add_to_canvas(&mut self, editor: &mut Editor) -> Result<Option<ShapeId>, ModelError> {
        let Some(src) = self.generated_image().map(str::to_string) else {
            return Ok(None);
        };
        let mut shape = Shape::new(
            PLACEMENT.0,
            PLACEMENT.1,
            ShapeKind::Image {
                src,
                width: PLACED_SIZE,
                height: PLACED_SIZE,
            },
        )
        .fill("");
        shape.scale_x = Some(1.0);
        shape.scale_y = Some(1.0);
        let id = shape.id;
        editor.add_shape(shape)?;
        self.generated = None;
        Ok(Some(id))
    }

    fn settle(&mut self, token: RequestToken) -> bool {
        if self.in_flight != Some(token) {
            log::debug!("dropping stale generation response {}", token.0);
            return false;
        }
        self.in_flight = None;
        true
    }

    fn reject(&mut self, error: GenerationError) -> GenerationError {
        log::error!("generation failed: {error}");
        self.error = Some(error.to_string());
        error
    }
}
