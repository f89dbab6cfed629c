//! Lighting presets appended to generation prompts.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LightingPreset {
    pub key: &'static str,
    pub name: &'static str,
    pub prompt: &'static str,
    pub description: &'static str,
}

pub const NO_PRESET: &str = "none";

pub const LIGHTING_PRESETS: [LightingPreset; 5] = [
    LightingPreset {
        key: NO_PRESET,
        name: "None",
        prompt: "",
        description: "No lighting preset applied",
    },
    LightingPreset {
        key: "studio",
        name: "Studio",
        prompt: "professional studio lighting, clean minimalist cyclorama background, softbox fill, 8k resolution, sharp focus, commercial photography aesthetic",
        description: "Clean professional studio setup",
    },
    LightingPreset {
        key: "outdoor",
        name: "Outdoor/Natural",
        prompt: "natural golden hour sunlight, soft lens flare, outdoor lifestyle setting, realistic depth of field, 35mm lens style",
        description: "Natural outdoor lighting",
    },
    LightingPreset {
        key: "ecommerce",
        name: "E-commerce",
        prompt: "pure white background, high-contrast rim lighting to define edges, product-focused, shadow-less background, sharp details",
        description: "Clean white background for product shots",
    },
    LightingPreset {
        key: "moody",
        name: "Moody/Dramatic",
        prompt: "dramatic low-key lighting, deep shadows, high contrast, cinematic mood, selective focus, artistic lighting",
        description: "Dramatic mood lighting",
    },
];

pub fn lighting_preset(key: &str) -> Option<&'static LightingPreset> {
    LIGHTING_PRESETS.iter().find(|p| p.key == key)
}

/// The prompt sent for generation: the user's prompt, plus the preset's
/// environment description when a known preset other than `none` is chosen.
pub fn compose_prompt(prompt: &str, preset: &str) -> String {
    match lighting_preset(preset).filter(|p| p.key != NO_PRESET) {
        Some(p) => format!("{prompt}. Environment: {}.", p.prompt),
        None => prompt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn preset_is_appended() {
        assert_eq!(
            compose_prompt("a chair", "moody"),
            "a chair. Environment: dramatic low-key lighting, deep shadows, high contrast, cinematic mood, selective focus, artistic lighting."
        );
    }

    #[test]
    fn none_and_unknown_leave_prompt_alone() {
        assert_eq!(compose_prompt("a chair", "none"), "a chair");
        assert_eq!(compose_prompt("a chair", "neon"), "a chair");
    }

    #[test]
    fn table_lookup() {
        assert_eq!(lighting_preset("outdoor").map(|p| p.name), Some("Outdoor/Natural"));
        assert_eq!(LIGHTING_PRESETS.len(), 5);
    }
}
