//! Prompt templates that give every generated asset the same documentary look
//!
//! Templates live in the `[style]` section of config.toml. The image
//! template may reference `{aspect_ratio}`, `{dimensions}` and `{prompt}`.

use crate::provider::AspectRatio;
use serde::{Deserialize, Serialize};

const DEFAULT_IMAGE_TEMPLATE: &str = "Generate a cinematic, high-quality image for a documentary video.
Aspect ratio: {aspect_ratio} ({dimensions})
Style: Documentary, historical, cinematic lighting, professional quality

Subject: {prompt}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptStyle {
    #[serde(default = "default_image_template")]
    pub image_template: String,
    #[serde(default = "default_video_prefix")]
    pub video_prefix: String,
    #[serde(default = "default_image_to_video_prefix")]
    pub image_to_video_prefix: String,
    #[serde(default = "default_music_prefix")]
    pub music_prefix: String,
}

impl Default for PromptStyle {
    fn default() -> Self {
        Self {
            image_template: default_image_template(),
            video_prefix: default_video_prefix(),
            image_to_video_prefix: default_image_to_video_prefix(),
            music_prefix: default_music_prefix(),
        }
    }
}

fn default_image_template() -> String {
    DEFAULT_IMAGE_TEMPLATE.to_string()
}
fn default_video_prefix() -> String {
    "Cinematic documentary footage for documentary video: ".to_string()
}
fn default_image_to_video_prefix() -> String {
    "Animate this image with cinematic motion: ".to_string()
}
fn default_music_prefix() -> String {
    "Background music: ".to_string()
}

impl PromptStyle {
    pub fn image_prompt(&self, prompt: &str, aspect: AspectRatio) -> String {
        let (w, h) = aspect.dimensions();
        self.image_template
            .replace("{aspect_ratio}", aspect.as_str())
            .replace("{dimensions}", &format!("{}x{}", w, h))
            // last, so placeholders typed inside the user prompt stay literal
            .replace("{prompt}", prompt)
    }

    /// Text-to-video, or image-to-video when a source frame is supplied
    pub fn video_prompt(&self, prompt: &str, from_image: bool) -> String {
        if from_image {
            format!("{}{}", self.image_to_video_prefix, prompt)
        } else {
            format!("{}{}", self.video_prefix, prompt)
        }
    }

    pub fn music_prompt(&self, prompt: &str) -> String {
        format!("{}{}", self.music_prefix, prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_prompt_template() {
        let style = PromptStyle::default();
        let prompt = style.image_prompt("Steam locomotive at Bori Bunder", AspectRatio::Portrait);
        assert!(prompt.starts_with("Generate a cinematic, high-quality image"));
        assert!(prompt.contains("Aspect ratio: 9:16 (1080x1920)"));
        assert!(prompt.ends_with("Subject: Steam locomotive at Bori Bunder"));
    }

    #[test]
    fn test_user_prompt_is_not_expanded() {
        let style = PromptStyle {
            image_template: "[{aspect_ratio} {dimensions}] {prompt}".to_string(),
            ..Default::default()
        };
        assert_eq!(
            style.image_prompt("poster reading {aspect_ratio} and {prompt}", AspectRatio::Landscape),
            "[16:9 1920x1080] poster reading {aspect_ratio} and {prompt}"
        );
    }

    #[test]
    fn test_video_and_music_prefixes() {
        let style = PromptStyle::default();
        assert_eq!(
            style.video_prompt("train crossing a bridge", false),
            "Cinematic documentary footage for documentary video: train crossing a bridge"
        );
        assert_eq!(
            style.video_prompt("train crossing a bridge", true),
            "Animate this image with cinematic motion: train crossing a bridge"
        );
        assert_eq!(style.music_prompt("tense strings"), "Background music: tense strings");
    }

    #[test]
    fn test_custom_template() {
        let style = PromptStyle {
            image_template: "{prompt} [{aspect_ratio}]".to_string(),
            ..Default::default()
        };
        assert_eq!(style.image_prompt("map", AspectRatio::Square), "map [1:1]");
    }
}
