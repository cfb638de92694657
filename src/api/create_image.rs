use derive_builder::Builder;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::constants::IMAGE_GENERATIONS_PATH;
use crate::IntoRequest;

#[derive(Debug, Clone, Serialize, Builder)]
#[builder(pattern = "mutable", build_fn(validate = "Self::validate"))]
pub struct CreateImageRequest {
    /// A text description of the desired image(s). The maximum length is 1000 characters for dall-e-2 and 4000 characters for dall-e-3.
    #[builder(setter(into))]
    prompt: String,
    /// The model to use for image generation.
    #[builder(default)]
    model: ImageModel,
    /// The number of images to generate. Must be between 1 and 10. For dall-e-3, only n=1 is supported.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<usize>,
    /// The quality of the image that will be generated.
    /// hd creates images with finer details and greater consistency across the image.
    /// This param is only supported for dall-e-3.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<ImageQuality>,
    /// The format in which the generated images are returned. Must be one of url or b64_json.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ImageResponseFormat>,
    /// The size of the generated images.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<ImageSize>,
    /// The style of the generated images. Vivid leans towards hyper-real and dramatic images,
    /// natural towards less hyper-real looking ones. This param is only supported for dall-e-3.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<ImageStyle>,
    /// A unique identifier representing your end-user.
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq, Default)]
pub enum ImageModel {
    #[serde(rename = "dall-e-2")]
    DallE2,
    #[serde(rename = "dall-e-3")]
    #[default]
    DallE3,
}

#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageQuality {
    #[default]
    Standard,
    Hd,
}

#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageResponseFormat {
    #[default]
    Url,
    B64Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    #[serde(rename = "256x256")]
    Small,
    #[serde(rename = "512x512")]
    Medium,
    #[serde(rename = "1024x1024")]
    #[default]
    Large,
    #[serde(rename = "1792x1024")]
    LargeWide,
    #[serde(rename = "1024x1792")]
    LargeTall,
}

#[derive(Debug, Clone, Serialize, Deserialize, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageStyle {
    #[default]
    Vivid,
    Natural,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateImageResponse {
    pub created: u64,
    pub data: Vec<ImageObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageObject {
    /// The base64-encoded JSON of the generated image, if response_format is b64_json.
    pub b64_json: Option<String>,
    /// The URL of the generated image, if response_format is url (default).
    pub url: Option<String>,
    /// The prompt that was used to generate the image, if there was any revision to the prompt.
    /// dall-e-2 never revises prompts.
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

impl ImageModel {
    pub fn max_prompt_chars(&self) -> usize {
        match self {
            ImageModel::DallE2 => 1000,
            ImageModel::DallE3 => 4000,
        }
    }

    pub fn max_images(&self) -> usize {
        match self {
            ImageModel::DallE2 => 10,
            ImageModel::DallE3 => 1,
        }
    }

    pub fn supports_size(&self, size: ImageSize) -> bool {
        match self {
            ImageModel::DallE2 => matches!(
                size,
                ImageSize::Small | ImageSize::Medium | ImageSize::Large
            ),
            ImageModel::DallE3 => matches!(
                size,
                ImageSize::Large | ImageSize::LargeWide | ImageSize::LargeTall
            ),
        }
    }
}

// https://platform.openai.com/docs/api-reference/images/create
impl IntoRequest for CreateImageRequest {
    fn into_request(self, base_url: &str, client: Client) -> RequestBuilder {
        client
            .post(format!("{}{}", base_url, IMAGE_GENERATIONS_PATH))
            .json(&self)
    }
}

impl CreateImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: ImageModel::default(),
            n: None,
            quality: None,
            response_format: None,
            size: None,
            style: None,
            user: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model(&self) -> ImageModel {
        self.model
    }
}

impl CreateImageRequestBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        let model = self.model.unwrap_or_default();

        if let Some(prompt) = &self.prompt {
            let len = prompt.chars().count();
            if len > model.max_prompt_chars() {
                return Err(format!(
                    "prompt is {} characters, {:?} accepts at most {}",
                    len,
                    model,
                    model.max_prompt_chars()
                ));
            }
        }

        if let Some(Some(n)) = self.n {
            if n == 0 || n > model.max_images() {
                return Err(format!(
                    "n must be between 1 and {} for {:?}, got {}",
                    model.max_images(),
                    model,
                    n
                ));
            }
        }

        if model != ImageModel::DallE3 {
            if matches!(self.quality, Some(Some(_))) {
                return Err("quality is only supported for dall-e-3".to_string());
            }
            if matches!(self.style, Some(Some(_))) {
                return Err("style is only supported for dall-e-3".to_string());
            }
        }

        if let Some(Some(size)) = self.size {
            if !model.supports_size(size) {
                return Err(format!("size {:?} is not supported by {:?}", size, model));
            }
        }

        Ok(())
    }
}
