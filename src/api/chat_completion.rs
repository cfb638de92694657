use derive_builder::Builder;
use reqwest::{Client, RequestBuilder};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::vision::ContentPart;
use crate::constants::CHAT_COMPLETIONS_PATH;
use crate::IntoRequest;

const MAX_STOP_SEQUENCES: usize = 4;

#[derive(Debug, Clone, Serialize, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct ChatCompletionRequest {
    /// A list of messages comprising the conversation so far.
    #[builder(setter(into))]
    messages: Vec<ChatCompletionMessage>,
    /// ID of the model to use.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ChatCompleteModel>,
    /// Number between -2.0 and 2.0. Positive values penalize new tokens based on their existing frequency in the text so far.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    /// The maximum number of tokens to generate in the chat completion.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    /// How many chat completion choices to generate for each input message.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<usize>,
    /// Number between -2.0 and 2.0. Positive values penalize new tokens based on whether they appear in the text so far.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    /// Setting to `json_object` enables JSON mode.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ChatResponseFormatObject>,
    /// Best-effort deterministic sampling; compare `system_fingerprint` across responses.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    /// Up to 4 sequences where the API will stop generating further tokens.
    #[builder(default, setter(into))]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    /// Set by the client depending on whether the streaming call is used.
    #[builder(setter(skip))]
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// Sampling temperature between 0 and 2.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Nucleus sampling probability mass, between 0 and 1.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    /// A list of tools the model may call. Currently, only functions are supported as a tool.
    #[builder(default, setter(into))]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    /// Controls which (if any) function is called by the model.
    #[builder(default, setter(strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    /// A unique identifier representing your end-user.
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolChoice {
    #[default]
    None,
    Auto,
    Required,
    Function {
        name: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// The type of the tool. Currently, only function is supported.
    r#type: ToolType,
    function: FunctionInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// A description of what the function does, used by the model to choose when and how to call the function.
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Must be a-z, A-Z, 0-9, or contain underscores and dashes, with a maximum length of 64.
    name: String,
    /// The parameters the function accepts, described as a JSON Schema object.
    parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponseFormatObject {
    r#type: ChatResponseFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatResponseFormat {
    #[default]
    Text,
    JsonObject,
}

// https://serde.rs/enum-representations.html
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum ChatCompletionMessage {
    /// A message from a system.
    System(SystemMessage),
    /// A message from a user
    User(UserMessage),
    /// A message from a assistant
    Assistant(AssistantMessage),
    /// A message from a tool
    Tool(ToolMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize, Copy, Default, PartialEq, Eq)]
pub enum ChatCompleteModel {
    #[default]
    #[serde(rename = "gpt-3.5-turbo-1106")]
    Gpt3Turbo,
    #[serde(rename = "gpt-3.5-turbo-instruct")]
    Gpt3TurboInstruct,
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-4-1106-preview")]
    Gpt4Turbo,
    #[serde(rename = "gpt-4-vision-preview")]
    Gpt4TurboVision,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemMessage {
    content: String,
    /// An optional name for the participant.
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserMessage {
    content: UserContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// Plain text, or a list of text and image parts for vision models.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Absent when the model only produced tool calls.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// The tool calls generated by the model, such as function calls.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub r#type: ToolType,
    /// The function that the model called.
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    #[default]
    Function,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON generated by the model. It is not guaranteed to be valid or to
    /// match the declared schema.
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolMessage {
    content: String,
    /// Tool call that this message is responding to.
    tool_call_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    /// Can be more than one if n is greater than 1.
    pub choices: Vec<ChatCompletionChoice>,
    /// Unix timestamp (in seconds).
    pub created: u64,
    pub model: String,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    /// Always `chat.completion`.
    pub object: String,
    pub usage: ChatCompleteUsage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompleteUsage {
    pub completion_tokens: usize,
    pub prompt_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChoice {
    /// gpt-4-vision-preview reports `finish_details` instead and leaves this out.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    pub index: usize,
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    /// Deprecated function calling.
    FunctionCall,
    /// Any reason this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// One `data:` event of a streamed chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub choices: Vec<ChunkChoice>,
    pub created: u64,
    pub model: String,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    /// Always `chat.completion.chunk`.
    pub object: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    pub index: usize,
    pub delta: ChatDelta,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

// https://platform.openai.com/docs/api-reference/chat/create
impl IntoRequest for ChatCompletionRequest {
    fn into_request(self, base_url: &str, client: Client) -> RequestBuilder {
        client
            .post(format!("{}{}", base_url, CHAT_COMPLETIONS_PATH))
            .json(&self)
    }
}

impl ChatCompletionRequest {
    pub(crate) fn set_stream(&mut self, stream: bool) {
        self.stream = stream.then_some(true);
    }

    pub fn messages(&self) -> &[ChatCompletionMessage] {
        &self.messages
    }

    pub fn model(&self) -> Option<ChatCompleteModel> {
        self.model
    }
}

impl ChatCompletionRequestBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        check_range("temperature", self.temperature, 0.0, 2.0)?;
        check_range("top_p", self.top_p, 0.0, 1.0)?;
        check_range("frequency_penalty", self.frequency_penalty, -2.0, 2.0)?;
        check_range("presence_penalty", self.presence_penalty, -2.0, 2.0)?;

        if let Some(stop) = &self.stop {
            if stop.len() > MAX_STOP_SEQUENCES {
                return Err(format!(
                    "at most {} stop sequences are allowed, got {}",
                    MAX_STOP_SEQUENCES,
                    stop.len()
                ));
            }
        }
        if let Some(Some(0)) = self.n {
            return Err("n must be at least 1".to_string());
        }
        Ok(())
    }
}

fn check_range(
    field: &str,
    value: Option<Option<f32>>,
    min: f32,
    max: f32,
) -> std::result::Result<(), String> {
    match value {
        Some(Some(v)) if !(min..=max).contains(&v) => Err(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, v
        )),
        _ => Ok(()),
    }
}

impl Serialize for ToolChoice {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct FunctionName<'a> {
            name: &'a str,
        }

        match self {
            ToolChoice::None => serializer.serialize_str("none"),
            ToolChoice::Auto => serializer.serialize_str("auto"),
            ToolChoice::Required => serializer.serialize_str("required"),
            ToolChoice::Function { name } => {
                let mut state = serializer.serialize_struct("ToolChoice", 2)?;
                state.serialize_field("type", &ToolType::Function)?;
                state.serialize_field("function", &FunctionName { name })?;
                state.end()
            }
        }
    }
}

impl Tool {
    pub fn new_function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        let description = description.into();
        Tool {
            r#type: ToolType::Function,
            function: FunctionInfo {
                description: (!description.is_empty()).then_some(description),
                name: name.into(),
                parameters,
            },
        }
    }
}

impl ChatResponseFormatObject {
    pub fn new(r#type: ChatResponseFormat) -> Self {
        Self { r#type }
    }
}

impl ChatCompletionMessage {
    pub fn new_system(content: impl Into<String>, name: &str) -> ChatCompletionMessage {
        ChatCompletionMessage::System(SystemMessage {
            content: content.into(),
            name: Self::get_name(name),
        })
    }

    pub fn new_user(content: impl Into<String>, name: &str) -> ChatCompletionMessage {
        ChatCompletionMessage::User(UserMessage {
            content: UserContent::Text(content.into()),
            name: Self::get_name(name),
        })
    }

    /// A user message carrying instructions plus one image, given as a public
    /// URL or a `data:` URL from [`encode_image`](super::vision::encode_image).
    pub fn new_user_with_image(
        text: impl Into<String>,
        image_url: impl Into<String>,
        name: &str,
    ) -> ChatCompletionMessage {
        Self::new_user_parts(
            vec![ContentPart::text(text), ContentPart::image_url(image_url)],
            name,
        )
    }

    pub fn new_user_parts(parts: Vec<ContentPart>, name: &str) -> ChatCompletionMessage {
        ChatCompletionMessage::User(UserMessage {
            content: UserContent::Parts(parts),
            name: Self::get_name(name),
        })
    }

    pub fn new_tool(
        content: impl Into<String>,
        tool_call_id: impl Into<String>,
    ) -> ChatCompletionMessage {
        ChatCompletionMessage::Tool(ToolMessage {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        })
    }

    fn get_name(name: &str) -> Option<String> {
        if name.is_empty() {
            None
        } else {
            Some(name.into())
        }
    }
}

impl From<AssistantMessage> for ChatCompletionMessage {
    fn from(message: AssistantMessage) -> Self {
        ChatCompletionMessage::Assistant(message)
    }
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the model produced any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}
