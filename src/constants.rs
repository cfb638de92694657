pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
pub const IMAGE_GENERATIONS_PATH: &str = "/images/generations";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_ORGANIZATION: &str = "OPENAI_ORG_ID";
pub const ENV_TIMEOUT_SECS: &str = "LLM_SDK_TIMEOUT_SECS";

pub const ORGANIZATION_HEADER: &str = "OpenAI-Organization";
