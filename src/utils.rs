use anyhow::{bail, Context, Result};
use futures::stream::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use llm_sdk::{
    encode_image, ChatCompleteModel, ChatCompletionMessage, ChatCompletionRequest,
    ChatCompletionRequestBuilder, CreateImageRequest, CreateImageRequestBuilder, ImageQuality,
    ImageSize, LlmSdk,
};
use std::io::{self, Write};

pub const CMD_VISION: &str = "v";
pub const CMD_GPT4: &str = "4";
pub const CMD_DALLE: &str = "d";

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_VISION_INSTRUCTIONS: &str = "What's in the image?";
pub const VISION_MAX_TOKENS: usize = 300;

pub enum Command {
    Chat(ChatCompletionRequest),
    Vision(ChatCompletionRequest),
    Dalle(CreateImageRequest),
}

impl Command {
    fn spinner_color(&self) -> &'static str {
        match self {
            Command::Chat(_) => "green",
            Command::Vision(_) => "magenta",
            Command::Dalle(_) => "red",
        }
    }
}

pub fn create_spinner(color: &str, message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template(&format!("{{spinner:.{}}} {{msg}}", color)),
    );
    spinner.enable_steady_tick(100);
    spinner.set_message(message);

    spinner
}

fn join_prompt(words: &[String]) -> Result<String> {
    let prompt = words.join(" ");
    if prompt.trim().is_empty() {
        bail!("Missing prompt. Run `gpt -h` for usage.");
    }
    Ok(prompt)
}

pub fn build_chat_request(prompt: &[String], model: ChatCompleteModel) -> Result<ChatCompletionRequest> {
    let request = ChatCompletionRequestBuilder::default()
        .model(model)
        .messages(vec![
            ChatCompletionMessage::new_system(SYSTEM_PROMPT, ""),
            ChatCompletionMessage::new_user(join_prompt(prompt)?, ""),
        ])
        .build()?;
    Ok(request)
}

pub async fn build_vision_request(args: &[String]) -> Result<ChatCompletionRequest> {
    let image_path = args
        .get(2)
        .context("Missing image path. Usage: gpt v <image_path> [description]")?;
    let instructions = if args.len() > 3 {
        args[3..].join(" ")
    } else {
        DEFAULT_VISION_INSTRUCTIONS.to_string()
    };
    let image_url = encode_image(image_path)
        .await
        .with_context(|| format!("Failed to open image file: {}", image_path))?;

    let request = ChatCompletionRequestBuilder::default()
        .model(ChatCompleteModel::Gpt4TurboVision)
        .messages(vec![ChatCompletionMessage::new_user_with_image(
            instructions,
            image_url,
            "",
        )])
        .max_tokens(VISION_MAX_TOKENS)
        .build()?;
    Ok(request)
}

pub fn build_dalle_request(args: &[String]) -> Result<CreateImageRequest> {
    let request = CreateImageRequestBuilder::default()
        .prompt(join_prompt(args.get(2..).unwrap_or_default())?)
        .n(1)
        .size(ImageSize::LargeWide)
        .quality(ImageQuality::Hd)
        .build()?;
    Ok(request)
}

pub async fn create_command(args: &[String]) -> Result<Command> {
    let rest = args.get(2..).unwrap_or_default();
    let command = match args.get(1).map(String::as_str) {
        Some(CMD_GPT4) => Command::Chat(build_chat_request(rest, ChatCompleteModel::Gpt4)?),
        Some(CMD_VISION) => Command::Vision(build_vision_request(args).await?),
        Some(CMD_DALLE) => Command::Dalle(build_dalle_request(args)?),
        _ => Command::Chat(build_chat_request(
            args.get(1..).unwrap_or_default(),
            ChatCompleteModel::Gpt3Turbo,
        )?),
    };
    Ok(command)
}

pub async fn run_command<W: Write>(sdk: &LlmSdk, command: Command, out: &mut W) -> Result<()> {
    let spinner = create_spinner(command.spinner_color(), "Processing request...".to_string());

    match command {
        Command::Chat(request) => {
            let mut stream = match sdk.chat_completion_stream(request).await {
                Ok(stream) => stream,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e.into());
                }
            };
            spinner.finish_and_clear();

            while let Some(chunk) = stream.next().await {
                for choice in chunk?.choices {
                    if let Some(content) = choice.delta.content {
                        write!(out, "{}", content)?;
                        out.flush()?;
                    }
                }
            }
            writeln!(out)?;
        }
        Command::Vision(request) => {
            let response = sdk.chat_completion(request).await;
            spinner.finish_and_clear();
            let response = response?;
            writeln!(
                out,
                "{}",
                response.first_content().unwrap_or("No content in response")
            )?;
        }
        Command::Dalle(request) => {
            let response = sdk.create_image(request).await;
            spinner.finish_and_clear();
            for image in response?.data.iter() {
                if let Some(url) = &image.url {
                    writeln!(out, "Generated image URL: {}", url)?;
                }
                if let Some(revised) = &image.revised_prompt {
                    log::info!("revised prompt: {}", revised);
                }
            }
        }
    }

    Ok(())
}

pub async fn process_command(sdk: &LlmSdk, args: &[String]) -> Result<()> {
    let command = create_command(args).await?;

    run_command(sdk, command, &mut io::stdout()).await
}
