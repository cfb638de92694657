use colored::Colorize;

pub fn print_help() {
    println!("{:━^60}", " GPT ".yellow());
    println!("Usage:");
    println!("  {} [option] <argument>", "gpt".bold().green());
    println!("\nOptions:");
    println!("  {}   GPT-3.5-Turbo, streamed (default for text prompts).", " ");
    println!("  {}   GPT-4 model for text prompts, streamed.", "4".bold().cyan());
    println!(
        "  {}   GPT-4 Vision model for image analysis.",
        "v".bold().magenta()
    );
    println!(
        "  {}   DALL-E 3 model for image generation.",
        "d".bold().red()
    );
    println!(
        "  {}     Display this help message.",
        "-h, -help".bold().blue()
    );
    println!("\nArguments:");
    println!(
        "  {}  A text prompt for GPT-3.5-Turbo.",
        "<prompt>".bold().green()
    );
    println!("  {}  A text prompt for GPT-4.", "4 <prompt>".bold().cyan());
    println!(
        "  {}  A path to an image file and optional description for GPT-4 Vision.",
        "v <image_path> [description]".bold().magenta()
    );
    println!("                                 Accepts .png, .gif, .webp and .jpg/.jpeg files.");
    println!(
        "  {}  A text prompt for DALL-E 3.",
        "d <prompt>".bold().red()
    );
    println!("\nEnvironment (also read from .env):");
    println!("  {}        Required API key.", "OPENAI_API_KEY".bold());
    println!("  {}       Override the API base URL.", "OPENAI_BASE_URL".bold());
    println!("  {}         Organization header.", "OPENAI_ORG_ID".bold());
    println!("  {}  Request timeout in seconds.", "LLM_SDK_TIMEOUT_SECS".bold());
    println!("  {}              Log filter, e.g. llm_sdk=debug.", "RUST_LOG".bold());
    println!("\nExamples:");
    println!(
        "  {} What is the capital of California?",
        "gpt".bold().green()
    );
    println!("  {} What is the meaning of life?", "gpt 4".bold().cyan());
    println!(
        "  {} caterpillar.png What colors are in this image?",
        "gpt v".bold().magenta()
    );
    println!(
        "  {} A caterpillar smoking a hookah on a mushroom",
        "gpt d".bold().red()
    );
    println!("{:━^60}", "".yellow());
}
