mod chat_completion;
mod create_image;
mod vision;

pub use chat_completion::*;
pub use create_image::*;
pub use vision::*;
