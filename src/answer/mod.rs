//! Question answering backends
//!
//! A question captured by the session goes to a hosted model and the reply
//! comes back as plain text for the session to announce. Backends never
//! speak on their own.

mod gemini;
mod openai;

pub use gemini::Gemini;
pub use openai::OpenAi;

use crate::config::{AnswerModel, Config};
use crate::Result;

/// Turns a spoken question into a reply to be spoken back
pub trait AnswerBackend: Send {
    fn answer(&self, question: &str) -> Result<String>;
}

/// Build the backend selected by `ai_model` in the configuration.
pub fn create_backend(config: &Config) -> Result<Box<dyn AnswerBackend>> {
    let token = config.options.ai_model_token.clone();
    match config.ai_model {
        AnswerModel::OpenAi => Ok(Box::new(OpenAi::new(token)?)),
        AnswerModel::Gemini => Ok(Box::new(Gemini::new(token)?)),
    }
}
