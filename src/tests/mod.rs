//! # Workflow Test Suite for Hydro Tracker
//!
//! End-to-end checks of the batch and export workflows against a
//! deterministic text generator, so no test touches the network.

use hydro_lib::reminder::{GenerationError, TextGenerator};
use std::cell::RefCell;


/// Text generator with a fixed reply that records every prompt it receives.
pub struct StubGenerator {
    reply: Result<String, String>,
    pub prompts: RefCell<Vec<String>>,
}

impl StubGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Fail every call with an API error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.reply.clone().map_err(|message| GenerationError::Api {
            status: 429,
            message,
        })
    }
}
