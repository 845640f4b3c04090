//! Prompt composition: instruction text + page images → [`ModelRequest`].

use edgequake_llm::ImageData;

/// The payload for one model call: the instruction followed by every page
/// image, in page order. Immutable once built.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    instruction: String,
    pages: Vec<ImageData>,
}

impl ModelRequest {
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn pages(&self) -> &[ImageData] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Build the request payload. Page order is preserved as given.
pub fn compose_request(instruction: &str, pages: Vec<ImageData>) -> ModelRequest {
    ModelRequest {
        instruction: instruction.to_string(),
        pages,
    }
}
