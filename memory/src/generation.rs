/// Errors surfaced by a text generation backend.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("generation backend failed: {0}")]
    Backend(String),
}

/// Decoding parameters passed to [`TextGenerator::generate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: usize,
    pub temperature: f32,
}

impl GenerationParams {
    /// `temperature <= 0` selects deterministic (greedy) decoding. Identical
    /// prompts must then produce identical output.
    pub fn is_greedy(&self) -> bool {
        self.temperature <= 0.0
    }
}

/// Backend that turns an assembled prompt into an answer.
pub trait TextGenerator: Send + Sync {
    fn model_name(&self) -> &str;

    fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, GenerationError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, GenerationError> {
        (**self).generate(prompt, params)
    }
}
