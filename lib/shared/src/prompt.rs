use serde::{Deserialize, Serialize};

/// One query sent to the completion API. `title` is a markdown heading and
/// becomes the section header of the answer in the final document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub title: String,
    pub prompt: String,
}

impl PromptSpec {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt: prompt.into(),
        }
    }
}
