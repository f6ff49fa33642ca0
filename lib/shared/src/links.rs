use serde::{Deserialize, Serialize};

pub const LINKS_HEADING: &str = "## Links";

/// Search URLs appended after the completion answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSet {
    pub video_search: String,
    pub image_search: String,
    pub encyclopedia_search: String,
}

impl LinkSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [
            self.video_search.as_str(),
            self.image_search.as_str(),
            self.encyclopedia_search.as_str(),
        ]
        .into_iter()
    }

    /// Markdown section with one URL per line.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("\n{LINKS_HEADING}\n");
        for url in self.iter() {
            out.push_str(url);
            out.push('\n');
        }
        out
    }
}
