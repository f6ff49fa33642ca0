pub mod links;
pub mod progress;
pub mod prompt;
pub mod track;
