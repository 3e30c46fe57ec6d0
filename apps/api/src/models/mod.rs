pub mod content;

pub use content::{BlockType, ContentBlock, SubTopic, Topic};
