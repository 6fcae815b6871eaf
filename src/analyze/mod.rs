// src/analyze/mod.rs
//! Model-backed collaborators used per query: emotion labels and narrative summaries.

pub mod emotion;
pub mod summarizer;

pub use emotion::{EmotionClassifier, HuggingFaceEmotion, KeywordEmotion, NeutralEmotion};
pub use summarizer::{
    DisabledSummarizer, GeminiSummarizer, GenerativeSummarizer, StaticSummarizer,
};
