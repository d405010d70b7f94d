//! Prompt stages. Each owns one system prompt, one user prompt and one JSON schema.

pub mod answer;
pub mod clarify;
pub mod correct;
pub mod validate;
