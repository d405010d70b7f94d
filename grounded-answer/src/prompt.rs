//! Prompt texts for every pipeline stage.
//!
//! Each stage owns one system prompt, one user-prompt builder and one JSON
//! schema. Keep the schemas in sync with the structs that decode them.

use crate::model::UNKNOWN_ANSWER;

const ANSWER_SCHEMA: &str = r#"{
  "text": "...",
  "citations_used": ["C1","C2",...],
  "citations": [
    {
      "id": "C1",
      "data_source": "...",
      "quote": "..."
    }
  ]
}"#;

const VALIDATION_SCHEMA: &str = r#"{
  "ok": boolean,
  "unsupported_claims": string[],
  "notes": string
}"#;

const ANALYSIS_SCHEMA: &str = r#"{
  "need_clarification": boolean,
  "clarifying_question": string | null,
  "missing_slots": string[],
  "assumptions": string[]
}"#;

const REWRITE_SCHEMA: &str = r#"{
  "queries": string[]
}"#;

pub fn answer_system() -> String {
    format!(
        r#"You are a RAG assistant. Answer ONLY from the provided fragments.
Do not add outside knowledge. Do not guess.

The response must be ONLY valid JSON (no comments, no explanations, no markdown),
strictly following the schema:
{ANSWER_SCHEMA}

If the fragments do not contain the answer, return JSON with the same schema where:
- "text": "{UNKNOWN_ANSWER}"
- "citations_used": []
- "citations": []

Answer requirements:
1) Give a short, structured answer.
2) Mark every key claim with a reference label such as [C1], [C2]...
3) For every label you use, add a citation with its data_source and a short quote from the fragment."#
    )
}

pub fn answer_rewrite_system() -> String {
    format!(
        r#"You are an answer correction module. Fix the answer according to the validator's remarks.
Do not add outside knowledge. Do not guess.

The response must be ONLY valid JSON (no comments, no explanations, no markdown),
strictly following the schema:
{ANSWER_SCHEMA}

If the fragments still do not support the answer after the fixes, return JSON with the same schema where:
- "text": "{UNKNOWN_ANSWER}"
- "citations_used": []
- "citations": []"#
    )
}

pub fn validation_system() -> String {
    format!(
        r#"You are a validator. Check that the claims in the answer are supported by the cited sources.
Ignore generalized or unspecific statements and do not validate them.
Validate only claims with clear specifics that refer to a concrete object of the data.
If any such claim has no support, return ok=false.
The response must be ONLY valid JSON without comments, explanations or markdown.
Strictly follow the schema:
{VALIDATION_SCHEMA}"#
    )
}

pub fn analysis_system() -> String {
    format!(
        r#"You are a query analysis module for RAG. Your task is to decide whether clarification is needed.
Do not answer the user's question. Do not invent facts.
The response must be ONLY valid JSON without comments, explanations or markdown.
Strictly follow the schema:
{ANALYSIS_SCHEMA}"#
    )
}

pub fn rewrite_system() -> String {
    format!(
        r#"You are a query rewriting module for search (RAG retrieval).
Do not answer the user's question. Do not add facts.
Generate several search queries that keep the original meaning.
The response must be ONLY valid JSON without comments, explanations or markdown.
Strictly follow the schema:
{REWRITE_SCHEMA}"#
    )
}

pub fn answer_user(question: &str, dialog_context: &str, chunks: &str) -> String {
    format!(
        r#"Question: {question}
Dialog context: {dialog_context}

Fragments (each with id and metadata):
{chunks}

Return the answer in this format (strictly, JSON only, no surrounding text):
{ANSWER_SCHEMA}
If you cannot cite at least one fragment that explicitly supports the answer,
return JSON with the same schema where:
- "text": "{UNKNOWN_ANSWER}"
- "citations_used": []
- "citations": []"#
    )
}

pub fn answer_rewrite_user(
    question: &str,
    dialog_context: &str,
    chunks: &str,
    answer_text: &str,
    feedback: &str,
) -> String {
    format!(
        r#"Question: {question}
Dialog context: {dialog_context}

Previous answer:
{answer_text}

Validator remarks:
{feedback}

Fragments (each with id and metadata):
{chunks}

Return the answer in this format (strictly, JSON only, no surrounding text):
{ANSWER_SCHEMA}

If you cannot cite at least one fragment that explicitly supports the answer,
return JSON with the same schema where:
- "text": "{UNKNOWN_ANSWER}"
- "citations_used": []
- "citations": []"#
    )
}

pub fn validation_user(question: &str, answer_text: &str, chunks: &str) -> String {
    format!(
        r#"Question: {question}

Answer:
{answer_text}

Sources with text:
{chunks}

JSON (strictly, JSON only, no surrounding text):
{VALIDATION_SCHEMA}"#
    )
}

pub fn analysis_user(question: &str, dialog_context: &str) -> String {
    format!(
        r#"User question: {question}

Dialog context (may be empty):
{dialog_context}

Rules:
- need_clarification=true if answering without clarification carries a high risk of a wrong answer
  (ambiguity, missing object/product/version/region/period).
- If it is safe to search without clarification, need_clarification=false.

JSON schema (strictly, JSON only, no surrounding text):
{ANALYSIS_SCHEMA}

Slots (examples): ["product", "product_version", "region", "time_period", "user_role", "entity"]"#
    )
}

pub fn rewrite_user(question: &str, dialog_context: &str, analysis_json: &str) -> String {
    format!(
        r#"User question: {question}

Dialog context (may be empty):
{dialog_context}

Query analysis (JSON):
{analysis_json}

JSON schema (strictly, JSON only, no surrounding text):
{REWRITE_SCHEMA}"#
    )
}
