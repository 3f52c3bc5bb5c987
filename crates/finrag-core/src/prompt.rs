use std::fmt::Write as _;

use finrag_llm::Message;

use crate::types::RetrievedChunk;

const ASSISTANT_INSTRUCTIONS: &str = "\
You are a knowledgeable personal finance assistant.
Use the provided context from the user's financial documents to answer their questions.

Guidelines:
- Provide specific, actionable financial advice
- Reference the user's actual financial data when available
- Explain financial concepts clearly
- Suggest practical next steps
- If you need more information, ask specific questions
- Always prioritize the user's financial wellbeing and security

Context Information:
";

/// Returned to the user when embedding or completion fails.
pub const FALLBACK_ANSWER: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again.";

/// Render retrieved chunks as `Source: <filename>\n<text>` blocks separated by blank lines.
#[must_use]
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(out, "Source: {}\n{}", chunk.metadata.filename, chunk.text);
    }
    out
}

#[must_use]
pub fn build_system_prompt(chunks: &[RetrievedChunk]) -> String {
    let mut prompt = String::from(ASSISTANT_INSTRUCTIONS);
    prompt.push_str(&format_context(chunks));
    prompt
}

/// `[system, user]` pair sent for one question.
#[must_use]
pub fn build_messages(query: &str, chunks: &[RetrievedChunk]) -> Vec<Message> {
    vec![
        Message::system(build_system_prompt(chunks)),
        Message::user(query),
    ]
}
