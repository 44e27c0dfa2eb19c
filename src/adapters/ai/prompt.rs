//! Prompt rendering for the value scorer.
//!
//! The rubric is operator configuration; this module only owns the slot it fills
//! and the fixed system message that pins down the response shape.

use crate::domain::Conversation;

/// Placeholder in the rubric replaced by the rendered transcript.
pub const MESSAGES_SLOT: &str = "{messages}";

/// Appended when a transcript is cut at the character budget.
pub const TRUNCATION_MARKER: &str = "\n[… transcript truncated …]";

/// System message. Fixes the output contract independently of the rubric.
pub const SYSTEM_PROMPT: &str = r#"You rate saved chat conversations by how useful they will be to re-read later.

You MUST respond with valid JSON only, no markdown and no text outside the object:
{"score": <integer from 0 to 10>, "reasoning": "<one or two sentences>"}"#;

/// Built-in rubric used when no prompt file is configured.
pub const DEFAULT_RUBRIC: &str = r#"Score the conversation below from 0 to 10 for its future reference value.

High scores (8-10): durable knowledge worth keeping. Worked solutions, design decisions with
their trade-offs, reusable code or procedures, research summaries, personal plans that will be
revisited.
Middle scores (4-7): useful context but partly situational, or good content buried in noise.
Low scores (0-3): small talk, one-off lookups, abandoned or failed attempts, content that is
trivially found elsewhere.

Judge the substance, not the length. Explain the score briefly in `reasoning`.

Conversation:
{messages}"#;

/// Renders all messages as `[sender @ timestamp]` blocks, including extracted
/// attachment content. Output is capped at `max_chars` characters.
pub fn render_transcript(conversation: &Conversation, max_chars: usize) -> String {
    let mut out = String::new();
    for msg in &conversation.messages {
        out.push_str(&format!(
            "[{} @ {}]\n{}\n",
            msg.sender,
            msg.created_at.format("%Y-%m-%d %H:%M"),
            msg.text.trim()
        ));
        for att in &msg.attachments {
            if att.extracted_content.trim().is_empty() {
                continue;
            }
            out.push_str(&format!(
                "<attachment name=\"{}\">\n{}\n</attachment>\n",
                att.file_name,
                att.extracted_content.trim()
            ));
        }
        out.push('\n');
    }
    truncate_chars(out, max_chars)
}

/// Fills the rubric's `{messages}` slot with the rendered transcript.
pub fn user_prompt(template: &str, conversation: &Conversation, max_chars: usize) -> String {
    template.replace(MESSAGES_SLOT, &render_transcript(conversation, max_chars))
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((cut, _)) = text.char_indices().nth(max_chars) {
        text.truncate(cut);
        text.push_str(TRUNCATION_MARKER);
    }
    text
}
