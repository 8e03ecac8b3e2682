//! Prompt templates for journal reflections.
//!
//! Prompts use Gemma-style turn markers and are handed to llama-server's
//! raw `/completions` endpoint, so the template is rendered here rather
//! than by the server.

/// More newlines than this means the text holds several entries.
pub const MULTI_ENTRY_NEWLINE_THRESHOLD: usize = 3;

/// Which instruction template wraps the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// Reflection on one journal entry.
    SingleEntry,
    /// Digest across several journal entries.
    MultiEntryDigest,
}

impl PromptVariant {
    /// Pick a variant from the shape of `raw_text`.
    pub fn classify(raw_text: &str) -> Self {
        let newlines = raw_text.bytes().filter(|&b| b == b'\n').count();
        if newlines > MULTI_ENTRY_NEWLINE_THRESHOLD {
            PromptVariant::MultiEntryDigest
        } else {
            PromptVariant::SingleEntry
        }
    }

    /// Wrap `text` in this variant's template. `text` is embedded verbatim.
    pub fn render(self, text: &str) -> String {
        match self {
            PromptVariant::SingleEntry => format!(
                "<start_of_turn>user\n{preamble}\n\n\
                 Here is the journal entry to reflect on:\n{text}\n\
                 <end_of_turn>\n<start_of_turn>assistant\n",
                preamble = SINGLE_ENTRY_PREAMBLE,
            ),
            PromptVariant::MultiEntryDigest => format!(
                "<start_of_turn>user\n{preamble}\n\n\
                 Here are the journal entries to analyze:\n{text}\n\
                 <end_of_turn>\n<start_of_turn>assistant\n",
                preamble = DIGEST_PREAMBLE,
            ),
        }
    }
}

/// Instructions for reflecting on a single entry.
pub const SINGLE_ENTRY_PREAMBLE: &str = "You are a thoughtful and supportive assistant designed to help me gain deeper insights from my individual journal entries. I will provide a single personal reflection, and your task is to help me explore and understand it more deeply.

Your response should:
- Help me identify the underlying emotions and thoughts in this entry
- Point out any patterns or themes that emerge from this reflection
- Offer gentle, constructive perspectives that might help me see things differently
- Suggest questions I could ask myself to explore this topic further
- Highlight any signs of self-awareness or growth in this entry

Refer to the input as \"your journal entry\" rather than \"the text.\"
You are not in a conversation, so DO NOT ask follow-up questions or request additional information. Respond in a calm, polite, and respectful tone. Use plain text only — no markdown formatting.";

/// Instructions for digesting several entries.
pub const DIGEST_PREAMBLE: &str = "You are a thoughtful and supportive assistant designed to bring clarity and insight to my journal entries. I will provide a series of personal reflections, and your task is to synthesize them into a single, meaningful response.

Your response should:
- Highlight recurring themes or emotional patterns in my journal entries
- Offer constructive, empathetic advice where appropriate
- Point out signs of personal growth or reflection
- Suggest thoughtful next steps or perspectives to consider

Refer to the input as \"your journal entries\" rather than \"the text.\"
You are not in a conversation, so DO NOT ask follow-up questions or request additional information. Respond in a calm, polite, and respectful tone. Use plain text only — no markdown formatting.";

/// Build the model prompt for free-form input.
pub fn compose(raw_text: &str) -> String {
    PromptVariant::classify(raw_text).render(raw_text)
}

/// Build a digest prompt from separate notes.
///
/// Each note is followed by a newline, in the order given. The digest
/// template is used regardless of how many notes there are.
pub fn compose_from_notes<S: AsRef<str>>(notes: &[S]) -> String {
    PromptVariant::MultiEntryDigest.render(&join_notes(notes))
}

fn join_notes<S: AsRef<str>>(notes: &[S]) -> String {
    let mut joined = String::with_capacity(notes.iter().map(|n| n.as_ref().len() + 1).sum());
    for note in notes {
        joined.push_str(note.as_ref());
        joined.push('\n');
    }
    joined
}
