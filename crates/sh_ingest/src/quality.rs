/// Phrases that mark a refusal, an apology or text about the page rather
/// than the story. Matched case-insensitively.
pub const REJECTION_PHRASES: &[&str] = &[
    "I'm sorry",
    "I am sorry",
    "I apologize",
    "I cannot summarize",
    "I can't summarize",
    "I cannot access",
    "I can't access",
    "I'm unable to",
    "I am unable to",
    "As an AI",
    "as a language model",
    "Consent Form",
    "cookie policy",
    "enable JavaScript",
];

/// The first rejection phrase found in `content`.
pub fn rejection_phrase(content: &str) -> Option<&'static str> {
    let normalized = content.replace('\u{2019}', "'").to_lowercase();
    REJECTION_PHRASES
        .iter()
        .copied()
        .find(|phrase| normalized.contains(&phrase.to_lowercase()))
}
