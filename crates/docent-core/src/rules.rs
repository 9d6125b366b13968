//! Canned dialogue used when no document has been uploaded.
//! Rules are checked in order; the first whose keyword appears in the question wins.
//! Keywords match whole words (or consecutive whole words for phrases) of the
//! lower-cased question, never parts of words: "this" does not match "hi".

pub const GREETING_REPLY: &str = "Hello! How can I help you today?";
pub const IDENTITY_REPLY: &str = "I'm your document assistant. Upload a PDF and ask me about it.";
pub const WELL_BEING_REPLY: &str = "I'm good, and how are you?";
pub const FAREWELL_REPLY: &str = "Bye! Come back soon!";
pub const NOT_UNDERSTOOD_REPLY: &str = "Sorry, I didn't understand that.";

struct Rule {
    /// Word sequences; any one matching selects the rule.
    keywords: &'static [&'static str],
    reply: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["hi", "hello"],
        reply: GREETING_REPLY,
    },
    Rule {
        keywords: &["your name"],
        reply: IDENTITY_REPLY,
    },
    Rule {
        keywords: &["how are you"],
        reply: WELL_BEING_REPLY,
    },
    Rule {
        keywords: &["bye", "goodbye"],
        reply: FAREWELL_REPLY,
    },
];

/// Reply for `question` from the fixed rule table.
pub fn reply(question: &str) -> &'static str {
    let lowered = question.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| contains_phrase(&words, k)))
        .map_or(NOT_UNDERSTOOD_REPLY, |rule| rule.reply)
}

/// True if the words of `phrase` appear consecutively in `words`.
fn contains_phrase(words: &[&str], phrase: &str) -> bool {
    let phrase: Vec<&str> = phrase.split_whitespace().collect();
    !phrase.is_empty() && words.windows(phrase.len()).any(|w| w == phrase.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting() {
        assert_eq!(reply("hello"), GREETING_REPLY);
        assert_eq!(reply("Hi there!"), GREETING_REPLY);
    }

    #[test]
    fn each_rule() {
        assert_eq!(reply("What is your name?"), IDENTITY_REPLY);
        assert_eq!(reply("How are you today"), WELL_BEING_REPLY);
        assert_eq!(reply("ok, bye"), FAREWELL_REPLY);
        assert_eq!(reply("Goodbye."), FAREWELL_REPLY);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(reply("Hello, how are you?"), GREETING_REPLY);
        assert_eq!(reply("bye, what's your name"), IDENTITY_REPLY);
    }

    #[test]
    fn keywords_match_whole_words() {
        assert_eq!(reply("this is nothing"), NOT_UNDERSTOOD_REPLY);
        assert_eq!(reply("a byelaw"), NOT_UNDERSTOOD_REPLY);
    }

    #[test]
    fn greeting_inside_a_word_is_ignored() {
        assert_eq!(reply("how are you this morning"), WELL_BEING_REPLY);
    }

    #[test]
    fn fallback_reply() {
        assert_eq!(reply(""), NOT_UNDERSTOOD_REPLY);
        assert_eq!(reply("summarize the quarterly report"), NOT_UNDERSTOOD_REPLY);
    }
}
