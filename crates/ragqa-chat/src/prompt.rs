//! Prompt construction for context-grounded answers.

use crate::types::ChatMessage;

const SYSTEM_PROMPT: &str = "You answer questions about the user's documents. \
Answer the question using ONLY the context below. \
If the context does not contain the answer, say that you don't know.";

/// Build the message list for a question and its retrieved context.
pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Context:\n{}\n\nQuestion: {}\nAnswer:",
            context, question
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context_and_question() {
        let messages = build_messages("Who wrote it?", "first\nsecond");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("ONLY the context"));
        assert_eq!(messages[1].role, "user");
        assert_eq!(
            messages[1].content,
            "Context:\nfirst\nsecond\n\nQuestion: Who wrote it?\nAnswer:"
        );
    }
}
