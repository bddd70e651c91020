use localrag_memory::store::SearchHit;

const PREAMBLE: &str = "You are a helpful assistant. Answer the question using ONLY the context.\n\
If the answer is not in the context, say you don't know.\n\n";

pub(crate) const CONTEXT_HEADER: &str = "Context:\n";
pub(crate) const SOURCE_PREFIX: &str = "[Source: ";
pub(crate) const QUESTION_PREFIX: &str = "Question: ";
pub(crate) const ANSWER_MARKER: &str = "Answer:";

/// Assemble the grounded prompt handed to the generator.
///
/// The layout is part of the contract with generation backends and must stay
/// byte-for-byte stable: preamble, `Context:` followed by one
/// `[Source: ..]` block per hit in rank order, then the question and a
/// trailing `Answer:` with no newline.
pub fn build_rag_prompt(question: &str, hits: &[SearchHit]) -> String {
    let mut prompt = String::new();
    prompt.push_str(PREAMBLE);
    prompt.push_str(CONTEXT_HEADER);
    for h in hits {
        prompt.push_str(SOURCE_PREFIX);
        prompt.push_str(&h.source);
        prompt.push_str("]\n");
        prompt.push_str(&h.text);
        prompt.push_str("\n\n");
    }
    prompt.push_str(QUESTION_PREFIX);
    prompt.push_str(question);
    prompt.push('\n');
    prompt.push_str(ANSWER_MARKER);
    prompt
}
