use std::collections::HashSet;

use localrag_memory::generation::GenerationError;
use localrag_memory::generation::GenerationParams;
use localrag_memory::generation::TextGenerator;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::memory::hashing_embeddings::tokenize;
use crate::memory::prompt::ANSWER_MARKER;
use crate::memory::prompt::CONTEXT_HEADER;
use crate::memory::prompt::QUESTION_PREFIX;
use crate::memory::prompt::SOURCE_PREFIX;

pub const UNKNOWN_ANSWER: &str = "I don't know.";

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how", "i",
    "in", "is", "it", "of", "on", "or", "that", "the", "this", "to", "was", "what", "when", "where",
    "which", "who", "why", "with", "you",
];

/// A local generator that answers by quoting the context.
///
/// It reads the prompt layout produced by
/// [`build_rag_prompt`](crate::memory::prompt::build_rag_prompt), splits the
/// context into sentences and keeps those sharing the most content words with
/// the question, within `max_tokens` words. Greedy mode ranks by overlap with
/// ties in context order; sampling mode draws sentences without replacement
/// with weight `exp(overlap / temperature)`.
#[derive(Debug, Clone, Default)]
pub struct ExtractiveGenerator {
    seed: Option<u64>,
}

impl ExtractiveGenerator {
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Fix the sampling seed so stochastic runs are repeatable.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    text: String,
    overlap: usize,
}

fn content_terms(text: &str) -> HashSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Split the prompt into (context body, question). A prompt that does not
/// follow the layout is treated as all context with an empty question.
fn split_prompt(prompt: &str) -> (&str, &str) {
    let body = match prompt.find(CONTEXT_HEADER) {
        Some(i) => &prompt[i + CONTEXT_HEADER.len()..],
        None => prompt,
    };
    let Some(q_at) = body.rfind(&format!("\n{QUESTION_PREFIX}")) else {
        return (body, "");
    };
    let context = &body[..q_at];
    let rest = &body[q_at + 1 + QUESTION_PREFIX.len()..];
    let question = match rest.rfind(ANSWER_MARKER) {
        Some(i) => &rest[..i],
        None => rest,
    };
    (context, question.trim())
}

fn sentences(context: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in context.lines() {
        if line.starts_with(SOURCE_PREFIX) {
            continue;
        }
        let mut current = String::new();
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            current.push(c);
            let at_boundary = matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|n| n.is_whitespace());
            if at_boundary {
                let s = current.trim();
                if !s.is_empty() {
                    out.push(s.to_string());
                }
                current.clear();
            }
        }
        let s = current.trim();
        if !s.is_empty() {
            out.push(s.to_string());
        }
    }
    out
}

fn candidates(context: &str, question: &str) -> Vec<Candidate> {
    let q_terms = content_terms(question);
    if q_terms.is_empty() {
        return Vec::new();
    }
    // Overlapping chunks repeat text; keep the first occurrence only.
    let mut seen = HashSet::new();
    sentences(context)
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .filter_map(|s| {
            let overlap = content_terms(&s).intersection(&q_terms).count();
            (overlap > 0).then_some(Candidate { text: s, overlap })
        })
        .collect()
}

fn take_words(picked: impl IntoIterator<Item = String>, max_words: usize) -> String {
    let mut words: Vec<String> = Vec::new();
    for sentence in picked {
        for w in sentence.split_whitespace() {
            if words.len() == max_words {
                return words.join(" ");
            }
            words.push(w.to_string());
        }
    }
    words.join(" ")
}

fn sample_order(mut pool: Vec<Candidate>, temperature: f32, rng: &mut StdRng) -> Vec<String> {
    let mut out = Vec::with_capacity(pool.len());
    let t = temperature as f64;
    while !pool.is_empty() {
        let max = pool.iter().map(|c| c.overlap).max().unwrap_or(0) as f64;
        let weights: Vec<f64> = pool.iter().map(|c| ((c.overlap as f64 - max) / t).exp()).collect();
        let total: f64 = weights.iter().sum();
        let mut target = rng.random::<f64>() * total;
        let mut chosen = pool.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        out.push(pool.remove(chosen).text);
    }
    out
}

impl TextGenerator for ExtractiveGenerator {
    fn model_name(&self) -> &str {
        "extractive"
    }

    fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String, GenerationError> {
        if params.max_tokens == 0 {
            return Ok(String::new());
        }
        let (context, question) = split_prompt(prompt);
        let mut pool = candidates(context, question);
        if pool.is_empty() {
            return Ok(UNKNOWN_ANSWER.to_string());
        }

        let ordered = if params.is_greedy() {
            pool.sort_by(|a, b| b.overlap.cmp(&a.overlap));
            pool.into_iter().map(|c| c.text).collect()
        } else {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            sample_order(pool, params.temperature, &mut rng)
        };
        Ok(take_words(ordered, params.max_tokens))
    }
}
