//! Prompt construction for the reasoning strategies

/// Opening lines that push each self-consistency sample down a different path
pub const SAMPLE_PREFIXES: [&str; 5] = [
    "Let's think step by step.",
    "Let's approach this from first principles.",
    "Let's break the problem into smaller parts and solve each one.",
    "Let's consider the problem from a different angle.",
    "Let's work through this carefully and double-check each step.",
];

const HIDDEN_REASONING: &str = "Think through the problem step by step before answering, \
but do not show your reasoning. Reply with the final answer only, stated clearly and concisely.";

const VISIBLE_REASONING: &str = "Work through the problem step by step and show each step \
of your reasoning. Finish with the final answer on its own line, prefixed with \"Answer:\".";

fn with_reference(message: &str, rag_context: Option<&str>) -> String {
    match rag_context.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reference) => format!(
            "Use the following reference information where it is relevant.\n\n\
             Reference information:\n{}\n\nQuestion: {}",
            reference, message
        ),
        None => format!("Question: {}", message),
    }
}

/// Chain-of-thought prompt
///
/// Production mode asks for hidden reasoning; verbose mode asks for the
/// steps to be written out.
pub fn chain_of_thought(message: &str, rag_context: Option<&str>, verbose: bool) -> String {
    let instruction = if verbose {
        VISIBLE_REASONING
    } else {
        HIDDEN_REASONING
    };
    format!("{}\n\n{}", with_reference(message, rag_context), instruction)
}

/// Prompt shared by every self-consistency sample
pub fn self_consistency_base(message: &str, rag_context: Option<&str>) -> String {
    format!(
        "{}\n\nReason through the problem independently and give a complete final answer.",
        with_reference(message, rag_context)
    )
}

/// Phrasing prefix for sample `index`, distinct for every index
pub fn sample_prefix(index: usize) -> String {
    let prefix = SAMPLE_PREFIXES[index % SAMPLE_PREFIXES.len()];
    let round = index / SAMPLE_PREFIXES.len();
    if round == 0 {
        prefix.to_string()
    } else {
        format!("{} (Attempt {}.)", prefix, round + 1)
    }
}

/// Base prompt prefixed for sample `index`
pub fn sample(base: &str, index: usize) -> String {
    format!("{}\n\n{}", sample_prefix(index), base)
}
