// src/llm/embeddings.rs
// Embedding text preparation and vector math helpers.

use tracing::warn;

use crate::config::CONFIG;

/// Clamp text to the embedding model's character ceiling, keeping the prefix.
///
/// This is a lossy, one-directional transform: the subject line and opening of
/// a body carry most of the signal, so the remainder is discarded rather than
/// chunked. Logged as a warning, never an error.
pub fn truncate_for_embedding(text: &str) -> &str {
    let max_chars = CONFIG.embedding_max_chars;
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            warn!(
                "Text truncated to {} characters for embedding ({} supplied)",
                max_chars,
                text.chars().count()
            );
            &text[..byte_idx]
        }
        None => text,
    }
}

/// Calculate cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance (ascending distance = descending similarity).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![0.5, 0.5, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_distance_ordering() {
        let query = vec![1.0, 0.0];
        let near = vec![0.9, 0.1];
        let far = vec![0.1, 0.9];
        assert!(cosine_distance(&query, &near) < cosine_distance(&query, &far));
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        let text = "a short note";
        assert_eq!(truncate_for_embedding(text), text);
    }
}
