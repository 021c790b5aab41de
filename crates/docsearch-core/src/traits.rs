use crate::error::EmbedError;

/// Capability that turns texts into fixed-dimension dense vectors.
///
/// Implementations must be deterministic in the association between input
/// position and output vector: `embed_batch(texts)[i]` embeds `texts[i]`.
pub trait Embedder: Send + Sync {
    /// Stable, human-readable identifier for the provider/model (e.g. `hashing:d256`).
    fn embedder_id(&self) -> &str;

    /// Identity used for index caching. Must change whenever the model,
    /// dimension or credential changes, and must not reveal the credential.
    fn fingerprint(&self) -> String { self.embedder_id().to_string() }

    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;

    /// Compute embeddings for a batch of input texts.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a single text (one provider call).
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_batch(&[text.to_string()])?;
        match vectors.len() {
            1 => Ok(vectors.remove(0)),
            got => Err(EmbedError::CountMismatch { expected: 1, got }),
        }
    }
}
