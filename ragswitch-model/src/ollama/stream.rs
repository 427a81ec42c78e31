//! Folding Ollama's newline-delimited JSON stream into one answer.
//!
//! Each line is a fragment such as
//! `{"message":{"role":"assistant","content":"Hel"},"done":false}`; the last
//! one carries `"done":true`. A server-side failure arrives as
//! `{"error":"..."}`.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ModelError, Result};

const PROVIDER: &str = "Ollama";

#[derive(Debug, Deserialize)]
struct Fragment {
    #[serde(default)]
    message: Option<FragmentMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FragmentMessage {
    #[serde(default)]
    content: String,
}

/// Accumulated state of the fold.
#[derive(Debug, Default)]
struct Accumulator {
    answer: String,
    fragments: usize,
    done: bool,
}

impl Accumulator {
    /// Apply one line. Blank lines are skipped.
    fn apply_line(&mut self, line: &[u8]) -> Result<()> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(());
        }

        let fragment: Fragment = serde_json::from_slice(line).map_err(|e| {
            ModelError::provider(PROVIDER, format!("malformed stream fragment: {e}"))
        })?;

        if let Some(message) = fragment.error {
            return Err(ModelError::provider(PROVIDER, message));
        }
        if let Some(message) = fragment.message {
            self.answer.push_str(&message.content);
        }
        self.fragments += 1;
        self.done = fragment.done;
        Ok(())
    }
}

/// Consume a byte stream of NDJSON fragments until one reports `done`.
///
/// Network chunk boundaries need not align with line boundaries. Anything
/// after the terminal fragment is ignored.
///
/// # Errors
///
/// Returns [`ModelError::Provider`] on a transport error, a malformed
/// fragment, an `error` fragment, or a stream that ends before `done`.
pub async fn accumulate_stream<S, B, E>(stream: S) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut pending: Vec<u8> = Vec::new();
    let mut acc = Accumulator::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| ModelError::provider(PROVIDER, format!("stream read failed: {e}")))?;
        pending.extend_from_slice(chunk.as_ref());

        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            acc.apply_line(&line)?;
            if acc.done {
                debug!(provider = PROVIDER, fragments = acc.fragments, "stream completed");
                return Ok(acc.answer);
            }
        }
    }

    // The final fragment may arrive without a trailing newline.
    acc.apply_line(&pending)?;
    if acc.done {
        return Ok(acc.answer);
    }

    warn!(provider = PROVIDER, fragments = acc.fragments, "stream ended without completion");
    Err(ModelError::provider(
        PROVIDER,
        format!("stream ended before completion after {} fragments", acc.fragments),
    ))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::stream;
    use proptest::prelude::*;

    use super::*;

    const TRANSCRIPT: &str = concat!(
        r#"{"model":"llama3","message":{"role":"assistant","content":"Ollama "},"done":false}"#,
        "\n",
        r#"{"model":"llama3","message":{"role":"assistant","content":"runs "},"done":false}"#,
        "\n\n",
        r#"{"message":{"role":"assistant","content":"models locally."},"done":false}"#,
        "\n",
        r#"{"message":{"role":"assistant","content":""},"done":true,"eval_count":7}"#,
        "\n",
    );

    fn chunks(
        parts: Vec<&'static str>,
    ) -> impl Stream<Item = std::result::Result<&'static [u8], Infallible>> {
        stream::iter(parts.into_iter().map(|p| Ok(p.as_bytes())))
    }

    #[tokio::test]
    async fn concatenates_deltas_until_done() {
        let answer = accumulate_stream(chunks(vec![TRANSCRIPT])).await.unwrap();
        assert_eq!(answer, "Ollama runs models locally.");
    }

    #[tokio::test]
    async fn ignores_data_after_done() {
        let input = concat!(
            r#"{"message":{"content":"a"},"done":true}"#,
            "\n",
            r#"{"message":{"content":"b"},"done":false}"#,
            "\n"
        );
        assert_eq!(accumulate_stream(chunks(vec![input])).await.unwrap(), "a");
    }

    #[tokio::test]
    async fn accepts_final_fragment_without_newline() {
        let input = r#"{"message":{"content":"x"},"done":true}"#;
        assert_eq!(accumulate_stream(chunks(vec![input])).await.unwrap(), "x");
    }

    #[tokio::test]
    async fn truncated_stream_is_an_error() {
        let input = concat!(r#"{"message":{"content":"partial"},"done":false}"#, "\n");
        let err = accumulate_stream(chunks(vec![input])).await.unwrap_err();
        assert!(matches!(err, ModelError::Provider { .. }));
        assert!(err.to_string().contains("before completion"));
    }

    #[tokio::test]
    async fn error_fragment_is_surfaced() {
        let input = concat!(r#"{"error":"model 'nope' not found"}"#, "\n");
        let err = accumulate_stream(chunks(vec![input])).await.unwrap_err();
        assert!(err.to_string().contains("model 'nope' not found"));
    }

    #[tokio::test]
    async fn malformed_fragment_is_an_error() {
        let err = accumulate_stream(chunks(vec!["not json\n"])).await.unwrap_err();
        assert!(err.to_string().contains("malformed stream fragment"));
    }

    #[tokio::test]
    async fn transport_error_is_surfaced() {
        let s = stream::iter(vec![
            Ok::<&[u8], &str>(br#"{"message":{"content":"a"},"done":false}"#),
            Err("connection reset"),
        ]);
        let err = accumulate_stream(s).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Re-chunking the byte stream at arbitrary points never changes the answer.
        #[test]
        fn chunk_boundaries_do_not_matter(
            cuts in proptest::collection::vec(0usize..TRANSCRIPT.len(), 0..12),
        ) {
            let bytes = TRANSCRIPT.as_bytes();
            let mut cuts = cuts;
            cuts.sort_unstable();
            cuts.dedup();

            let mut pieces: Vec<Vec<u8>> = Vec::new();
            let mut start = 0;
            for cut in cuts {
                pieces.push(bytes[start..cut].to_vec());
                start = cut;
            }
            pieces.push(bytes[start..].to_vec());

            let rt = tokio::runtime::Runtime::new().unwrap();
            let stream = stream::iter(pieces.into_iter().map(Ok::<_, Infallible>));
            let answer = rt.block_on(accumulate_stream(stream)).unwrap();
            prop_assert_eq!(answer, "Ollama runs models locally.");
        }
    }
}
