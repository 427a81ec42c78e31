//! A small built-in corpus so the demo works out of the box.

use std::fs;
use std::path::Path;

use tracing::info;

const OLLAMA_GUIDE: &str = r#"# Ollama: Local Language Models

Ollama runs large language models on your own machine. It wraps model download,
caching and serving behind one command-line tool and a small HTTP API.

## Highlights

- **Installation**: one command on macOS and Linux, an installer on Windows
- **Model library**: pull, list and remove models by name and tag
- **HTTP API**: a server on http://localhost:11434 for programs to call
- **Hardware**: uses a GPU when one is available and falls back to the CPU

## First Steps

Install it:
```
curl -fsSL https://ollama.com/install.sh | sh
```

Pull a model:
```
ollama pull llama3
```

Chat with it:
```
ollama run llama3
```

## Popular Models

- Llama 3 (8B, 70B), Meta's open-weight model family
- Mistral (7B), small and quick
- Phi-3, a compact model from Microsoft
- CodeLlama, tuned for writing code

## Calling the API

`POST /api/chat` takes a model name and a list of messages. With `stream`
enabled the reply arrives as newline-delimited JSON fragments, the last of
which carries `"done": true`. `GET /api/tags` lists installed models.
"#;

const RAG_EXPLAINED: &str = r#"# Retrieval-Augmented Generation

Retrieval-augmented generation (RAG) gives a language model relevant passages
from a document collection at question time, so answers draw on that
collection instead of only on what the model memorised during training.

## The Pipeline

1. **Chunking**: split each document into overlapping pieces of a few hundred tokens
2. **Embedding**: turn every chunk into a vector
3. **Indexing**: store the vectors with their text and source
4. **Query embedding**: turn the question into a vector the same way
5. **Search**: find the chunks whose vectors are closest to the question
6. **Prompting**: put those chunks into the prompt as context
7. **Generation**: let the model answer from that context

## Why Use It

- Answers are tied to real documents, which reduces made-up facts
- The collection can change without retraining the model
- Responses can point back to their sources
- It works well for narrow or private knowledge

## RAG or Fine-tuning?

Reach for RAG when information changes often or sources must be cited.
Fine-tuning suits cases where the model must adopt a style or format, or where
knowledge has to be built into the weights.

## Tuning Knobs

- Chunk size trades precision against context (500 to 1000 tokens is common)
- The embedding model decides what "similar" means
- Retrieving more chunks adds context but also noise
"#;

const LOCAL_VS_CLOUD: &str = r#"# Local or Cloud Models?

Running a model yourself and calling a hosted API each have costs and benefits.

## Hosted (Cloud) Models

- The largest and most capable models are only available this way
- Nothing to install or operate, and capacity scales on demand
- You pay per token, with no hardware up front

## Local Models

- Prompts and documents never leave your machines
- No per-token fees, so heavy use can be cheaper
- You pick the exact model version and are not subject to rate limits
- Works offline and in isolated networks

## Choose Local When

- The data is sensitive or regulated
- Volume is high and steady
- You need to work without an internet connection
- You are prototyping or building internal tools

## Choose Cloud When

- You need the strongest reasoning available
- Usage is spiky or hard to predict
- You lack suitable hardware

## Mixing Both

Many teams embed and classify locally, keep sensitive work on local models, and
send demanding generation to a hosted model. Being able to switch providers
without touching the retrieval code makes that mix easy.
"#;

/// The sample documents as `(file name, content)` pairs.
pub const SAMPLE_DOCUMENTS: &[(&str, &str)] = &[
    ("ollama_guide.md", OLLAMA_GUIDE),
    ("rag_explained.md", RAG_EXPLAINED),
    ("local_vs_cloud.md", LOCAL_VS_CLOUD),
];

/// Questions the sample corpus can answer.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "How do I install Ollama?",
    "What is RAG and how does it work?",
    "What are the benefits of running LLMs locally?",
    "When should I choose cloud vs local LLMs?",
    "What models are available in Ollama?",
    "Should I use RAG or fine-tuning?",
];

/// Write the sample corpus into `dir` if it is missing or holds no files.
///
/// Returns `true` if documents were written.
pub fn ensure_sample_documents(dir: &Path) -> std::io::Result<bool> {
    if dir.is_dir() && fs::read_dir(dir)?.next().is_some() {
        return Ok(false);
    }
    fs::create_dir_all(dir)?;
    for (name, content) in SAMPLE_DOCUMENTS {
        fs::write(dir.join(name), content)?;
    }
    info!(dir = %dir.display(), count = SAMPLE_DOCUMENTS.len(), "wrote sample documents");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_missing_directory_once() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("sample_docs");

        assert!(ensure_sample_documents(&dir).unwrap());
        assert!(dir.join("ollama_guide.md").is_file());
        assert!(dir.join("rag_explained.md").is_file());
        assert!(dir.join("local_vs_cloud.md").is_file());

        assert!(!ensure_sample_documents(&dir).unwrap());
    }

    #[test]
    fn leaves_populated_directory_alone() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("mine.txt"), "my notes").unwrap();
        assert!(!ensure_sample_documents(temp.path()).unwrap());
        assert!(!temp.path().join("ollama_guide.md").exists());
    }
}
