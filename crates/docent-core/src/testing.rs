//! Test doubles for the model capabilities and in-memory PDF fixtures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::provider::{Embedder, GenerationParams, Generator, ProviderError};

/// Words the fake embedder can "understand": one dimension each, plus a bias.
const VOCABULARY: &[&str] = &["apple", "banana", "cherr", "volcano"];

/// Keyword-presence embedder with call counters.
#[derive(Debug, Default)]
pub struct FakeEmbedder {
    calls: AtomicUsize,
    texts: AtomicUsize,
    fail: bool,
    drop_last: bool,
    mixed_dims: bool,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Returns one vector fewer than asked for.
    pub fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }

    /// Gives the last vector of each batch one extra dimension.
    pub fn mixed_dimensions(mut self) -> Self {
        self.mixed_dims = true;
        self
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|word| if lowered.contains(word) { 1.0 } else { 0.0 })
            .chain(std::iter::once(1.0))
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total number of texts embedded across all calls.
    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Unavailable("fake embedder is down".into()));
        }
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| Self::vector_for(t)).collect();
        if self.drop_last {
            vectors.pop();
        }
        if self.mixed_dims {
            if let Some(last) = vectors.last_mut() {
                last.push(0.0);
            }
        }
        Ok(vectors)
    }
}

enum Reply {
    Echo,
    Fixed(String),
    Fail,
}

/// Generator double recording prompts and parameters.
pub struct FakeGenerator {
    reply: Reply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last: Mutex<Option<(String, GenerationParams)>>,
}

impl FakeGenerator {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    /// Answers with `ECHO: ` followed by the prompt.
    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    pub fn replying(answer: &str) -> Self {
        Self::with_reply(Reply::Fixed(answer.to_string()))
    }

    pub fn failing() -> Self {
        Self::with_reply(Reply::Fail)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().map(|(p, _)| p.clone())
    }

    pub fn last_params(&self) -> Option<GenerationParams> {
        self.last.lock().unwrap().as_ref().map(|(_, params)| *params)
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((prompt.to_string(), *params));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Reply::Echo => Ok(format!("ECHO: {prompt}")),
            Reply::Fixed(answer) => Ok(answer.clone()),
            Reply::Fail => Err(ProviderError::Unavailable("fake generator is down".into())),
        }
    }
}

/// A minimal PDF with one text line per page.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
