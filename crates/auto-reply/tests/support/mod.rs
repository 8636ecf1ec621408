#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    lopdf::{
        Document, Object, Stream,
        content::{Content, Operation},
        dictionary,
    },
    paperbot_auto_reply::{DocumentPipeline, Router},
    paperbot_channels::{
        AttachmentDownloader, ChannelAttachment, ChannelOutbound, ConversationId, InboundMessage,
        MessageContent,
    },
    paperbot_config::PipelineConfig,
    paperbot_repository::{DocumentDetail, RepositoryApi, SearchResultSet},
    paperbot_summarizer::Summarizer,
};

pub const CHAT: &str = "6281234567890@s.whatsapp.net";

#[derive(Default)]
pub struct FakeOutbound {
    sent: Mutex<Vec<(ConversationId, String)>>,
    replies: Mutex<Vec<(String, String)>>,
    /// Upcoming `send_text` calls that fail without recording anything.
    pub failing_sends: AtomicUsize,
}

impl FakeOutbound {
    pub fn messages(&self) -> Vec<(ConversationId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    /// `(quoted message id, text)` for quoted replies.
    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.texts().last().cloned()
    }
}

#[async_trait]
impl ChannelOutbound for FakeOutbound {
    async fn send_text(&self, to: &ConversationId, text: &str) -> paperbot_channels::Result<()> {
        if self
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(paperbot_channels::Error::unavailable("socket closed"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.clone(), text.to_string()));
        Ok(())
    }

    async fn reply_text(&self, original: &InboundMessage, text: &str) -> paperbot_channels::Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push((original.message_id.clone(), text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRepository {
    pub results: Option<SearchResultSet>,
    pub detail: Option<DocumentDetail>,
    pub search_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl FakeRepository {
    pub fn calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst) + self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryApi for FakeRepository {
    async fn search(&self, keyword: &str) -> paperbot_repository::Result<SearchResultSet> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        match &self.results {
            Some(results) => Ok(SearchResultSet {
                keyword: keyword.to_string(),
                ..results.clone()
            }),
            None => Err(paperbot_repository::Error::Status {
                status: 500,
                body: "down".into(),
            }),
        }
    }

    async fn detail(&self, _url: &str) -> paperbot_repository::Result<DocumentDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.detail.clone().ok_or(paperbot_repository::Error::Status {
            status: 404,
            body: "missing".into(),
        })
    }
}

#[derive(Default)]
pub struct FakeSummarizer {
    pub prompts: Mutex<Vec<String>>,
}

impl FakeSummarizer {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    fn name(&self) -> &str {
        "fake"
    }

    async fn summarize(&self, prompt: &str) -> paperbot_summarizer::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("SUMMARY".into())
    }
}

#[derive(Default)]
pub struct FakeDownloader {
    pub attachment: Option<ChannelAttachment>,
}

#[async_trait]
impl AttachmentDownloader for FakeDownloader {
    async fn download(
        &self,
        _account_id: &str,
        _content: &MessageContent,
    ) -> paperbot_channels::Result<ChannelAttachment> {
        self.attachment
            .clone()
            .ok_or_else(|| paperbot_channels::Error::unavailable("no media"))
    }
}

pub struct Harness {
    pub router: Router,
    pub outbound: Arc<FakeOutbound>,
    pub repository: Arc<FakeRepository>,
    pub summarizer: Arc<FakeSummarizer>,
}

impl Harness {
    pub fn new(repository: FakeRepository, downloader: FakeDownloader) -> Self {
        let outbound = Arc::new(FakeOutbound::default());
        let repository = Arc::new(repository);
        let summarizer = Arc::new(FakeSummarizer::default());
        let pipeline = DocumentPipeline::new(
            Arc::clone(&summarizer) as Arc<dyn Summarizer>,
            PipelineConfig::default(),
        )
        .unwrap();
        let router = Router::new(
            Arc::clone(&repository) as Arc<dyn RepositoryApi>,
            Arc::new(pipeline),
            Arc::clone(&outbound) as Arc<dyn ChannelOutbound>,
            Arc::new(downloader),
        );
        Self {
            router,
            outbound,
            repository,
            summarizer,
        }
    }

    pub async fn send(&self, content: MessageContent) {
        self.router.process(&inbound(content)).await;
    }

    pub async fn say(&self, text: &str) {
        self.send(MessageContent::text(text)).await;
    }
}

pub fn inbound(content: MessageContent) -> InboundMessage {
    InboundMessage {
        account_id: "default".into(),
        message_id: "MSG-1".into(),
        conversation: ConversationId::from(CHAT),
        sender_id: CHAT.into(),
        sender_name: Some("Tester".into()),
        content,
        timestamp: 1_700_000_000,
    }
}

pub fn results(titles: &[&str]) -> SearchResultSet {
    let items: Vec<_> = titles
        .iter()
        .map(|t| {
            serde_json::from_value(serde_json::json!({
                "title": t,
                "authors": ["Ahmad"],
                "year": "2020",
                "url": format!("https://repo.example/{t}/"),
                "download_links": [format!("https://repo.example/{t}/1/{t}.pdf")]
            }))
            .unwrap()
        })
        .collect();
    SearchResultSet {
        keyword: String::new(),
        returned_count: items.len() as u64,
        total_count: items.len() as u64,
        items,
    }
}

/// A reply to a quoted document with the given declared type.
pub fn reply_to_document(mimetype: &str) -> MessageContent {
    serde_json::from_value(serde_json::json!({
        "extendedTextMessage": {
            "text": "paper analyze",
            "contextInfo": {
                "stanzaId": "DOC-1",
                "quotedMessage": {
                    "documentMessage": { "mimetype": mimetype, "fileName": "paper.pdf" }
                }
            }
        }
    }))
    .unwrap()
}

/// One-page PDF whose page shows `text`.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
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
