//! `paperbot analyze <file.pdf>`: run the document pipeline on a local file.

use std::path::Path;

use {
    anyhow::{Context, Result},
    async_trait::async_trait,
    paperbot_auto_reply::{DocumentPipeline, Notifier, PipelineRequest},
    paperbot_channels::{ChannelOutbound, ConversationId},
    paperbot_config::PaperbotConfig,
};

use crate::bot::build_summarizer;

/// Progress notes go to stderr so stdout carries only the summary.
struct StderrOutbound;

#[async_trait]
impl ChannelOutbound for StderrOutbound {
    async fn send_text(&self, _to: &ConversationId, text: &str) -> paperbot_channels::Result<()> {
        eprintln!("{text}");
        Ok(())
    }
}

/// Declared type for a local file, from its extension.
fn declared_mime(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.eq_ignore_ascii_case("pdf"))
        .map(|_| "application/pdf".to_string())
}

pub async fn analyze_file(config: &PaperbotConfig, path: &Path) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let pipeline = DocumentPipeline::new(
        build_summarizer(&config.summarizer)?,
        config.pipeline.clone(),
    )?;
    let conversation = ConversationId::from("local");
    let notifier = Notifier::new(&StderrOutbound, &conversation);

    let request = PipelineRequest::ByAttachment {
        data,
        mime_type: declared_mime(path),
    };
    match pipeline.run(request, &notifier).await {
        Ok(summary) => {
            println!("{summary}");
            Ok(())
        },
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(e.into())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pdf_extensions_declare_a_pdf() {
        assert_eq!(
            declared_mime(Path::new("paper.PDF")).as_deref(),
            Some("application/pdf")
        );
        assert_eq!(declared_mime(Path::new("notes.txt")), None);
        assert_eq!(declared_mime(Path::new("README")), None);
    }
}
