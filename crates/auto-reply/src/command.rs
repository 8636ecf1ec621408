//! Text command grammar.
//!
//! Commands are case-insensitive word prefixes followed by a free-text
//! remainder. Patterns are tried in a fixed order and the first match wins.
//! An argument command sent without its argument is not a command at all.

use paperbot_channels::MediaKind;

use crate::classify::ClassifiedMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Search { keyword: String },
    Detail { index: usize },
    AnalyzeIndex { index: usize },
    Url { url: String },
    Download { url: String },
    /// `paper analyze` sent as a reply to a document.
    AnalyzeAttachment,
    Help,
}

impl Command {
    /// Stable name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Search { .. } => "search",
            Self::Detail { .. } => "detail",
            Self::AnalyzeIndex { .. } => "analyze",
            Self::Url { .. } => "url",
            Self::Download { .. } => "download",
            Self::AnalyzeAttachment => "analyze_attachment",
            Self::Help => "help",
        }
    }
}

/// A recognised command with a malformed argument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("usage: {usage}")]
pub struct ParseError {
    pub usage: &'static str,
}

pub const DETAIL_USAGE: &str = "paper detail [number]";
pub const ANALYZE_USAGE: &str = "paper analyze [number]";
type Handler = fn(&str, &ClassifiedMessage) -> Option<Result<Command, ParseError>>;

/// Priority-ordered patterns: (command words, whether a remainder is allowed, builder).
const PATTERNS: &[(&str, bool, Handler)] = &[
    ("ping", false, parse_ping),
    ("paper search", true, parse_search),
    ("paper detail", true, parse_detail),
    ("paper analyze", true, parse_analyze),
    ("paper url", true, parse_url),
    ("paper download", true, parse_download),
    ("help", false, parse_help),
];

/// Parse the message text. `None` means the text is not addressed to the bot.
pub fn parse(message: &ClassifiedMessage) -> Option<Result<Command, ParseError>> {
    let text = message.text.trim();
    PATTERNS.iter().find_map(|(words, takes_args, handler)| {
        let rest = strip_command(text, words)?;
        if !takes_args && !rest.is_empty() {
            return None;
        }
        handler(rest, message)
    })
}

fn parse_ping(_: &str, _: &ClassifiedMessage) -> Option<Result<Command, ParseError>> {
    Some(Ok(Command::Ping))
}

fn parse_help(_: &str, _: &ClassifiedMessage) -> Option<Result<Command, ParseError>> {
    Some(Ok(Command::Help))
}

fn parse_search(rest: &str, _: &ClassifiedMessage) -> Option<Result<Command, ParseError>> {
    argument(rest).map(|keyword| Ok(Command::Search { keyword }))
}

fn parse_detail(rest: &str, _: &ClassifiedMessage) -> Option<Result<Command, ParseError>> {
    let arg = argument(rest)?;
    Some(parse_index(&arg, DETAIL_USAGE).map(|index| Command::Detail { index }))
}

fn parse_url(rest: &str, _: &ClassifiedMessage) -> Option<Result<Command, ParseError>> {
    argument(rest).map(|url| Ok(Command::Url { url }))
}

fn parse_download(rest: &str, _: &ClassifiedMessage) -> Option<Result<Command, ParseError>> {
    argument(rest).map(|url| Ok(Command::Download { url }))
}

fn parse_analyze(rest: &str, message: &ClassifiedMessage) -> Option<Result<Command, ParseError>> {
    match argument(rest) {
        Some(arg) => Some(
            parse_index(&arg, ANALYZE_USAGE).map(|index| Command::AnalyzeIndex { index }),
        ),
        // Bare form only means something as a reply to a document.
        None => (message.quoted_kind() == Some(MediaKind::Document))
            .then_some(Ok(Command::AnalyzeAttachment)),
    }
}

/// Match `words` case-insensitively at the start of `text`, followed by
/// whitespace or the end of the text. Returns the trimmed remainder.
fn strip_command<'a>(text: &'a str, words: &str) -> Option<&'a str> {
    let head = text.get(..words.len())?;
    if !head.eq_ignore_ascii_case(words) {
        return None;
    }
    let rest = text.get(words.len()..)?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

fn argument(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Indices are non-negative integers; range checks happen against the cache.
fn parse_index(rest: &str, usage: &'static str) -> Result<usize, ParseError> {
    rest.parse::<usize>().map_err(|_| ParseError { usage })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::classify::{QuotedMessage, classify},
        paperbot_channels::MessageContent,
        rstest::rstest,
    };

    fn text(t: &str) -> ClassifiedMessage {
        classify(&MessageContent::text(t))
    }

    fn replying_to(kind: MediaKind, t: &str) -> ClassifiedMessage {
        ClassifiedMessage {
            text: t.into(),
            quoted: Some(QuotedMessage {
                kind,
                stanza_id: Some("Q".into()),
                content: MessageContent::default(),
            }),
        }
    }

    #[rstest]
    #[case("ping", Command::Ping)]
    #[case("PING", Command::Ping)]
    #[case("  ping  ", Command::Ping)]
    #[case("help", Command::Help)]
    #[case("Help", Command::Help)]
    #[case("paper search islam", Command::Search { keyword: "islam".into() })]
    #[case("Paper Search Pendidikan Islam", Command::Search { keyword: "Pendidikan Islam".into() })]
    #[case("paper detail 2", Command::Detail { index: 2 })]
    #[case("paper detail 0", Command::Detail { index: 0 })]
    #[case("PAPER ANALYZE 3", Command::AnalyzeIndex { index: 3 })]
    #[case("paper url https://repo.example/1023/", Command::Url { url: "https://repo.example/1023/".into() })]
    #[case("paper download http://x/y%20z.pdf", Command::Download { url: "http://x/y%20z.pdf".into() })]
    fn recognises_commands(#[case] input: &str, #[case] expected: Command) {
        assert_eq!(parse(&text(input)), Some(Ok(expected)));
    }

    #[rstest]
    #[case("paper detail two", DETAIL_USAGE)]
    #[case("paper detail -1", DETAIL_USAGE)]
    #[case("paper detail 1.5", DETAIL_USAGE)]
    #[case("paper analyze x", ANALYZE_USAGE)]
    fn malformed_arguments_are_usage_errors(#[case] input: &str, #[case] usage: &'static str) {
        assert_eq!(parse(&text(input)), Some(Err(ParseError { usage })));
    }

    #[rstest]
    #[case("")]
    #[case("hello there")]
    #[case("ping me")]
    #[case("helpful")]
    #[case("paper searching")]
    #[case("paper")]
    #[case("what is a paper search")]
    #[case("paper detail")]
    #[case("paper analyze")]
    #[case("paper search    ")]
    #[case("paper url")]
    #[case("paper download")]
    fn unrelated_text_is_ignored(#[case] input: &str) {
        assert_eq!(parse(&text(input)), None);
    }

    #[test]
    fn bare_analyze_on_quoted_document_targets_attachment() {
        assert_eq!(
            parse(&replying_to(MediaKind::Document, "Paper Analyze")),
            Some(Ok(Command::AnalyzeAttachment))
        );
    }

    #[test]
    fn bare_analyze_on_quoted_image_is_ignored() {
        assert_eq!(parse(&replying_to(MediaKind::Image, "paper analyze")), None);
    }

    #[test]
    fn indexed_analyze_wins_over_quoted_document() {
        assert_eq!(
            parse(&replying_to(MediaKind::Document, "paper analyze 2")),
            Some(Ok(Command::AnalyzeIndex { index: 2 }))
        );
    }
}
