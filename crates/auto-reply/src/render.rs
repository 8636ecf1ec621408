//! Chat message texts. WhatsApp markup: `*bold*`.

use {
    paperbot_repository::{DocumentDetail, DocumentSummary, SearchResultSet},
    std::fmt::Write,
};

use crate::{ReferenceError, command::ParseError};

pub const PONG: &str = "pong";

pub const GENERIC_FAILURE: &str =
    "❌ Something went wrong while handling your message. Please try again.";

pub const DOWNLOAD_PROMPT: &str =
    "Type *paper download [URL]* to download and analyze this document.";

pub const NO_DOWNLOAD_LINK: &str = "❌ There is no download link for this document";

pub const DETAIL_FAILED: &str = "❌ Failed to fetch the document detail";

pub const ATTACHMENT_PROGRESS: &str = "📄 Downloading and processing the replied document...";

pub const ATTACHMENT_DOWNLOAD_FAILED: &str = "❌ Failed to download the PDF document";

pub const HELP: &str = "\
*WhatsApp Repository Bot*

*Basic commands:*
- `ping` - Check whether the bot is alive

*Repository commands:*
- `paper search [keyword]` - Search the repository
- `paper detail [number]` - Show the detail of a search result
- `paper analyze [number]` - Analyze the content of a search result
- `paper url [URL]` - Show the detail of a repository page
- `paper download [URL]` - Download and analyze a PDF from a URL
- `paper analyze` - Analyze the PDF document you reply to

*Examples:*
> paper search pendidikan islam
> paper detail 1
> paper analyze 2
> paper url https://repository.iainkediri.ac.id/1023/
> paper download https://repository.iainkediri.ac.id/1023/1/Pendidikan%20Islam%20Dalam%20Guncangan%20Post%20Truth.pdf";

pub fn search_progress(keyword: &str) -> String {
    format!("🔍 Searching for documents matching *{keyword}*...")
}

pub fn search_failed(keyword: &str) -> String {
    format!("❌ Failed to search for documents matching *{keyword}*")
}

pub fn no_results(keyword: &str) -> String {
    format!("❌ No results found for *{keyword}*")
}

pub fn detail_progress(title: &str) -> String {
    format!("🔍 Fetching detail for document *{title}*...")
}

pub fn url_progress(url: &str) -> String {
    format!("🔍 Looking up document detail from URL: {url}...")
}

pub fn url_failed(url: &str) -> String {
    format!("❌ Failed to fetch document detail from URL: {url}")
}

pub fn download_progress(url: &str) -> String {
    format!("📥 Downloading document from URL: {url}...")
}

pub fn usage(err: &ParseError) -> String {
    format!("❌ Wrong format. Use: *{}*", err.usage)
}

pub fn reference_error(err: &ReferenceError) -> String {
    match err {
        ReferenceError::NoPriorSearch => {
            "❌ There are no previous search results. Use 'paper search [keyword]' first.".into()
        },
        ReferenceError::IndexOutOfRange { len, .. } => {
            format!("❌ Invalid number. Use a number from 1-{len}")
        },
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn join_authors(authors: &[String]) -> String {
    if authors.is_empty() {
        "No authors".into()
    } else {
        authors.join(", ")
    }
}

/// Search listing: at most `max_items` entries, then a note for the rest.
pub fn search_listing(results: &SearchResultSet, max_items: usize) -> String {
    let mut out = format!(
        "🔍 Search results for: *{}*\nShowing {} of {} results\n\n",
        results.keyword, results.returned_count, results.total_count
    );

    let listed = &results.items[..results.items.len().min(max_items)];
    for (i, item) in listed.iter().enumerate() {
        write_listing_item(&mut out, i + 1, item);
    }

    let remaining = results.total_count.saturating_sub(listed.len() as u64);
    if remaining > 0 {
        let _ = writeln!(out, "...and {remaining} more results.");
    }

    out.push_str(
        "\nType *paper detail [number]* to see the details and *paper analyze [number]* to analyze the paper's content.",
    );
    out
}

fn write_listing_item(out: &mut String, number: usize, item: &DocumentSummary) {
    let _ = writeln!(out, "*{number}. {}*", or_placeholder(&item.title, "No title"));
    let _ = writeln!(out, "Authors: {}", join_authors(&item.authors));
    let _ = writeln!(out, "Year: {}", or_placeholder(&item.year, "No year"));
    if let Some(link) = item.primary_download() {
        let _ = writeln!(out, "Download: {link}");
    }
    let _ = writeln!(out, "URL: {}\n", or_placeholder(&item.url, "#"));
}

/// Full document detail. `author_key`/`year_key` name the metadata fields
/// that are shown on their own lines instead of under "Other metadata".
pub fn document_detail(detail: &DocumentDetail, author_key: &str, year_key: &str) -> String {
    let authors = detail
        .authors(author_key)
        .map(|a| join_authors(&a))
        .unwrap_or_else(|| "No authors".into());
    let year = detail
        .year(year_key)
        .map(|y| or_placeholder(y, "No year"))
        .unwrap_or("No year");

    let mut out = String::from("📝 *Document Detail*\n\n");
    let _ = writeln!(out, "*Title:* {}", or_placeholder(&detail.title, "No title"));
    let _ = writeln!(out, "*Authors:* {authors}");
    let _ = writeln!(out, "*Year:* {year}\n");
    let _ = writeln!(
        out,
        "*Abstract:*\n{}\n",
        or_placeholder(&detail.abstract_text, "No abstract")
    );

    let mut others = detail
        .metadata
        .iter()
        .filter(|(k, _)| *k != author_key && *k != year_key)
        .peekable();
    if others.peek().is_some() {
        out.push_str("*Other Metadata:*\n");
        for (key, value) in others {
            let _ = writeln!(out, "{key}: {value}");
        }
    }

    if !detail.download_links.is_empty() {
        out.push_str("\n*Download Links:*\n");
        for (i, link) in detail.download_links.iter().enumerate() {
            let _ = writeln!(out, "{}. {link}", i + 1);
        }
    }

    out.trim_end().to_string()
}

/// Best-effort document title from the last path segment of a PDF URL.
pub fn title_from_url(url: &str) -> String {
    let segment = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.replace("%20", " "));
    let title = decoded
        .strip_suffix(".pdf")
        .or_else(|| decoded.strip_suffix(".PDF"))
        .unwrap_or(&decoded)
        .trim();

    if title.is_empty() {
        "Document".into()
    } else {
        title.to_string()
    }
}
