use std::fmt::Write;

use super::DocumentInfo;

const RUBRIC: &str = "\
1. A brief summary of what this document is about
2. The main contributions or key findings of the research
3. The methodology used (if any)
4. Conclusions and implications of the research
5. The relevance and significance of this work";

/// Analysis prompt: known metadata, the five-point rubric, then the text.
pub fn build_prompt(info: Option<&DocumentInfo>, text: &str) -> String {
    let mut prompt = String::new();

    match info {
        Some(info) => {
            prompt.push_str("Analyze the following scientific work in detail:\n");
            let _ = writeln!(prompt, "Title: {}", info.title);
            let _ = writeln!(prompt, "Authors: {}", info.authors_line());
            let _ = writeln!(prompt, "Year: {}", info.year);
            if let Some(abstract_text) = info.abstract_text.as_deref()
                && !abstract_text.trim().is_empty()
            {
                let _ = writeln!(prompt, "Abstract: {abstract_text}");
            }
            prompt.push_str(
                "\nProvide a comprehensive summary of this work covering the following aspects:\n",
            );
        },
        None => {
            prompt.push_str("Analyze this scientific work covering the following aspects:\n");
        },
    }

    prompt.push_str(RUBRIC);
    prompt.push_str("\n\nPlease present the information in a structured, easy-to-understand format.");
    let _ = write!(prompt, "\n\nPDF document content:\n{text}");
    prompt
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn info(abstract_text: Option<&str>) -> DocumentInfo {
        DocumentInfo {
            title: "Pendidikan Islam".into(),
            authors: vec!["Ahmad".into(), "Budi".into()],
            year: "2021".into(),
            abstract_text: abstract_text.map(Into::into),
        }
    }

    #[test]
    fn metadata_comes_before_rubric_and_text() {
        let prompt = build_prompt(Some(&info(Some("Kajian singkat."))), "BODY");

        let title = prompt.find("Title: Pendidikan Islam").unwrap();
        let rubric = prompt.find("1. A brief summary").unwrap();
        let body = prompt.find("PDF document content:\nBODY").unwrap();
        assert!(title < rubric && rubric < body);
        assert!(prompt.contains("Authors: Ahmad, Budi"));
        assert!(prompt.contains("Year: 2021"));
        assert!(prompt.contains("Abstract: Kajian singkat."));
        assert!(prompt.contains("5. The relevance and significance"));
    }

    #[test]
    fn blank_abstract_is_left_out() {
        let prompt = build_prompt(Some(&info(Some("  "))), "BODY");
        assert!(!prompt.contains("Abstract:"));
    }

    #[test]
    fn attachment_prompt_has_rubric_without_metadata() {
        let prompt = build_prompt(None, "BODY");
        assert!(prompt.starts_with("Analyze this scientific work"));
        assert!(!prompt.contains("Title:"));
        assert!(prompt.contains("3. The methodology used"));
        assert!(prompt.ends_with("PDF document content:\nBODY"));
    }
}
