//! Ordered section model for specification documents.
//!
//! A specification document is a named, ordered sequence of sections, each a
//! heading plus free-form body text. Heading-addressed replacement is a
//! first-class operation, so the document is never treated as an opaque
//! string. One Markdown file per feature is the on-disk form; `parse` and
//! `render` are exact inverses of each other for documents whose bodies
//! contain no `## ` heading-marker lines, which the merge engine rejects
//! before they ever reach a document.

use crate::error::{MergeError, Result};
use serde::{Deserialize, Serialize};

/// Heading of the append-only audit trailer maintained by the merge engine.
///
/// The trailer records one line per completed change and is always kept as
/// the last section of the document. Deltas may not target it.
pub const NOTES_HEADING: &str = "Implementation Notes";

/// A single document section: a heading and its body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section heading, unique within a document.
    pub heading: String,

    /// Body text, stored verbatim.
    pub body: String,
}

impl Section {
    /// Creates a new section from a heading and body.
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }
}

/// A specification document: the union of requirements and technical design
/// for one feature, addressed by section heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document name, conventionally the feature identifier.
    pub name: String,

    /// Ordered sections. The audit trailer, when present, is last.
    pub sections: Vec<Section>,
}

impl Document {
    /// Creates an empty document with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
        }
    }

    /// Returns `true` if the document has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Looks up a section by exact heading match.
    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    /// Mutable lookup by exact heading match.
    pub fn section_mut(&mut self, heading: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.heading == heading)
    }

    /// Returns `true` if a section with the given heading exists.
    pub fn contains(&self, heading: &str) -> bool {
        self.section(heading).is_some()
    }

    /// Appends a section to the end of the document.
    ///
    /// If the audit trailer is present it stays last: the new section is
    /// inserted just before it.
    pub fn push_section(&mut self, section: Section) {
        match self.sections.iter().position(|s| s.heading == NOTES_HEADING) {
            Some(idx) => self.sections.insert(idx, section),
            None => self.sections.push(section),
        }
    }

    /// Removes the section with the given heading.
    ///
    /// Returns `true` if a section was removed, `false` if no section with
    /// that heading existed.
    pub fn remove_section(&mut self, heading: &str) -> bool {
        match self.sections.iter().position(|s| s.heading == heading) {
            Some(idx) => {
                self.sections.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Appends one line to the audit trailer, creating the trailer on first
    /// use. Existing trailer content is never rewritten.
    pub fn append_note(&mut self, line: &str) {
        match self.section_mut(NOTES_HEADING) {
            Some(trailer) => {
                if !trailer.body.is_empty() {
                    trailer.body.push('\n');
                }
                trailer.body.push_str(line);
            }
            None => self.sections.push(Section::new(NOTES_HEADING, line)),
        }
    }

    /// Parses Markdown text into a document.
    ///
    /// The expected shape is the one `render` produces: an optional `# title`
    /// line followed by `## heading` sections. Body text is everything up to
    /// the next section heading, with surrounding blank lines trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::DocumentParse`] if non-blank text appears before
    /// the first section heading (other than the title line). Silently
    /// dropping such text would lose content on the next save.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        let mut doc = Self::new(name);
        let mut current: Option<Section> = None;
        let mut seen_title = false;

        for line in text.lines() {
            if let Some(heading) = line.strip_prefix("## ") {
                if let Some(section) = current.take() {
                    doc.sections.push(finish(section));
                }
                current = Some(Section::new(heading.trim(), String::new()));
            } else if let Some(section) = current.as_mut() {
                section.body.push_str(line);
                section.body.push('\n');
            } else if line.starts_with("# ") && !seen_title {
                seen_title = true;
            } else if !line.trim().is_empty() {
                return Err(MergeError::DocumentParse(format!(
                    "unexpected content before first section: {line:?}"
                )));
            }
        }

        if let Some(section) = current.take() {
            doc.sections.push(finish(section));
        }
        Ok(doc)
    }

    /// Renders the document back to Markdown.
    pub fn render(&self) -> String {
        let mut out = format!("# {}\n", self.name);
        for section in &self.sections {
            out.push_str("\n## ");
            out.push_str(&section.heading);
            out.push('\n');
            if !section.body.is_empty() {
                out.push('\n');
                out.push_str(&section.body);
                out.push('\n');
            }
        }
        out
    }
}

/// Trims the blank padding `render` adds around a section body.
fn finish(mut section: Section) -> Section {
    section.body = section.body.trim_matches('\n').to_string();
    section
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_lookup_and_removal() {
        let mut doc = Document::new("auth");
        doc.push_section(Section::new("Login", "Password based."));
        doc.push_section(Section::new("Sessions", "Cookie based."));

        assert!(doc.contains("Login"));
        assert_eq!(doc.section("Sessions").unwrap().body, "Cookie based.");
        assert!(doc.section("Missing").is_none());

        assert!(doc.remove_section("Login"));
        assert!(!doc.remove_section("Login"));
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn test_push_keeps_trailer_last() {
        let mut doc = Document::new("auth");
        doc.push_section(Section::new("Login", "x"));
        doc.append_note("auth/add-mfa: 1 added, 0 modified, 0 removed");
        doc.push_section(Section::new("Sessions", "y"));

        let headings: Vec<&str> = doc.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Login", "Sessions", NOTES_HEADING]);
    }

    #[test]
    fn test_append_note_accumulates_lines() {
        let mut doc = Document::new("auth");
        doc.append_note("first");
        doc.append_note("second");

        let trailer = doc.section(NOTES_HEADING).unwrap();
        assert_eq!(trailer.body, "first\nsecond");
    }

    #[test]
    fn test_render_parse_round_trip() {
        let mut doc = Document::new("auth");
        doc.push_section(Section::new("Login", "Password based.\nWith lockout."));
        doc.push_section(Section::new("Empty Body", ""));
        doc.append_note("auth/add-mfa: 1 added, 0 modified, 0 removed");

        let parsed = Document::parse("auth", &doc.render()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_parse_empty_text() {
        let doc = Document::parse("auth", "").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_parse_rejects_unstructured_preamble() {
        let result = Document::parse("auth", "free text with no heading\n");
        assert!(matches!(result, Err(MergeError::DocumentParse(_))));
    }

    #[test]
    fn test_parse_allows_title_line() {
        let doc = Document::parse("auth", "# auth\n\n## Login\n\nbody\n").unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.section("Login").unwrap().body, "body");
    }
}
