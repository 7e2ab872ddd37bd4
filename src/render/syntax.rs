//! Output syntax adapter
//!
//! One enum parameterizes everything that differs between org-mode and
//! Markdown output: link wrapping, block delimiters, heading markers,
//! and tag decoration. The block renderer and document assembler are
//! written once against this adapter.

use serde::{Deserialize, Serialize};

/// Output syntax for rendered documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Org,
    Markdown,
}

impl Syntax {
    /// File extension for saved output
    pub fn extension(&self) -> &'static str {
        match self {
            Syntax::Org => "org",
            Syntax::Markdown => "md",
        }
    }

    /// A link line introducing an annotation block
    pub fn link_line(&self, uri: &str, label: &str) -> String {
        match self {
            Syntax::Org => format!("[[{}][{}]]:", uri, label),
            Syntax::Markdown => format!("[{}]({}):", label, uri),
        }
    }

    /// Heading at `depth` (1 = top)
    pub fn heading(&self, depth: u32, title: &str) -> String {
        let marker = match self {
            Syntax::Org => "*",
            Syntax::Markdown => "#",
        };
        format!("{} {}", marker.repeat(depth.max(1) as usize), title)
    }

    /// Quoted body of a highlight or underline
    pub fn quote_block(&self, text: &str) -> Vec<String> {
        match self {
            Syntax::Org => {
                let mut lines = vec!["#+begin_quote".to_string()];
                lines.extend(text.lines().map(String::from));
                lines.push("#+end_quote".to_string());
                lines
            }
            Syntax::Markdown => {
                let mut lines = vec![String::new()];
                lines.extend(text.lines().map(|l| format!("> {}", l)));
                lines
            }
        }
    }

    /// Comment-styled block used for note annotations
    pub fn comment_block(&self, text: &str) -> Vec<String> {
        match self {
            Syntax::Org => {
                let mut lines = vec!["#+begin_comment".to_string()];
                lines.extend(text.lines().map(String::from));
                lines.push("#+end_comment".to_string());
                lines
            }
            Syntax::Markdown => vec![String::new(), format!("*{}*", text)],
        }
    }

    /// Fixed placeholder block for image/ink annotations.
    ///
    /// `emphasized` selects the chapter-aware decoration for Markdown
    /// (`*[...]*`); the flat listing uses backticks.
    pub fn placeholder_block(&self, placeholder: &str, emphasized: bool) -> Vec<String> {
        match self {
            Syntax::Org => vec![
                "#+begin_example".to_string(),
                format!("[{}]", placeholder),
                "#+end_example".to_string(),
            ],
            Syntax::Markdown => {
                let decorated = if emphasized {
                    format!("*[{}]*", placeholder)
                } else {
                    format!("`[{}]`", placeholder)
                };
                vec![String::new(), decorated]
            }
        }
    }

    /// Inline tag line for the chapter-aware path
    pub fn tag_line(&self, tags: &[String]) -> Option<String> {
        if tags.is_empty() {
            return None;
        }
        let clean: Vec<String> = tags.iter().map(|t| sanitize_tag(self, t)).collect();
        match self {
            Syntax::Org => Some(format!(":{}:", clean.join(":"))),
            Syntax::Markdown => Some(clean.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ")),
        }
    }

    /// Tag listing for the flat per-item path
    pub fn tag_listing(&self, tags: &[String]) -> Option<String> {
        if tags.is_empty() {
            return None;
        }
        let clean: Vec<String> = tags.iter().map(|t| sanitize_tag(self, t)).collect();
        match self {
            Syntax::Org => Some(format!(":{}:", clean.join(":"))),
            Syntax::Markdown => Some(format!(
                "Tags: {}",
                clean.iter().map(|t| format!("`{}`", t)).collect::<Vec<_>>().join(", ")
            )),
        }
    }
}

/// Make one tag token safe for its decoration: no whitespace or colon
/// may survive, or the surrounding syntax stops parsing.
fn sanitize_tag(syntax: &Syntax, tag: &str) -> String {
    let space_sub = match syntax {
        Syntax::Org => '_',
        Syntax::Markdown => '-',
    };
    tag.chars()
        .map(|c| {
            if c.is_whitespace() {
                space_sub
            } else if c == ':' {
                '-'
            } else {
                c
            }
        })
        .collect()
}
