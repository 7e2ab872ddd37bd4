//! Deep links into attachments
//!
//! Builds `zotero://` URIs addressing a specific annotation inside an
//! attachment. The scheme varies by container format: PDF links carry
//! a numeric `page` query parameter, EPUB links never do.

use crate::annotations::{Library, EPUB_CONTENT_TYPE};

/// A link plus the human-readable label callers wrap per syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationLink {
    pub uri: String,
    pub label: String,
}

/// Build an open-pdf link with independently optional page and
/// annotation parameters.
///
/// Empty parameters are omitted; with both empty the link has no `?`
/// suffix at all.
pub fn build_open_pdf_link(attachment_key: &str, page_label: &str, annotation_key: &str) -> String {
    let mut link = format!("zotero://open-pdf/library/items/{}", attachment_key);
    let mut params = Vec::new();
    if !page_label.is_empty() {
        params.push(format!("page={}", page_label));
    }
    if !annotation_key.is_empty() {
        params.push(format!("annotation={}", annotation_key));
    }
    if !params.is_empty() {
        link.push('?');
        link.push_str(&params.join("&"));
    }
    link
}

/// Build the link and display label for one annotation.
///
/// `location` is the annotation's page label for PDFs (parsed as an
/// integer, page 1 on parse failure) and the raw location label for
/// EPUBs (chapter name or EPUBCFI, passed through verbatim).
pub fn build_annotation_link(
    library: &Library,
    attachment_key: &str,
    annotation_key: &str,
    location: &str,
    content_type: &str,
) -> AnnotationLink {
    let segment = library.link_segment();

    if content_type == EPUB_CONTENT_TYPE {
        let mut uri = format!("zotero://open-epub/{}/items/{}", segment, attachment_key);
        if !annotation_key.is_empty() {
            uri.push_str(&format!("?annotation={}", annotation_key));
        }
        let label = if location.is_empty() {
            "Location".to_string()
        } else {
            location.to_string()
        };
        return AnnotationLink { uri, label };
    }

    // PDF and default
    let page = location.trim().parse::<i64>().unwrap_or(1);
    let mut uri = format!(
        "zotero://open-pdf/{}/items/{}?page={}",
        segment, attachment_key, page
    );
    if !annotation_key.is_empty() {
        uri.push_str(&format!("&annotation={}", annotation_key));
    }
    AnnotationLink {
        uri,
        label: format!("Page {}", page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_pdf_link_with_both_params() {
        assert_eq!(
            build_open_pdf_link("ATT001", "5", "ANN001"),
            "zotero://open-pdf/library/items/ATT001?page=5&annotation=ANN001"
        );
    }

    #[test]
    fn test_open_pdf_link_annotation_only() {
        assert_eq!(
            build_open_pdf_link("ATT001", "", "ANN001"),
            "zotero://open-pdf/library/items/ATT001?annotation=ANN001"
        );
    }

    #[test]
    fn test_open_pdf_link_page_only() {
        assert_eq!(
            build_open_pdf_link("ATT001", "12", ""),
            "zotero://open-pdf/library/items/ATT001?page=12"
        );
    }

    #[test]
    fn test_open_pdf_link_no_params() {
        assert_eq!(
            build_open_pdf_link("ATT001", "", ""),
            "zotero://open-pdf/library/items/ATT001"
        );
    }

    #[test]
    fn test_pdf_annotation_link() {
        let link = build_annotation_link(
            &Library::Personal,
            "ATT001",
            "ANN001",
            "5",
            "application/pdf",
        );
        assert_eq!(
            link.uri,
            "zotero://open-pdf/library/items/ATT001?page=5&annotation=ANN001"
        );
        assert_eq!(link.label, "Page 5");
    }

    #[test]
    fn test_pdf_unparseable_page_defaults_to_one() {
        let link = build_annotation_link(
            &Library::Personal,
            "ATT001",
            "ANN001",
            "xiv",
            "application/pdf",
        );
        assert!(link.uri.contains("page=1"));
        assert_eq!(link.label, "Page 1");
    }

    #[test]
    fn test_epub_link_never_has_page_param() {
        let link = build_annotation_link(
            &Library::Personal,
            "ATT001",
            "ANN001",
            "Chapter 3",
            "application/epub+zip",
        );
        assert_eq!(
            link.uri,
            "zotero://open-epub/library/items/ATT001?annotation=ANN001"
        );
        assert!(!link.uri.contains("page="));
        assert_eq!(link.label, "Chapter 3");
    }

    #[test]
    fn test_epub_empty_location_labelled_location() {
        let link = build_annotation_link(
            &Library::Personal,
            "ATT001",
            "",
            "",
            "application/epub+zip",
        );
        assert_eq!(link.uri, "zotero://open-epub/library/items/ATT001");
        assert_eq!(link.label, "Location");
    }

    #[test]
    fn test_group_library_segment() {
        let link = build_annotation_link(
            &Library::Group(4512),
            "ATT001",
            "ANN001",
            "9",
            "application/pdf",
        );
        assert!(link.uri.starts_with("zotero://open-pdf/groups/4512/items/ATT001"));
    }
}
