//! End-to-end document assembly tests over fixture models

use marginalia::annotations::{
    Annotation, AnnotationKind, Attachment, CollectionAnnotations, ItemAnnotations, Library,
};
use marginalia::render::{
    assemble_collection, assemble_item, render_annotation_listing, ChapterMapEntry, ChapterMaps,
    Syntax,
};

fn annotation(key: &str, kind: AnnotationKind) -> Annotation {
    Annotation::new(key, kind)
}

fn single_highlight_item() -> ItemAnnotations {
    ItemAnnotations {
        key: "ABC123".to_string(),
        title: "Test Item".to_string(),
        item_type: "journalArticle".to_string(),
        attachments: vec![Attachment {
            key: "ATT001".to_string(),
            title: "test.pdf".to_string(),
            filename: "test.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            annotations: vec![annotation("ANN001", AnnotationKind::Highlight)
                .with_text("Some highlighted text")
                .with_page_label("5")
                .with_sort_index("00005|001000|00100")],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn multi_annotation_item() -> ItemAnnotations {
    let annotations = vec![
        annotation("ANN_P20", AnnotationKind::Highlight)
            .with_text("Later text on page 20")
            .with_comment("A comment on this")
            .with_page_label("20")
            .with_sort_index("00020|002000|00100")
            .with_tags(&["important"]),
        annotation("ANN_P5", AnnotationKind::Highlight)
            .with_text("Early text on page 5")
            .with_page_label("5")
            .with_sort_index("00005|001000|00100"),
        annotation("ANN_NOTE", AnnotationKind::Note)
            .with_comment("This is a standalone note")
            .with_page_label("10")
            .with_sort_index("00010|001500|00050")
            .with_tags(&["follow-up"]),
        annotation("ANN_IMG", AnnotationKind::Image)
            .with_comment("Figure 1: Architecture diagram")
            .with_page_label("8")
            .with_sort_index("00008|001200|00200")
            .with_tags(&["figure"]),
    ];
    ItemAnnotations {
        key: "ABC123".to_string(),
        title: "Test Item".to_string(),
        item_type: "book".to_string(),
        attachments: vec![Attachment {
            key: "ATT001".to_string(),
            title: "test.pdf".to_string(),
            filename: "test.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            annotations,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn assemble_org(item: &ItemAnnotations, citation_key: Option<&str>) -> String {
    assemble_item(
        item,
        &Library::Personal,
        citation_key,
        &ChapterMaps::new(),
        Syntax::Org,
    )
}

fn assemble_md(item: &ItemAnnotations, citation_key: Option<&str>) -> String {
    assemble_item(
        item,
        &Library::Personal,
        citation_key,
        &ChapterMaps::new(),
        Syntax::Markdown,
    )
}

#[test]
fn org_error_response() {
    let item = ItemAnnotations::error("GONE", "Item not found");
    assert!(assemble_org(&item, None).contains("# Error: Item not found"));
}

#[test]
fn org_basic_structure() {
    let result = assemble_org(&single_highlight_item(), None);
    assert!(result.starts_with("* Test Item"));
    assert!(result.contains(":PROPERTIES:"));
    assert!(result.contains(":ITEM_TYPE: journalArticle"));
    assert!(result.contains(":ZOTERO_KEY: ABC123"));
    assert!(result.contains(":END:"));
}

#[test]
fn org_custom_id_only_with_citation_key() {
    let with_key = assemble_org(&single_highlight_item(), Some("smith2023"));
    assert!(with_key.contains(":CUSTOM_ID: smith2023"));

    let without = assemble_org(&single_highlight_item(), None);
    assert!(!without.contains(":CUSTOM_ID:"));
}

#[test]
fn org_per_annotation_quote_blocks() {
    let result = assemble_org(&multi_annotation_item(), None);
    assert!(result.matches("#+begin_quote").count() >= 2);
}

#[test]
fn org_annotations_sorted_by_sort_index() {
    let result = assemble_org(&multi_annotation_item(), None);
    let early = result.find("Early text on page 5").unwrap();
    let later = result.find("Later text on page 20").unwrap();
    assert!(early < later, "annotations should be in reading order");
}

#[test]
fn org_zotero_open_pdf_links() {
    let result = assemble_org(&single_highlight_item(), None);
    assert!(result.contains("zotero://open-pdf/library/items/ATT001"));
    assert!(result.contains("page=5"));
    assert!(result.contains("annotation=ANN001"));
}

#[test]
fn org_comment_interleaved_with_highlight() {
    let result = assemble_org(&multi_annotation_item(), None);
    let text = result.find("Later text on page 20").unwrap();
    let comment = result.find("A comment on this").unwrap();
    assert!(comment > text, "comment should follow its highlight");
}

#[test]
fn org_note_uses_comment_block() {
    let result = assemble_org(&multi_annotation_item(), None);
    assert!(result.contains("#+begin_comment"));
    assert!(result.contains("This is a standalone note"));
    assert!(result.contains("#+end_comment"));
}

#[test]
fn org_image_uses_example_block() {
    let result = assemble_org(&multi_annotation_item(), None);
    assert!(result.contains("#+begin_example"));
    assert!(result.contains("[Image annotation, Page 8]"));
    assert!(result.contains("#+end_example"));
    assert!(result.contains("Figure 1: Architecture diagram"));
}

#[test]
fn org_tags() {
    let result = assemble_org(&multi_annotation_item(), None);
    assert!(result.contains(":important:"));
    assert!(result.contains(":follow-up:"));
    assert!(result.contains(":figure:"));
}

#[test]
fn org_citation_outside_quote_block() {
    let result = assemble_org(&single_highlight_item(), Some("smith2023"));
    let end_quote = result.find("#+end_quote").unwrap();
    let cite = result.find("[cite:@smith2023, p.5]").unwrap();
    assert!(cite > end_quote);
}

#[test]
fn org_no_citation_without_key() {
    let result = assemble_org(&single_highlight_item(), None);
    assert!(!result.contains("[cite:@"));
}

#[test]
fn org_empty_attachment_list_still_renders_header() {
    let item = ItemAnnotations {
        key: "ABC123".to_string(),
        title: "Test Item".to_string(),
        item_type: "journalArticle".to_string(),
        ..Default::default()
    };
    let result = assemble_org(&item, None);
    assert!(result.contains("* Test Item"));
    assert!(result.contains(":ZOTERO_KEY: ABC123"));
}

#[test]
fn org_attachment_without_annotations_notice() {
    let mut item = single_highlight_item();
    item.attachments[0].annotations.clear();
    let result = assemble_org(&item, None);
    assert!(result.contains("No annotations found."));
}

#[test]
fn org_single_attachment_has_no_attachment_heading() {
    let result = assemble_org(&single_highlight_item(), None);
    assert!(!result.contains("** test.pdf"));
}

#[test]
fn org_multi_attachment_has_attachment_headings() {
    let mut item = single_highlight_item();
    item.attachments.push(Attachment {
        key: "ATT002".to_string(),
        title: "part2.pdf".to_string(),
        filename: "part2.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        ..Default::default()
    });
    let result = assemble_org(&item, None);
    assert!(result.contains("** test.pdf"));
    assert!(result.contains("** part2.pdf"));
}

#[test]
fn md_error_response() {
    let item = ItemAnnotations::error("GONE", "Item not found");
    assert!(assemble_md(&item, None).contains("# Error: Item not found"));
}

#[test]
fn md_basic_structure() {
    let result = assemble_md(&single_highlight_item(), None);
    assert!(result.starts_with("# Test Item"));
    assert!(result.contains("**Item Type:** journalArticle"));
    assert!(result.contains("**Zotero Key:** ABC123"));
}

#[test]
fn md_citation_key_in_header() {
    let result = assemble_md(&single_highlight_item(), Some("smith2023"));
    assert!(result.contains("**Citation Key:** smith2023"));
}

#[test]
fn md_per_annotation_blockquotes() {
    let result = assemble_md(&multi_annotation_item(), None);
    assert!(result.matches("> ").count() >= 2);
}

#[test]
fn md_sorted_and_linked() {
    let result = assemble_md(&multi_annotation_item(), None);
    let early = result.find("Early text on page 5").unwrap();
    let later = result.find("Later text on page 20").unwrap();
    assert!(early < later);
    assert!(result.contains("zotero://open-pdf/library/items/ATT001"));
}

#[test]
fn md_note_rendered_italic() {
    let result = assemble_md(&multi_annotation_item(), None);
    assert!(result.contains("*This is a standalone note*"));
}

#[test]
fn md_image_placeholder_emphasized() {
    let result = assemble_md(&multi_annotation_item(), None);
    assert!(result.contains("*[Image annotation, Page 8]*"));
}

#[test]
fn md_hashtag_tags() {
    let result = assemble_md(&multi_annotation_item(), None);
    assert!(result.contains("#important"));
    assert!(result.contains("#follow-up"));
}

#[test]
fn md_citation_marker() {
    let result = assemble_md(&single_highlight_item(), Some("smith2023"));
    assert!(result.contains("[cite:@smith2023, p.5]"));
}

#[test]
fn chapter_headings_group_annotations() {
    let mut item = multi_annotation_item();
    item.attachments[0].annotations.push(
        annotation("ANN_P25", AnnotationKind::Highlight)
            .with_text("Methods discussion")
            .with_page_label("25")
            .with_sort_index("00025|000500|00000"),
    );
    let mut maps = ChapterMaps::new();
    maps.insert(
        "ATT001".to_string(),
        vec![
            ChapterMapEntry::new("Introduction", "1", 1),
            ChapterMapEntry::new("Background", "5", 1),
            ChapterMapEntry::new("1.1 History", "6", 2),
            ChapterMapEntry::new("Methods", "20", 1),
        ],
    );
    let result = assemble_item(&item, &Library::Personal, None, &maps, Syntax::Org);

    assert!(result.contains("** Introduction"));
    assert!(result.contains("** Background"));
    assert!(result.contains("*** 1.1 History"));
    assert!(result.contains("** Methods"));
    // Page 20 and page 25 annotations share one Methods heading
    assert_eq!(result.matches("** Methods").count(), 1);
    // Headings appear in reading order
    let intro = result.find("** Introduction").unwrap();
    let background = result.find("** Background").unwrap();
    let methods = result.find("** Methods").unwrap();
    assert!(intro < background && background < methods);
}

#[test]
fn epub_annotations_resolve_chapters_via_sort_index() {
    let item = ItemAnnotations {
        key: "EPUB01".to_string(),
        title: "An EPUB Book".to_string(),
        item_type: "book".to_string(),
        attachments: vec![Attachment {
            key: "ATTEPUB".to_string(),
            title: "book.epub".to_string(),
            filename: "book.epub".to_string(),
            content_type: "application/epub+zip".to_string(),
            annotations: vec![
                annotation("E1", AnnotationKind::Highlight)
                    .with_text("text in chapter two")
                    .with_sort_index("00004|000120|00010"),
                annotation("E2", AnnotationKind::Highlight)
                    .with_text("text in chapter five")
                    .with_sort_index("00009|000300|00020"),
            ],
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut maps = ChapterMaps::new();
    maps.insert(
        "ATTEPUB".to_string(),
        vec![
            ChapterMapEntry::new("Chapter Two", "00003", 1),
            ChapterMapEntry::new("Chapter Five", "00008", 1),
        ],
    );
    let result = assemble_item(&item, &Library::Personal, None, &maps, Syntax::Org);

    assert!(result.contains("** Chapter Two"));
    assert!(result.contains("** Chapter Five"));
    let two = result.find("** Chapter Two").unwrap();
    let five = result.find("** Chapter Five").unwrap();
    assert!(two < five);
    // EPUB links carry no page parameter
    assert!(result.contains("zotero://open-epub/library/items/ATTEPUB?annotation=E1"));
    assert!(!result.contains("page="));
}

#[test]
fn group_library_links_in_assembled_document() {
    let result = assemble_item(
        &single_highlight_item(),
        &Library::Group(4512),
        None,
        &ChapterMaps::new(),
        Syntax::Org,
    );
    assert!(result.contains("zotero://open-pdf/groups/4512/items/ATT001"));
}

#[test]
fn collection_org_header() {
    let collection = CollectionAnnotations {
        key: "COL001".to_string(),
        name: "Reading List".to_string(),
        library_id: 1,
        total_items: 2,
        items: vec![multi_annotation_item()],
        ..Default::default()
    };
    let result = assemble_collection(&collection, &ChapterMaps::new(), Syntax::Org);
    assert!(result.contains("* Collection: Reading List"));
    assert!(result.contains(":COLLECTION_ID: COL001"));
    assert!(result.contains(":TOTAL_ITEMS: 2"));
    assert!(result.contains(":ITEMS_WITH_ANNOTATIONS: 1"));
    // Item and its annotations demoted under the collection heading
    assert!(result.contains("** Test Item"));
    assert!(result.contains("#+begin_quote"));
}

#[test]
fn collection_markdown_header() {
    let collection = CollectionAnnotations {
        key: "COL001".to_string(),
        name: "Reading List".to_string(),
        library_id: 1,
        total_items: 2,
        items: vec![single_highlight_item()],
        ..Default::default()
    };
    let result = assemble_collection(&collection, &ChapterMaps::new(), Syntax::Markdown);
    assert!(result.contains("# Collection: Reading List"));
    assert!(result.contains("**Collection ID:** COL001"));
    assert!(result.contains("**Total Items:** 2"));
    assert!(result.contains("**Items with Annotations:** 1"));
    assert!(result.contains("## Test Item"));
}

#[test]
fn collection_empty_notice() {
    let collection = CollectionAnnotations {
        key: "COL001".to_string(),
        name: "Empty Collection".to_string(),
        library_id: 1,
        ..Default::default()
    };
    let org = assemble_collection(&collection, &ChapterMaps::new(), Syntax::Org);
    assert!(org.contains("No items with annotations found"));
    let md = assemble_collection(&collection, &ChapterMaps::new(), Syntax::Markdown);
    assert!(md.contains("No items with annotations found"));
}

#[test]
fn collection_error_response() {
    let collection = CollectionAnnotations::error("COL404", "Collection not found");
    let result = assemble_collection(&collection, &ChapterMaps::new(), Syntax::Org);
    assert!(result.contains("# Error: Collection not found"));
}

#[test]
fn listing_uses_simple_blocks() {
    let item = multi_annotation_item();
    let result = render_annotation_listing(&item, &Library::Personal, None, Syntax::Markdown);
    // Simple path: backticked placeholder and a Tags: line
    assert!(result.contains("`[Image annotation, Page 8]`"));
    assert!(result.contains("Tags: `important`"));
    // No item header, no hashtags
    assert!(!result.contains("# Test Item"));
    assert!(!result.contains("#important"));
}
