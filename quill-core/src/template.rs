//! The hypertext document a surface loads before any command is injected.

/// `id` of the editable root.
pub const EDITOR_ID: &str = "editor";

pub const DEFAULT_PLACEHOLDER: &str = "Type something...";

const BASE_STYLES: &str = r#"
  body {
    margin: 0;
    padding: 0;
  }
  #editor {
    border: 0px solid #ccc;
    cursor: text;
    padding: 2px;
    outline: none;
    min-height: 20px;
    box-sizing: border-box;
  }
  #editor p {
    margin: 0;
    padding: 0;
  }
  #editor .mention {
    color: blue;
  }
  div[contenteditable="true"]:empty:before {
    content: attr(placeholder);
    color: #555;
    opacity: 0.5;
  }
  div[contenteditable="true"]:empty:focus:before {
    content: "";
  }
"#;

/// Inputs for [`render_document`].
#[derive(Debug, Clone, Default)]
pub struct DocumentTemplate<'a> {
    /// Initial content of the editable root, inserted verbatim.
    pub content: &'a str,
    pub bg_color: Option<&'a str>,
    /// Appended after the base styles, so it wins on equal specificity.
    pub custom_styles: Option<&'a str>,
}

/// Build the initial document.
///
/// The content is spliced in as-is rather than substituted into a
/// placeholder token, so content that itself contains such a token is left
/// alone.
pub fn render_document(template: &DocumentTemplate<'_>) -> String {
    let mut doc = String::with_capacity(1024 + template.content.len());
    doc.push_str("<!DOCTYPE html><html><head>");
    doc.push_str(r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#);
    doc.push_str("<style>");
    doc.push_str(BASE_STYLES);
    doc.push_str("</style>");

    if let Some(color) = template.bg_color {
        doc.push_str("<style>body, #editor { background-color: ");
        doc.push_str(color);
        doc.push_str("; }</style>");
    }
    if let Some(styles) = template.custom_styles {
        doc.push_str("<style>");
        doc.push_str(styles);
        doc.push_str("</style>");
    }

    doc.push_str("</head><body>");
    doc.push_str(&format!(
        r#"<div id="{EDITOR_ID}" contenteditable="true" placeholder="{DEFAULT_PLACEHOLDER}">"#
    ));
    doc.push_str(template.content);
    doc.push_str("</div></body></html>");
    doc
}
