use std::fmt;

/// Every operation the embedded runtime exposes to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Focus,
    Blur,
    SetHtml,
    InsertHtml,
    SurroundSelection,
    SurroundSelectionTag,
    ToggleSelectionTag,
    SetPlaceholder,
    InjectCss,
}

impl CommandName {
    pub const ALL: [CommandName; 9] = [
        CommandName::Focus,
        CommandName::Blur,
        CommandName::SetHtml,
        CommandName::InsertHtml,
        CommandName::SurroundSelection,
        CommandName::SurroundSelectionTag,
        CommandName::ToggleSelectionTag,
        CommandName::SetPlaceholder,
        CommandName::InjectCss,
    ];

    /// The function name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandName::Focus => "focus",
            CommandName::Blur => "blur",
            CommandName::SetHtml => "setHtml",
            CommandName::InsertHtml => "insertHtml",
            CommandName::SurroundSelection => "surroundSelection",
            CommandName::SurroundSelectionTag => "surroundSelectionTag",
            CommandName::ToggleSelectionTag => "toggleSelectionTag",
            CommandName::SetPlaceholder => "setPlaceholder",
            CommandName::InjectCss => "injectCss",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Number of arguments the command takes.
    pub fn arity(self) -> usize {
        match self {
            CommandName::Focus | CommandName::Blur => 0,
            CommandName::SurroundSelection => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-way instruction for the embedded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: CommandName,
    pub args: Vec<Option<String>>,
}

impl Command {
    pub fn new(name: CommandName, args: Vec<Option<String>>) -> Self {
        Self { name, args }
    }

    pub fn focus() -> Self {
        Self::new(CommandName::Focus, Vec::new())
    }

    pub fn blur() -> Self {
        Self::new(CommandName::Blur, Vec::new())
    }

    pub fn set_html(html: Option<&str>) -> Self {
        Self::new(CommandName::SetHtml, vec![html.map(str::to_owned)])
    }

    pub fn insert_html(html: &str) -> Self {
        Self::new(CommandName::InsertHtml, vec![Some(html.to_owned())])
    }

    pub fn surround_selection(before: &str, after: &str) -> Self {
        Self::new(
            CommandName::SurroundSelection,
            vec![Some(before.to_owned()), Some(after.to_owned())],
        )
    }

    pub fn surround_selection_tag(tag_name: &str) -> Self {
        Self::new(CommandName::SurroundSelectionTag, vec![Some(tag_name.to_owned())])
    }

    pub fn toggle_selection_tag(tag_name: &str) -> Self {
        Self::new(CommandName::ToggleSelectionTag, vec![Some(tag_name.to_owned())])
    }

    pub fn set_placeholder(text: &str) -> Self {
        Self::new(CommandName::SetPlaceholder, vec![Some(text.to_owned())])
    }

    pub fn inject_css(css: &str) -> Self {
        Self::new(CommandName::InjectCss, vec![Some(css.to_owned())])
    }

    /// Argument `index`, or `None` when absent or null.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(|a| a.as_deref())
    }
}

/// A one-way notification from the embedded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    DocumentHeight { height: u32 },
    ContentChange { html: String },
}

impl EditorEvent {
    /// Serialized message as posted to the host:
    /// `{"event":"documentHeight","documentHeight":42}` or
    /// `{"event":"contentChange","contentChange":"<p>..</p>"}`.
    pub fn to_message(&self) -> String {
        match self {
            EditorEvent::DocumentHeight { height } => serde_json::json!({
                "event": "documentHeight",
                "documentHeight": height,
            })
            .to_string(),
            EditorEvent::ContentChange { html } => serde_json::json!({
                "event": "contentChange",
                "contentChange": html,
            })
            .to_string(),
        }
    }
}
