//! The closed set of note kinds the server knows about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a note, as sent in the `type` field of a note row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteType {
    Text,
    Code,
    File,
    Image,
    Search,
    Book,
    RelationMap,
    Render,
    NoteMap,
    Mermaid,
    Canvas,
    WebView,
    Launcher,
    Doc,
    ContentWidget,
    MindMap,
    AiChat,
    Markdown,
    ReadOnlyMarkdown,
}

impl NoteType {
    /// The wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Code => "code",
            Self::File => "file",
            Self::Image => "image",
            Self::Search => "search",
            Self::Book => "book",
            Self::RelationMap => "relationMap",
            Self::Render => "render",
            Self::NoteMap => "noteMap",
            Self::Mermaid => "mermaid",
            Self::Canvas => "canvas",
            Self::WebView => "webView",
            Self::Launcher => "launcher",
            Self::Doc => "doc",
            Self::ContentWidget => "contentWidget",
            Self::MindMap => "mindMap",
            Self::AiChat => "aiChat",
            Self::Markdown => "markdown",
            Self::ReadOnlyMarkdown => "readOnlyMarkdown",
        }
    }

    /// Default icon class for this kind.
    ///
    /// Text notes answer `bx bx-note` here; whether they render as a folder is
    /// decided by [`NoteRef::icon_class`](super::note::NoteRef::icon_class).
    pub fn default_icon(self) -> &'static str {
        match self {
            Self::Text => "bx bx-note",
            Self::File => "bx bx-file",
            Self::Image => "bx bx-image",
            Self::Code => "bx bx-code",
            Self::Render => "bx bx-extension",
            Self::Search => "bx bx-file-find",
            Self::RelationMap | Self::NoteMap => "bx bxs-network-chart",
            Self::Book => "bx bx-book",
            Self::Mermaid => "bx bx-selection",
            Self::Canvas => "bx bx-pen",
            Self::WebView => "bx bx-globe-alt",
            Self::Launcher => "bx bx-link",
            Self::Doc => "bx bxs-file-doc",
            Self::ContentWidget => "bx bxs-widget",
            Self::MindMap => "bx bx-sitemap",
            Self::AiChat => "bx bx-bot",
            Self::Markdown | Self::ReadOnlyMarkdown => "bx bxl-markdown",
        }
    }

    /// Whether notes of this kind can hold runnable script source, given a matching MIME type.
    pub fn can_hold_script(self) -> bool {
        matches!(self, Self::Code | Self::File | Self::Launcher)
    }

    /// Whether notes of this kind can hold renderable HTML, given a matching MIME type.
    pub fn can_hold_html(self) -> bool {
        matches!(self, Self::Code | Self::File | Self::Render)
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for note_type in [NoteType::RelationMap, NoteType::ReadOnlyMarkdown, NoteType::Search] {
            let json = serde_json::to_string(&note_type).unwrap();
            assert_eq!(json, format!("\"{}\"", note_type.as_str()));
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<NoteType>("\"spreadsheet\"").is_err());
    }
}
