//! The page a controller is installed on.

use crate::events::ReadyState;
use jfe_core::EnlargeError;
use jfe_core::EnlargeResult;
use jfe_dom::Document;
use jfe_dom::NodeId;
use jfe_html::HtmlParser;
use jfe_style::StyleResolver;
use url::Url;

/// Which part of the site a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Lesson,
    Review,
    Other,
}

/// Parsed page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    parsed: Url,
    host: String,
}

impl PageLocation {
    pub fn parse(input: &str) -> EnlargeResult<Self> {
        let parsed = Url::parse(input).map_err(|error| EnlargeError::InvalidUrl {
            input: input.to_owned(),
            reason: error.to_string(),
        })?;

        let host = parsed
            .host_str()
            .ok_or_else(|| EnlargeError::InvalidUrl {
                input: input.to_owned(),
                reason: "URL must include a host".to_owned(),
            })?
            .to_ascii_lowercase();

        Ok(Self { parsed, host })
    }

    pub fn as_str(&self) -> &str {
        self.parsed.as_str()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        self.parsed.path()
    }

    pub fn is_lesson(&self) -> bool {
        self.path().contains("/lesson")
    }

    pub fn is_review(&self) -> bool {
        self.path().contains("/review")
    }

    pub fn kind(&self) -> PageKind {
        if self.is_lesson() {
            PageKind::Lesson
        } else if self.is_review() {
            PageKind::Review
        } else {
            PageKind::Other
        }
    }
}

/// Host page state: the live tree, its author styles, where it was loaded
/// from and how far loading got.
#[derive(Debug, Clone)]
pub struct Page {
    pub document: Document,
    pub styles: StyleResolver,
    pub location: PageLocation,
    pub ready_state: ReadyState,
}

impl Page {
    pub fn new(document: Document, styles: StyleResolver, location: PageLocation) -> Self {
        Self {
            document,
            styles,
            location,
            ready_state: ReadyState::Loading,
        }
    }

    /// Builds a page from its URL, markup and author stylesheet.
    pub fn from_markup(url: &str, html: &str, css: &str) -> EnlargeResult<Self> {
        let location = PageLocation::parse(url)?;
        let document = HtmlParser.parse(html)?;
        Ok(Self::new(document, StyleResolver::from_css(css), location))
    }

    pub fn with_ready_state(mut self, ready_state: ReadyState) -> Self {
        self.ready_state = ready_state;
        self
    }

    /// Where every pass starts: `<body>`, or the document root when the page
    /// has none.
    pub fn enlarge_root(&self) -> NodeId {
        self.document.body().unwrap_or_else(|| self.document.root())
    }
}
