pub mod selector;
pub mod svg;

#[cfg(test)]
mod tests;

use scraper::{ElementRef, Html};

/// A parsed analytics snapshot.
///
/// Built once per input file and only read during extraction.
pub struct Page {
    /// Identifier of the source document (its file name)
    id: String,
    markup: String,
    document: Html,
}

impl Page {
    /// Parses raw HTML markup into a page
    pub fn parse(id: impl Into<String>, markup: &str) -> Self {
        let document = Html::parse_document(markup);
        let id = id.into();

        ::log::trace!("Parsed {} ({} bytes)", id, markup.len());
        if !document.errors.is_empty() {
            ::log::debug!("{}: {} HTML parse warnings", id, document.errors.len());
        }

        Self {
            id,
            markup: markup.to_string(),
            document,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source HTML the page was parsed from
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Root element every document-wide query starts from
    pub fn root(&self) -> ElementRef<'_> {
        self.document.root_element()
    }
}
