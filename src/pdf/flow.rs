use pdf_writer::Content;

use crate::config::RenderConfig;

/// Vertical write position over a growing list of pages.
///
/// `y` is in PDF user space (origin bottom-left), so it decreases as content is
/// added. A block is never split: callers ask for its full height with
/// [`PageFlow::ensure_space`] before drawing any of it.
pub(crate) struct PageFlow {
    closed: Vec<Content>,
    current: Content,
    top: f32,
    bottom: f32,
    y: f32,
}

/// A position on an already emitted page that a later pass writes to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Anchor {
    pub(crate) page: usize, // 1-based
    pub(crate) y: f32,
}

impl PageFlow {
    pub(crate) fn new(config: &RenderConfig) -> Self {
        let top = config.content_top();
        Self {
            closed: Vec::new(),
            current: Content::new(),
            top,
            bottom: config.margin_bottom,
            y: top,
        }
    }

    /// Logical number of the page being written, starting at 1.
    pub(crate) fn page_number(&self) -> usize {
        self.closed.len() + 1
    }

    pub(crate) fn y(&self) -> f32 {
        self.y
    }

    pub(crate) fn top(&self) -> f32 {
        self.top
    }

    pub(crate) fn remaining(&self) -> f32 {
        self.y - self.bottom
    }

    pub(crate) fn at_page_top(&self) -> bool {
        (self.y - self.top()).abs() < 0.5
    }

    pub(crate) fn content(&mut self) -> &mut Content {
        &mut self.current
    }

    pub(crate) fn anchor(&self) -> Anchor {
        Anchor {
            page: self.page_number(),
            y: self.y,
        }
    }

    /// Make room for a block of `height`, opening a new page when the current
    /// one cannot hold it. A block taller than a whole page is drawn from the
    /// top of a fresh page and overflows. Returns whether a page was opened.
    pub(crate) fn ensure_space(&mut self, height: f32) -> bool {
        if self.at_page_top() || self.remaining() >= height {
            return false;
        }
        self.break_page();
        true
    }

    pub(crate) fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    pub(crate) fn break_page(&mut self) {
        self.closed
            .push(std::mem::replace(&mut self.current, Content::new()));
        self.y = self.top;
        log::debug!("page break → page {}", self.page_number());
    }

    /// End the forward pass. The returned pages can be revisited by number.
    pub(crate) fn close(mut self) -> ClosedPages {
        self.closed.push(self.current);
        ClosedPages { pages: self.closed }
    }
}

/// Every page of a finished forward pass, addressable by logical number.
pub(crate) struct ClosedPages {
    pages: Vec<Content>,
}

impl ClosedPages {
    pub(crate) fn total(&self) -> usize {
        self.pages.len()
    }

    /// Re-enter a closed page. Content appended here lands on top of what the
    /// forward pass drew.
    pub(crate) fn page_mut(&mut self, number: usize) -> Option<&mut Content> {
        number.checked_sub(1).and_then(|i| self.pages.get_mut(i))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Content)> {
        self.pages
            .iter_mut()
            .enumerate()
            .map(|(i, c)| (i + 1, c))
    }

    pub(crate) fn into_contents(self) -> Vec<Content> {
        self.pages
    }
}
