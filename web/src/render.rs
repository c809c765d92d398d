use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::{markdown_to_html, Options};

const ALLOWED_TAGS: [&str; 32] = [
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "b", "strong", "i", "em", "u", "s", "del",
    "ins", "a", "ul", "ol", "li", "blockquote", "code", "pre", "table", "thead", "tbody", "tr",
    "th", "td", "div", "span",
];

/// Digest markdown to HTML that is safe to embed in a page.
pub struct MarkdownRenderer {
    options: Options<'static>,
    sanitizer: AmmoniaBuilder<'static>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            options: markdown_options(),
            sanitizer: sanitizer(),
        }
    }

    pub fn render(&self, markdown: &str) -> String {
        let html = markdown_to_html(markdown, &self.options);
        self.sanitizer.clean(&html).to_string()
    }
}

fn markdown_options() -> Options<'static> {
    let mut options = Options::default();
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;

    options.render.hardbreaks = true;
    options
}

fn sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();
    builder.tags(HashSet::from(ALLOWED_TAGS));
    builder.generic_attributes(HashSet::from(["class"]));
    builder.add_tag_attributes("a", &["href", "title"]);
    builder.link_rel(Some("noopener noreferrer"));
    builder.set_tag_attribute_value("a", "target", "_blank");
    builder.add_url_schemes(["http", "https", "mailto"].iter().copied());
    builder
}
