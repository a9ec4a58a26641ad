//! Renders a markdown-ish plain-text approximation of an HTML document's
//! body by walking headings, paragraphs, and list items in document order.
//! This is not a full markdown converter — it is enough signal for the
//! research agent's extraction prompt.

use scraper::{Html, Selector};

#[must_use]
pub fn render_markdown(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("h1, h2, h3, h4, p, li") else {
        return String::new();
    };

    let mut lines = Vec::new();
    for element in document.select(&selector) {
        let text: String = element.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }

        let prefix = match element.value().name() {
            "h1" => "# ",
            "h2" => "## ",
            "h3" => "### ",
            "h4" => "#### ",
            "li" => "- ",
            _ => "",
        };
        lines.push(format!("{prefix}{text}"));
    }

    lines.join("\n")
}
