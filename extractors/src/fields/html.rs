use scraper::{ElementRef, Html, Node};

const SKIPPED: &[&str] = &["head", "style", "script", "title"];
const BLOCKS: &[&str] = &[
    "p", "div", "br", "tr", "li", "table", "h1", "h2", "h3", "h4", "h5", "h6",
];

pub fn is_html(body: &str) -> bool {
    body.to_lowercase().contains("<html")
}

/// Renders an HTML email as plain text. Bold runs come out as `*text*`,
/// block elements end a line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    render(document.root_element(), &mut out);

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(element: ElementRef, out: &mut String) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }

    if matches!(name, "b" | "strong") {
        let mut inner = String::new();
        render_children(element, &mut inner);
        let inner = inner.trim();
        if !inner.is_empty() {
            push_text(out, &format!("*{}*", inner));
        }
    } else {
        render_children(element, out);
    }

    if BLOCKS.contains(&name) {
        out.push('\n');
    }
}

fn render_children(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    push_text(out, &collapsed);
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    render(child_element, out);
                }
            }
            _ => {}
        }
    }
}

fn push_text(out: &mut String, text: &str) {
    if out.chars().last().is_some_and(|c| !c.is_whitespace()) {
        out.push(' ');
    }
    out.push_str(text);
}
