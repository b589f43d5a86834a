//! Minimal extraction helpers for SES query API XML responses.
//!
//! SES responses are shallow and well formed, so values are located by
//! their element names rather than through a full XML parser.

/// Returns the text of the first `<tag>` element, unescaped.
pub fn xml_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)?;
    Some(unescape(xml[start..start + end].trim()))
}

/// Returns the text of every `<tag>` element in document order.
pub fn xml_text_all(xml: &str, tag: &str) -> Vec<String> {
    xml_blocks(xml, tag)
        .into_iter()
        .filter_map(|block| xml_text(block, tag))
        .collect()
}

/// Returns every `<tag>...</tag>` block, tags included.
///
/// Blocks of the same name are assumed not to nest, which holds for the
/// `member` lists SES returns.
pub fn xml_blocks<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut blocks = Vec::new();
    let mut from = 0;
    while let Some(start) = xml[from..].find(&open) {
        let start = from + start;
        match xml[start..].find(&close) {
            Some(end) => {
                let end = start + end + close.len();
                blocks.push(&xml[start..end]);
                from = end;
            }
            None => break,
        }
    }
    blocks
}

/// Returns the first `<tag>...</tag>` block, tags included.
pub fn xml_block<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    xml_blocks(xml, tag).into_iter().next()
}

/// Replaces the five predefined XML entities.
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
