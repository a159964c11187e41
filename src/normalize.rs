//! Markup clean-up that runs before tokenizing.

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// Collapses every whitespace run that contains a line break into a single space, drops a
/// lone whitespace character sitting between two tags, and trims the result.
///
/// Whitespace runs without a line break are kept as-is so inline spacing survives.
pub fn collapse_whitespace(html: &str) -> String {
    let mut joined = String::with_capacity(html.len());
    let mut pending = String::new();
    for ch in html.chars() {
        if ch.is_whitespace() {
            pending.push(ch);
            continue;
        }
        flush_pending(&mut joined, &mut pending);
        joined.push(ch);
    }
    flush_pending(&mut joined, &mut pending);

    let chars: Vec<char> = joined.chars().collect();
    let mut out = String::with_capacity(joined.len());
    for (i, &ch) in chars.iter().enumerate() {
        let between_tags = ch.is_whitespace()
            && i > 0
            && chars[i - 1] == '>'
            && chars.get(i + 1) == Some(&'<');
        if !between_tags {
            out.push(ch);
        }
    }
    out.trim().to_string()
}

fn flush_pending(out: &mut String, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    if pending.contains('\n') {
        out.push(' ');
    } else {
        out.push_str(pending);
    }
    pending.clear();
}

/// Best-effort structural repair: runs the markup through the html5ever tree builder and
/// serializes the body back out. Unclosed tags get closed, stray end tags disappear.
pub fn repair_markup(html: &str) -> String {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let root = find_body(&dom.document).unwrap_or_else(|| dom.document.clone());

    let handle: SerializableHandle = root.into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    let mut out: Vec<u8> = Vec::new();
    if let Err(err) = serialize(&mut out, &handle, opts) {
        log::warn!("markup repair failed, using input as-is: {err}");
        return html.to_string();
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn find_body(node: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &node.data {
        if name.local.to_string().eq_ignore_ascii_case("body") {
            return Some(node.clone());
        }
    }
    for child in node.children.borrow().iter() {
        if let Some(body) = find_body(child) {
            return Some(body);
        }
    }
    None
}
