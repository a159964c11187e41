//! Ordered parse events produced from markup by the html5ever tokenizer.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::{Cell, RefCell};

pub type Attrs = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start { name: String, attrs: Attrs },
    End { name: String },
    /// Void or self-closing element (`<br>`, `<img/>`).
    Empty { name: String, attrs: Attrs },
    Text(String),
}

impl Event {
    pub fn is_start(&self, tag: &str) -> bool {
        matches!(self, Event::Start { name, .. } if name == tag)
    }

    pub fn is_end(&self, tag: &str) -> bool {
        matches!(self, Event::End { name } if name == tag)
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr",
];

const DROPPED_CONTENT: &[&str] = &["script", "style", "title"];

pub fn attr_get<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[derive(Default)]
struct EventCollector {
    events: RefCell<Vec<Event>>,
    dropped_depth: Cell<u32>,
}

impl EventCollector {
    fn push_tag(&self, tag: Tag) {
        let name = tag.name.to_string();

        if DROPPED_CONTENT.contains(&name.as_str()) {
            let depth = self.dropped_depth.get();
            match tag.kind {
                TagKind::StartTag => self.dropped_depth.set(depth + 1),
                TagKind::EndTag => self.dropped_depth.set(depth.saturating_sub(1)),
            }
            return;
        }
        if self.dropped_depth.get() > 0 {
            return;
        }

        let attrs: Attrs = tag
            .attrs
            .iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect();
        let is_void = VOID_ELEMENTS.contains(&name.as_str());

        let event = match tag.kind {
            TagKind::StartTag if is_void || tag.self_closing => Event::Empty { name, attrs },
            TagKind::StartTag => Event::Start { name, attrs },
            // `</br>` and friends carry nothing.
            TagKind::EndTag if is_void => return,
            TagKind::EndTag => Event::End { name },
        };
        self.events.borrow_mut().push(event);
    }

    fn push_text(&self, text: &str) {
        if self.dropped_depth.get() > 0 || text.is_empty() {
            return;
        }
        let mut events = self.events.borrow_mut();
        if let Some(Event::Text(prev)) = events.last_mut() {
            prev.push_str(text);
        } else {
            events.push(Event::Text(text.to_string()));
        }
    }
}

impl TokenSink for EventCollector {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => self.push_tag(tag),
            Token::CharacterTokens(text) => self.push_text(&text),
            Token::ParseError(err) => log::trace!("tokenizer: {err}"),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Tokenizes `html` into the ordered event stream the dispatcher consumes. Comments,
/// doctypes and `script`, `style` and `title` bodies are dropped; character references are decoded.
pub fn tokenize(html: &str) -> Vec<Event> {
    let tokenizer = Tokenizer::new(EventCollector::default(), TokenizerOpts::default());
    let queue = BufferQueue::default();
    queue.push_back(StrTendril::from_slice(html));
    // Only a tree builder suspends the tokenizer on `<script>`; this sink never does, so
    // feeding always runs to completion.
    let _ = tokenizer.feed(&queue);
    tokenizer.end();
    tokenizer.sink.events.take()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str) -> Event {
        Event::Start {
            name: name.to_string(),
            attrs: Vec::new(),
        }
    }

    fn end(name: &str) -> Event {
        Event::End {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_basic_stream() {
        let events = tokenize("<p>Hi <b>there</b></p>");
        assert_eq!(
            events,
            vec![
                start("p"),
                Event::Text("Hi ".to_string()),
                start("b"),
                Event::Text("there".to_string()),
                end("b"),
                end("p"),
            ]
        );
    }

    #[test]
    fn test_void_elements_are_empty_events() {
        let events = tokenize("a<br>b<img src=\"x.png\"/>");
        assert_eq!(events[1], Event::Empty { name: "br".to_string(), attrs: vec![] });
        match &events[3] {
            Event::Empty { name, attrs } => {
                assert_eq!(name, "img");
                assert_eq!(attr_get(attrs, "SRC"), Some("x.png"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_entities_decoded_and_text_merged() {
        let events = tokenize("<p>a &amp; b&lt;c</p>");
        assert_eq!(events[1], Event::Text("a & b<c".to_string()));
    }

    #[test]
    fn test_script_and_comments_dropped() {
        let events = tokenize("<p>x<!-- note --><script>var a = 1;</script>y</p>");
        assert_eq!(
            events,
            vec![start("p"), Event::Text("xy".to_string()), end("p")]
        );
    }
}
