//! Tree form of a well-formed token run.
//!
//! `arborize` and `flatten` are exact inverses for well-formed input
//! (round-trip law: `flatten(arborize(x)) == x`); both use explicit stacks
//! so nesting depth never consumes call stack.

use crate::token::{AttrList, Token};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element {
        name: String,
        attrs: AttrList,
        line: u32,
        /// Line of the matching end tag; preserved so flattening restores
        /// the original token run exactly.
        close_line: u32,
        children: Vec<Node>,
    },
    Empty {
        name: String,
        attrs: AttrList,
        line: u32,
    },
    Text {
        text: String,
        line: u32,
    },
    Comment {
        text: String,
        line: u32,
    },
}

impl Node {
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } | Node::Empty { name, .. } => Some(name.as_str()),
            Node::Text { .. } | Node::Comment { .. } => None,
        }
    }

    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Node::Text { text, .. } if text.bytes().all(|b| b.is_ascii_whitespace()))
    }
}

struct OpenFrame {
    name: String,
    attrs: AttrList,
    line: u32,
    children: Vec<Node>,
}

/// Build a node forest from a well-formed token run.
///
/// Defensive on malformed input (never panics): a mismatched end tag closes
/// the innermost open element, unclosed elements close at stream end. The
/// well-formedness pass upstream guarantees neither case occurs in the
/// pipeline.
pub fn arborize(tokens: Vec<Token>) -> Vec<Node> {
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<OpenFrame> = Vec::new();

    fn attach(stack: &mut [OpenFrame], roots: &mut Vec<Node>, node: Node) {
        match stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => roots.push(node),
        }
    }

    for token in tokens {
        match token {
            Token::Start { name, attrs, line } => {
                stack.push(OpenFrame {
                    name,
                    attrs,
                    line,
                    children: Vec::new(),
                });
            }
            Token::End { name, line } => {
                let Some(frame) = stack.pop() else {
                    continue;
                };
                debug_assert_eq!(frame.name, name, "arborize saw a mismatched end tag");
                let node = Node::Element {
                    name: frame.name,
                    attrs: frame.attrs,
                    line: frame.line,
                    close_line: line,
                    children: frame.children,
                };
                attach(&mut stack, &mut roots, node);
            }
            Token::Empty { name, attrs, line } => {
                attach(&mut stack, &mut roots, Node::Empty { name, attrs, line });
            }
            Token::Text { text, line } => {
                attach(&mut stack, &mut roots, Node::Text { text, line });
            }
            Token::Comment { text, line } => {
                attach(&mut stack, &mut roots, Node::Comment { text, line });
            }
        }
    }

    while let Some(frame) = stack.pop() {
        let close_line = frame.line;
        let node = Node::Element {
            name: frame.name,
            attrs: frame.attrs,
            line: frame.line,
            close_line,
            children: frame.children,
        };
        attach(&mut stack, &mut roots, node);
    }

    roots
}

enum FlattenWork {
    Visit(Node),
    Close(String, u32),
}

/// Flatten a node forest back into tokens (iterative pre-order).
pub fn flatten(nodes: Vec<Node>) -> Vec<Token> {
    let mut out = Vec::new();
    let mut stack: Vec<FlattenWork> = Vec::new();
    for node in nodes.into_iter().rev() {
        stack.push(FlattenWork::Visit(node));
    }

    while let Some(work) = stack.pop() {
        match work {
            FlattenWork::Visit(Node::Element {
                name,
                attrs,
                line,
                close_line,
                children,
            }) => {
                out.push(Token::Start {
                    name: name.clone(),
                    attrs,
                    line,
                });
                stack.push(FlattenWork::Close(name, close_line));
                for child in children.into_iter().rev() {
                    stack.push(FlattenWork::Visit(child));
                }
            }
            FlattenWork::Visit(Node::Empty { name, attrs, line }) => {
                out.push(Token::Empty { name, attrs, line });
            }
            FlattenWork::Visit(Node::Text { text, line }) => {
                out.push(Token::Text { text, line });
            }
            FlattenWork::Visit(Node::Comment { text, line }) => {
                out.push(Token::Comment { text, line });
            }
            FlattenWork::Close(name, line) => {
                out.push(Token::End { name, line });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{Node, arborize, flatten};
    use crate::lexer::lex;
    use crate::token::Token;

    #[test]
    fn round_trip_restores_the_exact_token_run() {
        let tokens = lex("<div><p>a<b>c</b></p><hr /><p>d</p></div>tail");
        let round_tripped = flatten(arborize(tokens.clone()));
        assert_eq!(round_tripped, tokens);
    }

    #[test]
    fn round_trip_preserves_line_numbers() {
        let tokens = lex("<div>\n<p>x\n</p>\n</div>");
        let round_tripped = flatten(arborize(tokens.clone()));
        assert_eq!(round_tripped, tokens);
    }

    #[test]
    fn arborize_builds_nested_structure() {
        let nodes = arborize(lex("<div><p>x</p></div>"));
        assert!(
            matches!(
                nodes.as_slice(),
                [Node::Element { name, children, .. }]
                    if name == "div"
                        && matches!(
                            children.as_slice(),
                            [Node::Element { name: p, children: inner, .. }]
                                if p == "p" && matches!(inner.as_slice(), [Node::Text { text, .. }] if text == "x")
                        )
            ),
            "unexpected forest: {nodes:?}"
        );
    }

    #[test]
    fn arborize_closes_unclosed_elements_at_stream_end() {
        let nodes = arborize(vec![
            Token::start("div", Default::default(), 1),
            Token::text("x", 1),
        ]);
        assert!(
            matches!(
                nodes.as_slice(),
                [Node::Element { name, children, .. }]
                    if name == "div" && children.len() == 1
            ),
            "unexpected forest: {nodes:?}"
        );
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 50_000;
        let mut tokens = Vec::with_capacity(depth * 2);
        for _ in 0..depth {
            tokens.push(Token::start("div", Default::default(), 1));
        }
        for _ in 0..depth {
            tokens.push(Token::end("div", 1));
        }
        let nodes = arborize(tokens.clone());
        assert_eq!(nodes.len(), 1);
        let round_tripped = flatten(nodes);
        assert_eq!(round_tripped.len(), tokens.len());
    }
}
