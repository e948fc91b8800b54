//! Cycle-safe structural rendering of object graphs
//!
//! References are rendered as the object they point to, so the output
//! shows the reachable structure rather than the `n g R` handles. A
//! reference back onto the current path renders as `<circular reference>`
//! and the walk continues with the next sibling.
//!
//! The result carries a `pure` flag. It is true when the text is a
//! faithful rendering of the graph and false as soon as any part had to
//! be summarized: stream payloads, inline images, circular, dangling or
//! foreign references, page tree back-links and the nesting limit.

use crate::document::Document;
use crate::error::Result;
use crate::objects::{Array, Dictionary, IndirectRef, Object, ObjectId};
use crate::pages::is_pages_node;
use crate::traversal::TraversalContext;

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedObject {
    pub text: String,
    pub pure: bool,
}

/// Render `object`, resolving references against `document`.
pub fn format(document: &Document, object: &Object) -> Result<FormattedObject> {
    document.ensure_open()?;
    let mut formatter = Formatter {
        document,
        context: TraversalContext::new(),
        pure: true,
    };
    let mut text = String::new();
    formatter.write_object(object, None, 0, &mut text);
    Ok(FormattedObject {
        text,
        pure: formatter.pure,
    })
}

struct Formatter<'a> {
    document: &'a Document,
    context: TraversalContext<ObjectId>,
    pure: bool,
}

/// Outcome of following a reference.
enum Followed<'a> {
    Target(&'a Object),
    Cycle,
    Dangling,
    Foreign,
}

impl<'a> Formatter<'a> {
    fn write_object(&mut self, object: &Object, key: Option<&str>, level: usize, out: &mut String) {
        if self.context.enter().is_err() {
            self.pure = false;
            out.push_str("<nesting limit reached>");
            return;
        }
        match object {
            Object::Reference(reference) => self.write_reference(*reference, key, level, out),
            Object::Array(array) => self.write_array(array, level, out),
            Object::Dictionary(dict) => self.write_dictionary(dict, level, out),
            Object::Stream(stream) => {
                self.pure = false;
                self.write_dictionary(stream.dictionary(), level, out);
                out.push_str(&format!(" stream <{} bytes>", stream.data().len()));
            }
            Object::InlineImage(image) => {
                self.pure = false;
                out.push_str(&format!("<inline image, {} bytes>", image.data().len()));
            }
            scalar => out.push_str(&String::from_utf8_lossy(&scalar.unparse())),
        }
        self.context.exit();
    }

    fn follow(&self, reference: IndirectRef) -> Followed<'a> {
        if reference.document() != self.document.id() {
            return Followed::Foreign;
        }
        if self.context.is_on_path(&reference.id()) {
            return Followed::Cycle;
        }
        match self.document.lookup(reference) {
            Some(target) => Followed::Target(target),
            None => Followed::Dangling,
        }
    }

    fn is_page_tree_node(&self, reference: IndirectRef) -> bool {
        reference.document() == self.document.id()
            && self
                .document
                .lookup(reference)
                .and_then(Object::as_dict)
                .is_some_and(is_pages_node)
    }

    fn write_reference(
        &mut self,
        reference: IndirectRef,
        key: Option<&str>,
        level: usize,
        out: &mut String,
    ) {
        if key == Some("/Parent") && self.is_page_tree_node(reference) {
            self.pure = false;
            out.push_str("<reference to /Pages>");
            return;
        }
        match self.follow(reference) {
            Followed::Target(target) => {
                self.context.visit(reference.id());
                self.write_object(target, key, level, out);
                self.context.leave(reference.id());
            }
            Followed::Cycle => {
                self.pure = false;
                out.push_str("<circular reference>");
            }
            Followed::Dangling => {
                self.pure = false;
                out.push_str(&format!(
                    "<dangling reference {} {} R>",
                    reference.id().number(),
                    reference.id().generation()
                ));
            }
            Followed::Foreign => {
                self.pure = false;
                out.push_str(&format!("<foreign reference {reference}>"));
            }
        }
    }

    fn write_array(&mut self, array: &Array, level: usize, out: &mut String) {
        if array.is_empty() {
            out.push_str("[ ]");
            return;
        }
        if array.iter().all(Object::is_scalar) {
            out.push('[');
            for item in array {
                out.push(' ');
                self.write_object(item, None, level, out);
            }
            out.push_str(" ]");
            return;
        }

        out.push_str("[\n");
        for item in array {
            push_indent(out, level + 1);
            self.write_object(item, None, level + 1, out);
            out.push('\n');
        }
        push_indent(out, level);
        out.push(']');
    }

    fn write_dictionary(&mut self, dict: &Dictionary, level: usize, out: &mut String) {
        if dict.is_empty() {
            out.push_str("<< >>");
            return;
        }
        out.push_str("<<\n");
        for (key, value) in dict {
            push_indent(out, level + 1);
            out.push_str(&key.escaped());
            out.push(' ');
            self.write_object(value, Some(key.as_str()), level + 1, out);
            out.push('\n');
        }
        push_indent(out, level);
        out.push_str(">>");
    }
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}
