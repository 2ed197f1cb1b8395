//! A small in-memory DOM.
//!
//! Nodes are reference counted. A parent owns its first child and every node
//! owns its next sibling; the links pointing back (parent, previous sibling,
//! last child) are weak. Mutation follows the browser API: inserting a node
//! detaches it from wherever it was, and inserting a fragment moves the
//! fragment's children instead of the fragment itself.

use std::cell::RefCell;
use std::fmt::{self, Debug, Write};
use std::rc::{Rc, Weak};

pub enum NodeKind {
	Element {
		name: String,
		attributes: RefCell<Vec<(String, String)>>,
	},
	Text(RefCell<String>),
	Comment(RefCell<String>),
	Fragment,
}

pub struct NodeData {
	kind: NodeKind,
	parent: RefCell<Weak<NodeData>>,
	previous_sibling: RefCell<Weak<NodeData>>,
	next_sibling: RefCell<Option<Rc<NodeData>>>,
	first_child: RefCell<Option<Rc<NodeData>>>,
	last_child: RefCell<Weak<NodeData>>,
}

#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
	fn new(kind: NodeKind) -> Self {
		Node(Rc::new(NodeData {
			kind,
			parent: RefCell::new(Weak::new()),
			previous_sibling: RefCell::new(Weak::new()),
			next_sibling: RefCell::new(None),
			first_child: RefCell::new(None),
			last_child: RefCell::new(Weak::new()),
		}))
	}

	pub fn element(name: impl Into<String>) -> Self {
		Node::new(NodeKind::Element {
			name: name.into(),
			attributes: RefCell::new(Vec::new()),
		})
	}

	pub fn text(data: impl Into<String>) -> Self {
		Node::new(NodeKind::Text(RefCell::new(data.into())))
	}

	pub fn comment(data: impl Into<String>) -> Self {
		Node::new(NodeKind::Comment(RefCell::new(data.into())))
	}

	pub fn fragment() -> Self {
		Node::new(NodeKind::Fragment)
	}

	pub fn kind(&self) -> &NodeKind {
		&self.0.kind
	}

	pub fn is_fragment(&self) -> bool {
		matches!(self.0.kind, NodeKind::Fragment)
	}

	pub fn ptr_eq(&self, other: &Node) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	pub fn node_name(&self) -> String {
		match &self.0.kind {
			NodeKind::Element { name, .. } => name.clone(),
			NodeKind::Text(_) => "#text".into(),
			NodeKind::Comment(_) => "#comment".into(),
			NodeKind::Fragment => "#document-fragment".into(),
		}
	}

	pub fn parent_node(&self) -> Option<Node> {
		self.0.parent.borrow().upgrade().map(Node)
	}

	pub fn previous_sibling(&self) -> Option<Node> {
		self.0.previous_sibling.borrow().upgrade().map(Node)
	}

	pub fn next_sibling(&self) -> Option<Node> {
		self.0.next_sibling.borrow().clone().map(Node)
	}

	pub fn first_child(&self) -> Option<Node> {
		self.0.first_child.borrow().clone().map(Node)
	}

	pub fn last_child(&self) -> Option<Node> {
		self.0.last_child.borrow().upgrade().map(Node)
	}

	pub fn children(&self) -> Children {
		Children {
			next: self.first_child(),
		}
	}

	pub fn child_count(&self) -> usize {
		self.children().count()
	}

	pub fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.kind {
			NodeKind::Element { attributes, .. } => attributes
				.borrow()
				.iter()
				.find(|(key, _)| key == name)
				.map(|(_, value)| value.clone()),
			_ => None,
		}
	}

	/// Sets an attribute on an element; other node kinds ignore it.
	pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
		if let NodeKind::Element { attributes, .. } = &self.0.kind {
			let mut attributes = attributes.borrow_mut();
			let value = value.into();
			match attributes.iter_mut().find(|(key, _)| key == name) {
				Some(slot) => slot.1 = value,
				None => attributes.push((name.to_string(), value)),
			}
		}
	}

	/// Character data of a text or comment node.
	pub fn data(&self) -> Option<String> {
		match &self.0.kind {
			NodeKind::Text(data) | NodeKind::Comment(data) => Some(data.borrow().clone()),
			_ => None,
		}
	}

	pub fn set_data(&self, value: impl Into<String>) {
		if let NodeKind::Text(data) | NodeKind::Comment(data) = &self.0.kind {
			*data.borrow_mut() = value.into();
		}
	}

	/// Concatenated text of this node and all of its descendants.
	pub fn text_content(&self) -> String {
		let mut out = String::new();
		self.collect_text(&mut out);
		out
	}

	fn collect_text(&self, out: &mut String) {
		match &self.0.kind {
			NodeKind::Text(data) => out.push_str(&data.borrow()),
			NodeKind::Comment(_) => {}
			NodeKind::Element { .. } | NodeKind::Fragment => {
				for child in self.children() {
					child.collect_text(out);
				}
			}
		}
	}

	/// Unlinks this node from its parent and siblings. Its own children stay.
	pub fn detach(&self) {
		let parent = self.0.parent.replace(Weak::new());
		let previous = self.0.previous_sibling.replace(Weak::new());
		let next = self.0.next_sibling.borrow_mut().take();

		match &next {
			Some(next) => *next.previous_sibling.borrow_mut() = previous.clone(),
			None => {
				if let Some(parent) = parent.upgrade() {
					*parent.last_child.borrow_mut() = previous.clone();
				}
			}
		}

		match previous.upgrade() {
			Some(previous) => *previous.next_sibling.borrow_mut() = next,
			None => {
				if let Some(parent) = parent.upgrade() {
					*parent.first_child.borrow_mut() = next;
				}
			}
		}
	}

	pub fn append_child(&self, child: Node) {
		if child.is_fragment() {
			for item in child.take_children() {
				self.append_child(item);
			}
			return;
		}

		child.detach();
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);

		match self.0.last_child.borrow().upgrade() {
			Some(last) => {
				*child.0.previous_sibling.borrow_mut() = Rc::downgrade(&last);
				*last.next_sibling.borrow_mut() = Some(child.0.clone());
			}
			None => *self.0.first_child.borrow_mut() = Some(child.0.clone()),
		}
		*self.0.last_child.borrow_mut() = Rc::downgrade(&child.0);
	}

	pub fn prepend_child(&self, child: Node) {
		if child.is_fragment() {
			for item in child.take_children().into_iter().rev() {
				self.prepend_child(item);
			}
			return;
		}

		child.detach();
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);

		let first = self.0.first_child.borrow_mut().take();
		match &first {
			Some(first) => *first.previous_sibling.borrow_mut() = Rc::downgrade(&child.0),
			None => *self.0.last_child.borrow_mut() = Rc::downgrade(&child.0),
		}
		*child.0.next_sibling.borrow_mut() = first;
		*self.0.first_child.borrow_mut() = Some(child.0.clone());
	}

	/// Inserts `sibling` right after this node. Fragments are spliced in order.
	pub fn insert_after(&self, sibling: Node) {
		if sibling.is_fragment() {
			let mut anchor = self.clone();
			for item in sibling.take_children() {
				anchor.insert_after(item.clone());
				anchor = item;
			}
			return;
		}

		sibling.detach();
		let parent = self.0.parent.borrow().clone();
		*sibling.0.parent.borrow_mut() = parent.clone();
		*sibling.0.previous_sibling.borrow_mut() = Rc::downgrade(&self.0);

		let next = self.0.next_sibling.borrow_mut().take();
		match &next {
			Some(next) => *next.previous_sibling.borrow_mut() = Rc::downgrade(&sibling.0),
			None => {
				if let Some(parent) = parent.upgrade() {
					*parent.last_child.borrow_mut() = Rc::downgrade(&sibling.0);
				}
			}
		}
		*sibling.0.next_sibling.borrow_mut() = next;
		*self.0.next_sibling.borrow_mut() = Some(sibling.0.clone());
	}

	fn take_children(&self) -> Vec<Node> {
		let children: Vec<Node> = self.children().collect();
		for child in &children {
			child.detach();
		}
		children
	}

	/// Serializes the subtree. Meant for tests and debugging, no escaping.
	pub fn to_html(&self) -> String {
		let mut out = String::new();
		let _ = self.write_html(&mut out);
		out
	}

	fn write_html(&self, out: &mut String) -> fmt::Result {
		match &self.0.kind {
			NodeKind::Element { name, attributes } => {
				write!(out, "<{}", name)?;
				for (key, value) in attributes.borrow().iter() {
					write!(out, " {}=\"{}\"", key, value)?;
				}
				out.push('>');
				for child in self.children() {
					child.write_html(out)?;
				}
				write!(out, "</{}>", name)
			}
			NodeKind::Text(data) => out.write_str(&data.borrow()),
			NodeKind::Comment(data) => write!(out, "<!--{}-->", data.borrow()),
			NodeKind::Fragment => {
				for child in self.children() {
					child.write_html(out)?;
				}
				Ok(())
			}
		}
	}
}

impl Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_html())
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for Node {}

pub struct Children {
	next: Option<Node>,
}

impl Iterator for Children {
	type Item = Node;

	fn next(&mut self) -> Option<Node> {
		let node = self.next.take()?;
		self.next = node.next_sibling();
		Some(node)
	}
}

fn take_if_unique(slot: &RefCell<Option<Rc<NodeData>>>) -> Option<Rc<NodeData>> {
	let mut slot = slot.borrow_mut();
	if slot.as_ref().is_some_and(|rc| Rc::strong_count(rc) == 1) {
		slot.take()
	} else {
		None
	}
}

impl Drop for NodeData {
	// Long sibling chains would otherwise drop recursively, one frame per node.
	fn drop(&mut self) {
		let mut stack = Vec::new();
		stack.extend(take_if_unique(&self.first_child));
		stack.extend(take_if_unique(&self.next_sibling));

		while let Some(node) = stack.pop() {
			stack.extend(take_if_unique(&node.first_child));
			stack.extend(take_if_unique(&node.next_sibling));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn long_sibling_chain_drops_without_recursion() {
		let root = Node::element("ul");
		for index in 0..200_000 {
			root.append_child(Node::text(index.to_string()));
		}
		assert_eq!(root.child_count(), 200_000);
		drop(root);
	}

	#[test]
	fn fragment_children_are_spliced() {
		let root = Node::element("div");
		let a = Node::text("a");
		root.append_child(a.clone());

		let fragment = Node::fragment();
		fragment.append_child(Node::text("b"));
		fragment.append_child(Node::text("c"));
		a.insert_after(fragment.clone());

		assert_eq!(root.to_html(), "<div>abc</div>");
		assert_eq!(fragment.child_count(), 0);
		assert_eq!(root.last_child().and_then(|n| n.data()), Some("c".into()));
	}

	#[test]
	fn detach_repairs_links() {
		let root = Node::element("p");
		let a = Node::text("a");
		let b = Node::text("b");
		let c = Node::text("c");
		root.append_child(a.clone());
		root.append_child(b.clone());
		root.append_child(c.clone());

		b.detach();
		assert_eq!(root.to_html(), "<p>ac</p>");
		assert_eq!(c.previous_sibling(), Some(a.clone()));
		assert!(b.parent_node().is_none());

		c.detach();
		assert_eq!(root.last_child(), Some(a.clone()));
		a.detach();
		assert!(root.first_child().is_none());
		assert!(root.last_child().is_none());
	}
}
