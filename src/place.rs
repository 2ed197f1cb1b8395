//! Positions in the DOM where rendered content begins or ends.
//!
//! A [`Place`] is symbolic: it may refer to a placeholder or a list whose
//! extent changes over time, so it is resolved to a concrete [`DomPlace`]
//! every time it is used and never cached.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::dom::Node;
use crate::error::ContractViolation;
use crate::list::PlaceholderList;
use crate::placeholder::Placeholder;

#[derive(Clone)]
pub enum Place {
	/// Content continues right after this node.
	Node(Node),
	/// Content is inserted at the beginning of this container.
	ParentContainer(Node),
	/// Content continues wherever this placeholder's content currently ends.
	Placeholder(Placeholder),
	/// Content continues after the last entry of this list, or where the
	/// list starts if it is empty.
	List(PlaceholderList),
	/// Wherever the place stored in this slot currently resolves.
	Slot(PlaceSlot),
}

/// A shared, mutable cell holding the place a placeholder or list starts at.
///
/// Content rendered at the very beginning of a placeholder refers to the
/// placeholder's slot rather than to a copy of its start, so it follows
/// when the owning list repoints that start.
#[derive(Clone)]
pub struct PlaceSlot(Rc<RefCell<Place>>);

impl PlaceSlot {
	pub fn new(place: Place) -> Self {
		PlaceSlot(Rc::new(RefCell::new(place)))
	}

	pub fn get(&self) -> Place {
		self.0.borrow().clone()
	}

	pub fn set(&self, place: Place) {
		*self.0.borrow_mut() = place;
	}

	pub fn ptr_eq(&self, other: &PlaceSlot) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

/// A resolved, concrete insertion anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomPlace {
	/// Insert right after this node.
	After(Node),
	/// Insert as the first child of this container.
	Start(Node),
}

impl DomPlace {
	/// The node directly preceding this position, if there is one.
	fn node(&self) -> Option<&Node> {
		match self {
			DomPlace::After(node) => Some(node),
			DomPlace::Start(_) => None,
		}
	}
}

impl Place {
	pub fn last_dom_place(&self) -> DomPlace {
		last_dom_place(self)
	}
}

/// Follows placeholder, list and slot references until a node or container
/// position is reached.
pub fn last_dom_place(place: &Place) -> DomPlace {
	let mut place = place.clone();
	loop {
		place = match place {
			Place::Node(node) => return DomPlace::After(node),
			Place::ParentContainer(node) => return DomPlace::Start(node),
			Place::Placeholder(placeholder) => placeholder
				.end_place()
				.unwrap_or_else(|| placeholder.place()),
			Place::List(list) => list.end_place().unwrap_or_else(|| list.place()),
			Place::Slot(slot) => slot.get(),
		}
	}
}

/// Inserts `node` at `place` and returns the place right after it.
///
/// A fragment is spliced: its children are inserted in order and the place
/// after the last of them is returned, or `place` itself if it had none.
pub fn insert_node_at(place: &Place, node: Node) -> Result<Place, ContractViolation> {
	let last = if node.is_fragment() {
		node.last_child()
	} else {
		Some(node.clone())
	};

	match last_dom_place(place) {
		DomPlace::After(anchor) => {
			if anchor.parent_node().is_none() {
				return Err(ContractViolation::DetachedAnchor);
			}
			anchor.insert_after(node);
		}
		DomPlace::Start(container) => container.prepend_child(node),
	}

	Ok(match last {
		Some(last) => Place::Node(last),
		None => place.clone(),
	})
}

/// Removes every node between the anchors of `place` (exclusive) and `last`
/// (inclusive).
pub fn remove_nodes_at(place: &Place, last: &Place) {
	walk_back(place, last, |node| node.detach());
}

/// Like [`remove_nodes_at`], but collects the removed nodes, in document
/// order, into a fragment that can be inserted elsewhere.
pub fn take_nodes_from(place: &Place, last: &Place) -> Node {
	let fragment = Node::fragment();
	walk_back(place, last, |node| fragment.prepend_child(node));
	fragment
}

fn walk_back(place: &Place, last: &Place, mut visit: impl FnMut(Node)) {
	let stop = last_dom_place(place);
	let mut current = last_dom_place(last).node().cloned();

	while let Some(node) = current {
		if stop.node().is_some_and(|stop| stop.ptr_eq(&node)) {
			break;
		}
		current = node.previous_sibling();
		visit(node);
	}
}

impl Debug for Place {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Place::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Place::ParentContainer(node) => f
				.debug_tuple("ParentContainer")
				.field(&node.node_name())
				.finish(),
			Place::Placeholder(_) => f.write_str("Placeholder"),
			Place::List(_) => f.write_str("List"),
			Place::Slot(slot) => f.debug_tuple("Slot").field(&slot.get()).finish(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn container() -> (Node, Node) {
		let root = Node::element("div");
		let start = Node::comment("start");
		root.append_child(start.clone());
		(root, start)
	}

	#[test]
	fn insertion_threads_the_place() {
		let (root, start) = container();
		let place = Place::Node(start);
		let place = insert_node_at(&place, Node::text("a")).unwrap();
		let place = insert_node_at(&place, Node::text("b")).unwrap();
		insert_node_at(&place, Node::text("c")).unwrap();
		assert_eq!(root.to_html(), "<div><!--start-->abc</div>");
	}

	#[test]
	fn container_start_prepends() {
		let root = Node::element("ul");
		root.append_child(Node::text("z"));
		let place = insert_node_at(&Place::ParentContainer(root.clone()), Node::text("a")).unwrap();
		insert_node_at(&place, Node::text("b")).unwrap();
		assert_eq!(root.to_html(), "<ul>abz</ul>");
	}

	#[test]
	fn empty_fragment_keeps_the_place() {
		let (_root, start) = container();
		let place = Place::Node(start.clone());
		let next = insert_node_at(&place, Node::fragment()).unwrap();
		assert_eq!(next.last_dom_place(), DomPlace::After(start));
	}

	#[test]
	fn detached_anchor_is_rejected() {
		let orphan = Node::text("orphan");
		let result = insert_node_at(&Place::Node(orphan), Node::text("a"));
		assert_eq!(result.unwrap_err(), ContractViolation::DetachedAnchor);
	}

	#[test]
	fn remove_and_take_stop_at_the_start_anchor() {
		let (root, start) = container();
		let from = Place::Node(start);
		let mut last = from.clone();
		for text in ["a", "b", "c"] {
			last = insert_node_at(&last, Node::text(text)).unwrap();
		}
		root.append_child(Node::text("tail"));

		let fragment = take_nodes_from(&from, &last);
		assert_eq!(fragment.to_html(), "abc");
		assert_eq!(root.to_html(), "<div><!--start-->tail</div>");

		let last = insert_node_at(&from, fragment).unwrap();
		remove_nodes_at(&from, &last);
		assert_eq!(root.to_html(), "<div><!--start-->tail</div>");
	}

	#[test]
	fn slot_follows_repointing() {
		let (_root, start) = container();
		let other = Node::comment("other");
		let slot = PlaceSlot::new(Place::Node(start));
		let place = Place::Slot(slot.clone());
		slot.set(Place::Node(other.clone()));
		assert_eq!(place.last_dom_place(), DomPlace::After(other));
	}
}
