use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::lifecycle::Lifecycle;
use crate::place::{self, DomPlace, Place, PlaceSlot};
use crate::placeholder::{Placeholder, PlaceholderComponent};

/// An ordered run of placeholders sharing one DOM range.
///
/// Entry `i` starts where entry `i - 1` ends, and the first entry starts where
/// the list does. Every structural operation repairs that chain for the
/// entries next to the affected index and moves DOM ranges as a whole.
#[derive(Clone)]
pub struct PlaceholderList {
	body: Rc<ListBody>,
}

struct ListBody {
	slot: PlaceSlot,
	items: RefCell<Vec<Placeholder>>,
	mounted: Cell<bool>,
}

impl PlaceholderList {
	pub fn new(place: Place, contents: Vec<Option<PlaceholderComponent>>) -> Self {
		let list = PlaceholderList {
			body: Rc::new(ListBody {
				slot: PlaceSlot::new(place),
				items: RefCell::new(Vec::with_capacity(contents.len())),
				mounted: Cell::new(false),
			}),
		};

		for content in contents {
			list.insert(list.len(), content);
		}

		list
	}

	pub fn len(&self) -> usize {
		self.body.items.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.body.items.borrow().is_empty()
	}

	pub fn get(&self, index: usize) -> Option<Placeholder> {
		self.body.items.borrow().get(index).cloned()
	}

	/// Where the list starts.
	pub fn place(&self) -> Place {
		self.body.slot.get()
	}

	/// The last entry as a place, `None` while the list is empty.
	pub fn end_place(&self) -> Option<Place> {
		self.body.items.borrow().last().cloned().map(Place::Placeholder)
	}

	pub fn last_dom_place(&self) -> DomPlace {
		place::last_dom_place(&Place::List(self.clone()))
	}

	fn start_of(&self, index: usize) -> Place {
		match index.checked_sub(1).and_then(|previous| self.get(previous)) {
			Some(previous) => Place::Placeholder(previous),
			None => Place::Slot(self.body.slot.clone()),
		}
	}

	/// Inserts a new entry rendering `content` before the entry currently at
	/// `index`. Indices past the end append.
	pub fn insert(&self, index: usize, content: Option<PlaceholderComponent>) -> Placeholder {
		let index = index.min(self.len());
		tracing::debug!(index, "list insert");

		let item = Placeholder::new(self.start_of(index), content);
		if let Some(next) = self.get(index) {
			next.set_place(Place::Placeholder(item.clone()));
		}
		self.body.items.borrow_mut().insert(index, item.clone());

		if self.body.mounted.get() {
			item.mount();
		}
		item
	}

	/// Removes the entry at `index` along with its DOM nodes and lifecycles.
	/// Out of range indices are ignored.
	///
	/// Removing the last entry needs no chain repair. Removing an interior
	/// entry hands its start over to the successor before the entry is dropped.
	pub fn remove_at(&self, index: usize) {
		let Some(item) = self.get(index) else {
			return;
		};
		tracing::debug!(index, "list remove");

		item.replace_content(None);
		if let Some(next) = self.get(index + 1) {
			next.set_place(item.place());
		}
		self.body.items.borrow_mut().remove(index);
	}

	/// Moves the entry at `from` so that it ends up at index `to`, carrying its
	/// DOM nodes along. Out of range indices are ignored.
	pub fn move_from_to(&self, from: usize, to: usize) {
		let len = self.len();
		if from == to || from >= len || to >= len {
			return;
		}
		tracing::debug!(from, to, "list move");

		let Some(item) = self.get(from) else {
			return;
		};

		let fragment = item.take_nodes();
		if let Some(next) = self.get(from + 1) {
			next.set_place(item.place());
		}

		{
			let mut items = self.body.items.borrow_mut();
			let item = items.remove(from);
			items.insert(to, item);
		}

		let start = self.start_of(to);
		item.set_place(start.clone());
		if let Err(violation) = place::insert_node_at(&start, fragment) {
			violation.raise();
		}

		if let Some(next) = self.get(to + 1) {
			next.set_place(Place::Placeholder(item.clone()));
		}
	}
}

impl Lifecycle for PlaceholderList {
	fn mount(&self) {
		self.body.mounted.set(true);
		let items = self.body.items.borrow().clone();
		for item in items {
			item.mount();
		}
	}

	fn unmount(&self) {
		self.body.mounted.set(false);
		let items = self.body.items.borrow().clone();
		for item in items {
			item.unmount();
		}
	}

	fn dispose(&self) {
		self.body.mounted.set(false);
		let items = self.body.items.borrow().clone();
		for item in items {
			item.dispose();
		}
	}
}

impl Debug for PlaceholderList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PlaceholderList")
			.field("start", &self.place())
			.field("len", &self.len())
			.finish()
	}
}
