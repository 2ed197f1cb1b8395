use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::batch::batch;
use crate::dom::Node;
use crate::error::ContractViolation;
use crate::lifecycle::Lifecycle;
use crate::list::PlaceholderList;
use crate::place::{self, DomPlace, Place, PlaceSlot};

/// Describes how to populate a region of the DOM.
pub struct PlaceholderComponent(Box<dyn FnOnce(&mut Renderer)>);

impl PlaceholderComponent {
	pub fn new(func: impl FnOnce(&mut Renderer) + 'static) -> Self {
		PlaceholderComponent(Box::new(func))
	}

	fn render(self, renderer: &mut Renderer) {
		(self.0)(renderer)
	}
}

impl<F> From<F> for PlaceholderComponent
where
	F: FnOnce(&mut Renderer) + 'static,
{
	fn from(func: F) -> Self {
		PlaceholderComponent::new(func)
	}
}

pub fn component(func: impl FnOnce(&mut Renderer) + 'static) -> PlaceholderComponent {
	PlaceholderComponent::new(func)
}

/// An anchored region of zero or more DOM nodes that can be re-rendered in
/// place.
///
/// The region starts at the place held in its slot and ends at `end`; an
/// empty region has no end and resolves to its start. Lifecycles registered
/// while rendering belong to the placeholder and are driven by it.
#[derive(Clone)]
pub struct Placeholder {
	body: Rc<PlaceholderBody>,
}

struct PlaceholderBody {
	slot: PlaceSlot,
	end: RefCell<Option<Place>>,
	lifecycles: RefCell<Vec<Rc<dyn Lifecycle>>>,
}

impl Placeholder {
	/// Creates a placeholder starting at `place` and renders `content` into it.
	/// Nothing is mounted; that is up to whoever owns the placeholder.
	pub fn new(place: Place, content: Option<PlaceholderComponent>) -> Self {
		let placeholder = Placeholder {
			body: Rc::new(PlaceholderBody {
				slot: PlaceSlot::new(place),
				end: RefCell::new(None),
				lifecycles: RefCell::new(Vec::new()),
			}),
		};

		if let Some(content) = content {
			placeholder.render(content);
		}

		placeholder
	}

	fn render(&self, content: PlaceholderComponent) {
		let start = Place::Slot(self.body.slot.clone());
		let mut renderer = Renderer::new(self.clone(), start);

		// Effects created by the content run once the end is known.
		batch(|| {
			content.render(&mut renderer);
			if !renderer.is_at(&self.body.slot) {
				*self.body.end.borrow_mut() = Some(renderer.place.clone());
			}
		});
	}

	/// Throws the current content away and renders `content` in its place.
	///
	/// Old lifecycles are all unmounted, then all disposed, before anything
	/// new is rendered; the new lifecycles are mounted last.
	pub fn replace_content(&self, content: Option<PlaceholderComponent>) {
		let old = self.body.lifecycles.take();
		for lifecycle in &old {
			lifecycle.unmount();
		}
		for lifecycle in &old {
			lifecycle.dispose();
		}
		drop(old);

		let end = self.body.end.borrow_mut().take();
		if let Some(end) = end {
			place::remove_nodes_at(&self.start(), &end);
		}

		if let Some(content) = content {
			self.render(content);
			self.mount();
		}
	}

	/// Adds `lifecycle` to the set driven by this placeholder. Registering the
	/// same lifecycle twice makes it receive every callback twice.
	pub fn register_lifecycle<L>(&self, lifecycle: Rc<L>) -> Rc<L>
	where
		L: Lifecycle + 'static,
	{
		self.body.lifecycles.borrow_mut().push(lifecycle.clone());
		lifecycle
	}

	pub fn lifecycle_count(&self) -> usize {
		self.body.lifecycles.borrow().len()
	}

	fn lifecycles(&self) -> Vec<Rc<dyn Lifecycle>> {
		self.body.lifecycles.borrow().clone()
	}

	/// Where the content starts.
	pub fn place(&self) -> Place {
		self.body.slot.get()
	}

	pub(crate) fn set_place(&self, place: Place) {
		self.body.slot.set(place);
	}

	fn start(&self) -> Place {
		Place::Slot(self.body.slot.clone())
	}

	/// Where the content ends, `None` while it is empty.
	pub fn end_place(&self) -> Option<Place> {
		self.body.end.borrow().clone()
	}

	pub fn is_empty(&self) -> bool {
		self.body.end.borrow().is_none()
	}

	pub fn last_dom_place(&self) -> DomPlace {
		place::last_dom_place(&Place::Placeholder(self.clone()))
	}

	/// Moves the rendered nodes out of the document into a fragment. The end
	/// place stays as it is, so the fragment can be put back at a new start.
	pub(crate) fn take_nodes(&self) -> Node {
		match self.end_place() {
			Some(end) => place::take_nodes_from(&self.start(), &end),
			None => Node::fragment(),
		}
	}

	pub fn ptr_eq(&self, other: &Placeholder) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}
}

impl Lifecycle for Placeholder {
	fn mount(&self) {
		for lifecycle in self.lifecycles() {
			lifecycle.mount();
		}
	}

	fn unmount(&self) {
		for lifecycle in self.lifecycles() {
			lifecycle.unmount();
		}
	}

	/// Disposes every registered lifecycle and forgets them, so a second call
	/// does nothing.
	fn dispose(&self) {
		for lifecycle in self.body.lifecycles.take() {
			lifecycle.dispose();
		}
	}
}

impl Debug for Placeholder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Placeholder")
			.field("start", &self.place())
			.field("end", &self.end_place())
			.field("lifecycles", &self.lifecycle_count())
			.finish()
	}
}

/// Inserts content at a moving place on behalf of a placeholder.
///
/// Every insertion advances the place, so consecutive inserts come out in
/// document order. Lifecycles are registered with the owning placeholder.
pub struct Renderer {
	owner: Placeholder,
	place: Place,
}

impl Renderer {
	fn new(owner: Placeholder, place: Place) -> Self {
		Renderer { owner, place }
	}

	fn is_at(&self, slot: &PlaceSlot) -> bool {
		matches!(&self.place, Place::Slot(current) if current.ptr_eq(slot))
	}

	pub fn place(&self) -> &Place {
		&self.place
	}

	pub fn owner(&self) -> &Placeholder {
		&self.owner
	}

	/// Inserts `node` and returns it. Panics if the place resolves to a node
	/// that is not attached to a parent.
	#[track_caller]
	pub fn insert_node(&mut self, node: Node) -> Node {
		match self.try_insert_node(node) {
			Ok(node) => node,
			Err(violation) => violation.raise(),
		}
	}

	pub fn try_insert_node(&mut self, node: Node) -> Result<Node, ContractViolation> {
		self.place = place::insert_node_at(&self.place, node.clone())?;
		Ok(node)
	}

	/// Inserts a nested placeholder rendering `content`. The owner drives its
	/// lifecycle.
	pub fn insert_placeholder(&mut self, content: Option<PlaceholderComponent>) -> Placeholder {
		let placeholder = Placeholder::new(self.place.clone(), content);
		self.owner.register_lifecycle(Rc::new(placeholder.clone()));
		self.place = Place::Placeholder(placeholder.clone());
		placeholder
	}

	/// Inserts a list with one entry per element of `contents`.
	pub fn insert_list(&mut self, contents: Vec<Option<PlaceholderComponent>>) -> PlaceholderList {
		let list = PlaceholderList::new(self.place.clone(), contents);
		self.owner.register_lifecycle(Rc::new(list.clone()));
		self.place = Place::List(list.clone());
		list
	}

	pub fn register_lifecycle<L>(&self, lifecycle: Rc<L>) -> Rc<L>
	where
		L: Lifecycle + 'static,
	{
		self.owner.register_lifecycle(lifecycle)
	}

	/// A renderer for the same owner at another place, typically the inside
	/// of an element created by this one.
	pub fn create_renderer_at(&self, place: Place) -> Renderer {
		Renderer::new(self.owner.clone(), place)
	}
}

/// Renders `content` at the start of `container` and mounts it.
pub fn mount_root(container: &Node, content: PlaceholderComponent) -> Placeholder {
	let root = Placeholder::new(Place::ParentContainer(container.clone()), Some(content));
	root.mount();
	root
}
