//! Glue connecting observables to rendered content.
//!
//! Each binding renders the current state right away and registers an effect
//! (or list subscription) with the renderer's owner, so the binding lives
//! exactly as long as the content it was rendered into.

use std::rc::Rc;

use enclose::enclose;

use crate::dom::Node;
use crate::effect::Effect;
use crate::list::PlaceholderList;
use crate::list_source::{ListObserver, ListSource};
use crate::placeholder::{Placeholder, PlaceholderComponent, Renderer};
use crate::source::Source;
use crate::value::Value;

/// Inserts a text node that tracks `value`.
pub fn re_text(renderer: &mut Renderer, value: impl Into<Value<String>>) -> Node {
	let value = value.into();
	let node = renderer.insert_node(Node::text(value.current()));

	let effect = Effect::new_with_name(
		"re_text",
		value,
		enclose!((node) move |text: String| node.set_data(text)),
	);
	renderer.register_lifecycle(Rc::new(effect));
	node
}

/// Inserts a placeholder whose content is re-rendered every time `value`
/// produces something different from what was rendered last.
pub fn re_content<T>(
	renderer: &mut Renderer,
	value: impl Into<Value<T>>,
	render: impl Fn(&T) -> Option<PlaceholderComponent> + 'static,
) -> Placeholder
where
	T: Clone + PartialEq + 'static,
{
	let value = value.into();
	let mut rendered = value.current();
	let placeholder = renderer.insert_placeholder(render(&rendered));

	let effect = Effect::new_with_name(
		"re_content",
		value,
		enclose!((placeholder) move |next: T| {
			if next == rendered {
				return;
			}
			rendered = next;
			placeholder.replace_content(render(&rendered));
		}),
	);
	renderer.register_lifecycle(Rc::new(effect));
	placeholder
}

/// Switches between two renderings depending on `condition`.
pub fn re_if(
	renderer: &mut Renderer,
	condition: impl Into<Value<bool>>,
	then: impl Fn() -> Option<PlaceholderComponent> + 'static,
	otherwise: impl Fn() -> Option<PlaceholderComponent> + 'static,
) -> Placeholder {
	re_content(renderer, condition, move |condition: &bool| {
		if *condition {
			then()
		} else {
			otherwise()
		}
	})
}

/// Inserts a list with one entry per element of `list` and keeps the entries
/// in step with the list's inserts, moves and removals.
pub fn re_list<T, F>(renderer: &mut Renderer, list: &ListSource<T>, render: F) -> PlaceholderList
where
	T: Clone + PartialEq + 'static,
	F: Fn(&Source<T>) -> Option<PlaceholderComponent> + 'static,
{
	let contents = list.items().iter().map(&render).collect();
	let target = renderer.insert_list(contents);

	let binding: Rc<dyn ListObserver<T>> = Rc::new(ListBinding {
		target: target.clone(),
		render,
	});
	renderer.register_lifecycle(Rc::new(list.subscribe(binding)));
	target
}

struct ListBinding<F> {
	target: PlaceholderList,
	render: F,
}

impl<T, F> ListObserver<T> for ListBinding<F>
where
	F: Fn(&Source<T>) -> Option<PlaceholderComponent>,
{
	fn on_insert(&self, index: usize, item: &Source<T>) {
		self.target.insert(index, (self.render)(item));
	}

	fn on_move(&self, from: usize, to: usize) {
		self.target.move_from_to(from, to);
	}

	fn on_remove(&self, index: usize) {
		self.target.remove_at(index);
	}
}
