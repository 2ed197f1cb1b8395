use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::batch::batch;
use crate::lifecycle::Lifecycle;
use crate::source::Source;

/// Receives the structural edits of a [`ListSource`] as they happen.
pub trait ListObserver<T> {
	fn on_insert(&self, index: usize, item: &Source<T>);
	fn on_move(&self, from: usize, to: usize);
	fn on_remove(&self, index: usize);
}

/// An observable sequence of values.
///
/// Each element lives in its own [`Source`], so bound content follows an
/// element through moves and only re-renders when that element changes.
pub struct ListSource<T>
where
	T: Clone + PartialEq + 'static,
{
	body: Rc<ListSourceBody<T>>,
}

struct ListSourceBody<T>
where
	T: Clone + PartialEq + 'static,
{
	items: RefCell<Vec<Source<T>>>,
	observers: RefCell<SmallVec<[Rc<dyn ListObserver<T>>; 2]>>,
	revision: Source<u64>,
}

impl<T> Clone for ListSource<T>
where
	T: Clone + PartialEq + 'static,
{
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

#[track_caller]
pub fn list_source<T>(values: impl IntoIterator<Item = T>) -> ListSource<T>
where
	T: Clone + PartialEq + 'static,
{
	ListSource::new(values)
}

impl<T> ListSource<T>
where
	T: Clone + PartialEq + 'static,
{
	#[track_caller]
	pub fn new(values: impl IntoIterator<Item = T>) -> Self {
		ListSource {
			body: Rc::new(ListSourceBody {
				items: RefCell::new(values.into_iter().map(Source::new).collect()),
				observers: RefCell::new(SmallVec::new()),
				revision: Source::new(0),
			}),
		}
	}

	pub fn len(&self) -> usize {
		self.body.items.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.body.items.borrow().is_empty()
	}

	/// The per-element sources, in order. Not tracked.
	pub fn items(&self) -> Vec<Source<T>> {
		self.body.items.borrow().clone()
	}

	pub fn item(&self, index: usize) -> Option<Source<T>> {
		self.body.items.borrow().get(index).cloned()
	}

	/// The current values. Inside a compute function this tracks structural
	/// edits as well as every element.
	pub fn current(&self) -> Vec<T> {
		self.body.revision.with(|_| ());
		self.items().iter().map(Source::current).collect()
	}

	#[track_caller]
	pub fn insert_item(&self, index: usize, value: T) {
		batch(|| {
			let index = index.min(self.len());
			let item = Source::new(value);
			self.body.items.borrow_mut().insert(index, item.clone());
			tracing::debug!(index, "list source insert");
			self.notify(|observer| observer.on_insert(index, &item));
		})
	}

	#[track_caller]
	pub fn push(&self, value: T) {
		self.insert_item(self.len(), value)
	}

	/// Moves the element at `from` to index `to`. Out of range indices are
	/// ignored.
	#[track_caller]
	pub fn move_item(&self, from: usize, to: usize) {
		let len = self.len();
		if from == to || from >= len || to >= len {
			return;
		}

		batch(|| {
			{
				let mut items = self.body.items.borrow_mut();
				let item = items.remove(from);
				items.insert(to, item);
			}
			tracing::debug!(from, to, "list source move");
			self.notify(|observer| observer.on_move(from, to));
		})
	}

	#[track_caller]
	pub fn remove_item(&self, index: usize) {
		if index >= self.len() {
			return;
		}

		batch(|| {
			self.body.items.borrow_mut().remove(index);
			tracing::debug!(index, "list source remove");
			self.notify(|observer| observer.on_remove(index));
		})
	}

	/// Reconciles the list with `values` using the fewest edits it can find
	/// by matching elements on value.
	///
	/// Elements missing from `values` are removed first. Then each position
	/// is filled by moving the first matching element found at or after it,
	/// or by inserting a new one. Elements left over past the end, which can
	/// only be surplus duplicates, are removed last.
	#[track_caller]
	pub fn change(&self, values: Vec<T>) {
		batch(|| {
			let mut index = 0;
			while index < self.len() {
				let keep = self.body.items.borrow()[index].with(|value| values.contains(value));
				if keep {
					index += 1;
				} else {
					self.remove_item(index);
				}
			}

			for (index, value) in values.iter().enumerate() {
				let found = self.body.items.borrow()[index..]
					.iter()
					.position(|item| item.with(|current| current == value))
					.map(|offset| offset + index);

				match found {
					Some(position) if position == index => {}
					Some(position) => self.move_item(position, index),
					None => self.insert_item(index, value.clone()),
				}
			}

			while self.len() > values.len() {
				self.remove_item(self.len() - 1);
			}
		})
	}

	pub fn subscribe(&self, observer: Rc<dyn ListObserver<T>>) -> ListSubscription<T> {
		self.body.observers.borrow_mut().push(observer.clone());
		ListSubscription {
			list: Rc::downgrade(&self.body),
			observer,
		}
	}

	pub fn unsubscribe(&self, observer: &Rc<dyn ListObserver<T>>) {
		self.body.unsubscribe(observer);
	}

	pub fn observer_count(&self) -> usize {
		self.body.observers.borrow().len()
	}

	fn notify(&self, func: impl Fn(&dyn ListObserver<T>)) {
		let observers = self.body.observers.borrow().clone();
		for observer in observers.iter() {
			func(&**observer);
		}
		self.body.revision.update(|revision| revision + 1);
	}
}

impl<T> ListSourceBody<T>
where
	T: Clone + PartialEq + 'static,
{
	fn unsubscribe(&self, observer: &Rc<dyn ListObserver<T>>) {
		self.observers
			.borrow_mut()
			.retain(|current| !Rc::ptr_eq(current, observer));
	}
}

/// Keeps an observer attached to a [`ListSource`] until cancelled or
/// disposed.
pub struct ListSubscription<T>
where
	T: Clone + PartialEq + 'static,
{
	list: Weak<ListSourceBody<T>>,
	observer: Rc<dyn ListObserver<T>>,
}

impl<T> ListSubscription<T>
where
	T: Clone + PartialEq + 'static,
{
	pub fn cancel(&self) {
		if let Some(list) = self.list.upgrade() {
			list.unsubscribe(&self.observer);
		}
	}
}

impl<T> Lifecycle for ListSubscription<T>
where
	T: Clone + PartialEq + 'static,
{
	fn dispose(&self) {
		self.cancel();
	}
}

impl<T> Debug for ListSource<T>
where
	T: Clone + PartialEq + Debug + 'static,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.body.items.borrow().iter()).finish()
	}
}
