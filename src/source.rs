use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::error::ContractViolation;
use crate::subscribers::Subscribers;
use crate::value::{Access, Value};
use crate::{batch, tracking, Computed, Observable, Observer, Version};

/// A mutable leaf of the graph.
pub struct Source<T> {
	body: Rc<SourceBody<T>>,
}

pub struct SourceBody<T> {
	value: RefCell<T>,
	version: Cell<Version>,
	subscribers: RefCell<Subscribers>,
	this: Weak<SourceBody<T>>,
}

impl<T> Clone for Source<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Source<T>
where
	T: Default + Clone + PartialEq + 'static,
{
	fn default() -> Self {
		Source::new(Default::default())
	}
}

#[track_caller]
pub fn source<T>(value: T) -> Source<T>
where
	T: Clone + PartialEq + 'static,
{
	Source::new(value)
}

impl<T> Source<T>
where
	T: Clone + PartialEq + 'static,
{
	#[track_caller]
	pub fn new(value: T) -> Self {
		if let Err(violation) =
			tracking::ensure_not_computing(ContractViolation::CreateDuringCompute("source"))
		{
			violation.raise();
		}

		Source {
			body: Rc::new_cyclic(|this| SourceBody {
				value: RefCell::new(value),
				version: Cell::new(Version::default()),
				subscribers: RefCell::new(Subscribers::new()),
				this: this.clone(),
			}),
		}
	}

	/// Derives a computed value from this source alone.
	pub fn map<F, R>(&self, func: F) -> Computed<R>
	where
		F: Fn(&T) -> R + 'static,
		R: Clone + PartialEq + 'static,
	{
		let this = self.clone();
		Computed::new(move || this.with(|value| func(value)))
	}

	#[inline]
	pub fn current(&self) -> T {
		self.body.current()
	}

	/// Borrows the value instead of cloning it. Tracked like `current`.
	pub fn with<R>(&self, func: impl FnOnce(&T) -> R) -> R {
		self.body.track();
		func(&self.body.value.borrow())
	}

	#[inline]
	pub fn version(&self) -> Version {
		self.body.version.get()
	}

	pub fn subscriber_count(&self) -> usize {
		self.body.subscribers.borrow().len()
	}

	#[track_caller]
	pub fn change(&self, value: T) {
		if let Err(violation) = self.try_change(value) {
			violation.raise();
		}
	}

	/// Stores `value` if it differs from the current one, notifies the
	/// subscribers and, outside of a batch, runs the effects that became due.
	pub fn try_change(&self, value: T) -> Result<(), ContractViolation> {
		tracking::ensure_not_computing(ContractViolation::ChangeDuringCompute)?;

		if *self.body.value.borrow() == value {
			return Ok(());
		}

		self.body.value.replace(value);
		self.body.version.set(self.body.version.get().next());
		self.body.notify();

		batch::flush_unless_batching();
		Ok(())
	}

	#[track_caller]
	pub fn update(&self, func: impl FnOnce(&T) -> T) {
		if let Err(violation) = self.try_update(func) {
			violation.raise();
		}
	}

	pub fn try_update(&self, func: impl FnOnce(&T) -> T) -> Result<(), ContractViolation> {
		tracking::ensure_not_computing(ContractViolation::ChangeDuringCompute)?;
		let next = func(&self.body.value.borrow());
		self.try_change(next)
	}
}

impl<T> SourceBody<T>
where
	T: Clone + 'static,
{
	fn track(&self) {
		if let Some(this) = self.this.upgrade() {
			tracking::track(this, self.version.get());
		}
	}

	fn current(&self) -> T {
		self.track();
		self.value.borrow().clone()
	}

	fn notify(&self) {
		let subscribers = self.subscribers.borrow_mut().snapshot();
		for observer in subscribers {
			observer.mark_changed();
		}
	}
}

impl<T: 'static> Observable for SourceBody<T> {
	fn update(&self) -> Version {
		self.version.get()
	}

	fn version(&self) -> Version {
		self.version.get()
	}

	fn used_by(&self, observer: Weak<dyn Observer>) {
		self.subscribers.borrow_mut().add(observer);
	}

	fn not_used_by(&self, observer: &Weak<dyn Observer>) {
		self.subscribers.borrow_mut().remove(observer);
	}
}

impl<T> Access<T> for SourceBody<T>
where
	T: Clone + 'static,
{
	fn current(&self) -> T {
		SourceBody::current(self)
	}

	fn as_observable(self: Rc<Self>) -> Rc<dyn Observable> {
		self
	}
}

impl<T> From<Source<T>> for Value<T>
where
	T: Clone + 'static,
{
	fn from(source: Source<T>) -> Self {
		Value::new(source.body)
	}
}

impl<T> From<&Source<T>> for Value<T>
where
	T: Clone + 'static,
{
	fn from(source: &Source<T>) -> Self {
		Value::new(source.body.clone())
	}
}

impl<T> Debug for Source<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("Source").field(&*self.body.value.borrow()).finish()
	}
}
