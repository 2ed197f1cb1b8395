use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::batch::{self, Cleanup};
use crate::dependencies::Dependencies;
use crate::error::ContractViolation;
use crate::subscribers::Subscribers;
use crate::value::{Access, Value};
use crate::{tracking, Observable, Observer, Status, Version};

/// A memoized value derived from the observables its function reads.
///
/// Changes upstream only taint a computed; the function runs again when the
/// value is read and at least one dependency really produced a new value.
pub struct Computed<T>
where
	T: Clone + PartialEq + 'static,
{
	body: Rc<ComputedBody<T>>,
}

impl<T> Clone for Computed<T>
where
	T: Clone + PartialEq + 'static,
{
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

pub struct ComputedBody<T>
where
	T: Clone + PartialEq + 'static,
{
	func: Box<dyn Fn() -> T>,
	value: RefCell<Option<T>>,
	status: Cell<Status>,
	version: Cell<Version>,
	evaluating: Cell<bool>,
	cleanup_scheduled: Cell<bool>,
	subscribers: RefCell<Subscribers>,
	dependencies: RefCell<Dependencies>,
	this: Weak<ComputedBody<T>>,
}

impl<T> Drop for ComputedBody<T>
where
	T: Clone + PartialEq + 'static,
{
	fn drop(&mut self) {
		let observer = self.this.clone() as Weak<dyn Observer>;
		self.dependencies.get_mut().detach(&observer);
	}
}

#[track_caller]
pub fn computed<T>(func: impl Fn() -> T + 'static) -> Computed<T>
where
	T: Clone + PartialEq + 'static,
{
	Computed::new(func)
}

impl<T> Computed<T>
where
	T: Clone + PartialEq + 'static,
{
	#[track_caller]
	pub fn new(func: impl Fn() -> T + 'static) -> Self {
		if let Err(violation) =
			tracking::ensure_not_computing(ContractViolation::CreateDuringCompute("computed"))
		{
			violation.raise();
		}

		Computed {
			body: Rc::new_cyclic(|this| ComputedBody {
				func: Box::new(func),
				value: RefCell::new(None),
				status: Cell::new(Status::Dangling),
				version: Cell::new(Version::default()),
				evaluating: Cell::new(false),
				cleanup_scheduled: Cell::new(false),
				subscribers: RefCell::new(Subscribers::new()),
				dependencies: RefCell::new(Dependencies::new()),
				this: this.clone(),
			}),
		}
	}

	#[inline]
	pub fn current(&self) -> T {
		self.body.current()
	}

	#[inline]
	pub fn version(&self) -> Version {
		self.body.version.get()
	}

	#[inline]
	pub fn status(&self) -> Status {
		self.body.status.get()
	}

	pub fn subscriber_count(&self) -> usize {
		self.body.subscribers.borrow().len()
	}

	pub fn dependency_count(&self) -> usize {
		self.body.dependencies.borrow().len()
	}
}

/// Clears the re-entrancy flag even if the compute function unwinds.
struct Evaluating<'a>(&'a Cell<bool>);

impl Drop for Evaluating<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

impl<T> ComputedBody<T>
where
	T: Clone + PartialEq + 'static,
{
	fn current(&self) -> T {
		self.refresh();
		if let Some(this) = self.this.upgrade() {
			tracking::track(this, self.version.get());
		}

		match &*self.value.borrow() {
			Some(value) => value.clone(),
			None => unreachable!("computed value is always present after a refresh"),
		}
	}

	fn refresh(&self) {
		match self.status.get() {
			Status::NotChanged | Status::Suspended => {}
			Status::PossiblyChanged => {
				// Stays `Changed` if a dependency fails to refresh.
				self.status.set(Status::Changed);
				let dependencies = self.dependencies.borrow().clone();
				if dependencies.are_valid() {
					self.status.set(Status::NotChanged);
				} else {
					self.recompute();
				}
			}
			Status::Changed | Status::Dangling => self.recompute(),
		}
	}

	fn recompute(&self) {
		if self.evaluating.replace(true) {
			ContractViolation::CyclicDependency.raise();
		}
		let _evaluating = Evaluating(&self.evaluating);

		// A compute function that unwinds leaves the node `Changed`.
		self.status.set(Status::Changed);

		let observer = self.this.clone() as Weak<dyn Observer>;
		let value = tracking::evaluate(observer, &self.dependencies, || (self.func)());
		self.status.set(Status::NotChanged);

		let changed = self.value.borrow().as_ref() != Some(&value);
		if changed {
			*self.value.borrow_mut() = Some(value);
			self.version.set(self.version.get().next());
		}

		if self.subscribers.borrow().is_empty() {
			self.schedule_cleanup();
		}
	}

	fn schedule_cleanup(&self) {
		if !self.cleanup_scheduled.replace(true) {
			batch::schedule_cleanup(self.this.clone() as Weak<dyn Cleanup>);
		}
	}

	fn notify_possibly_changed(&self) {
		let subscribers = self.subscribers.borrow_mut().snapshot();
		for observer in subscribers {
			observer.mark_possibly_changed();
		}
	}
}

impl<T> Observable for ComputedBody<T>
where
	T: Clone + PartialEq + 'static,
{
	fn update(&self) -> Version {
		self.refresh();
		self.version.get()
	}

	fn version(&self) -> Version {
		self.version.get()
	}

	fn used_by(&self, observer: Weak<dyn Observer>) {
		self.subscribers.borrow_mut().add(observer);
	}

	fn not_used_by(&self, observer: &Weak<dyn Observer>) {
		let empty = {
			let mut subscribers = self.subscribers.borrow_mut();
			subscribers.remove(observer);
			subscribers.is_empty()
		};

		if empty {
			self.schedule_cleanup();
		}
	}
}

impl<T> Observer for ComputedBody<T>
where
	T: Clone + PartialEq + 'static,
{
	// A `Changed` node keeps forwarding: after a failed evaluation its
	// subscribers are clean again and must hear about the next change.
	fn mark_changed(self: Rc<Self>) {
		match self.status.get() {
			Status::NotChanged | Status::Changed => {
				self.status.set(Status::Changed);
				self.notify_possibly_changed();
			}
			Status::PossiblyChanged => self.status.set(Status::Changed),
			Status::Dangling | Status::Suspended => {}
		}
	}

	fn mark_possibly_changed(self: Rc<Self>) {
		match self.status.get() {
			Status::NotChanged => {
				self.status.set(Status::PossiblyChanged);
				self.notify_possibly_changed();
			}
			Status::Changed => self.notify_possibly_changed(),
			Status::PossiblyChanged | Status::Dangling | Status::Suspended => {}
		}
	}
}

impl<T> Cleanup for ComputedBody<T>
where
	T: Clone + PartialEq + 'static,
{
	/// Detaches from every dependency when nothing observes this node anymore.
	fn cleanup(&self) {
		self.cleanup_scheduled.set(false);
		if self.status.get() == Status::Dangling || !self.subscribers.borrow().is_empty() {
			return;
		}

		tracing::debug!("detaching computed without subscribers");
		let observer = self.this.clone() as Weak<dyn Observer>;
		let mut dependencies = std::mem::take(&mut *self.dependencies.borrow_mut());
		dependencies.detach(&observer);
		self.status.set(Status::Dangling);
	}
}

impl<T> Access<T> for ComputedBody<T>
where
	T: Clone + PartialEq + 'static,
{
	fn current(&self) -> T {
		ComputedBody::current(self)
	}

	fn as_observable(self: Rc<Self>) -> Rc<dyn Observable> {
		self
	}
}

impl<T> From<Computed<T>> for Value<T>
where
	T: Clone + PartialEq + 'static,
{
	fn from(computed: Computed<T>) -> Self {
		Value::new(computed.body)
	}
}

impl<T> From<&Computed<T>> for Value<T>
where
	T: Clone + PartialEq + 'static,
{
	fn from(computed: &Computed<T>) -> Self {
		Value::new(computed.body.clone())
	}
}

impl<T> Debug for Computed<T>
where
	T: Clone + PartialEq + Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Computed")
			.field("value", &*self.body.value.borrow())
			.field("status", &self.body.status.get())
			.finish()
	}
}
