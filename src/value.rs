use std::rc::Rc;

use crate::{Observable, Version};

/// Read access to an observable holding a `T`.
///
/// Reading through `current` while a compute function runs registers the
/// observable as a dependency of that computation.
pub trait Access<T>: Observable {
	fn current(&self) -> T;

	fn as_observable(self: Rc<Self>) -> Rc<dyn Observable>;
}

/// A type-erased handle to any observable of `T`: a [`Source`](crate::Source)
/// or a [`Computed`](crate::Computed).
pub struct Value<T> {
	value: Rc<dyn Access<T>>,
}

impl<T> Clone for Value<T> {
	fn clone(&self) -> Self {
		Value {
			value: self.value.clone(),
		}
	}
}

impl<T> Value<T>
where
	T: 'static,
{
	pub fn new(value: Rc<dyn Access<T>>) -> Self {
		Value { value }
	}

	#[inline]
	pub fn current(&self) -> T {
		self.value.current()
	}

	#[inline]
	pub fn version(&self) -> Version {
		self.value.version()
	}

	pub(crate) fn observable(&self) -> Rc<dyn Observable> {
		self.value.clone().as_observable()
	}
}
