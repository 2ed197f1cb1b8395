use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Compares trait objects by the address of their allocation only.
///
/// Fat pointers to the same allocation may carry different vtables, so the
/// metadata is dropped before comparing.
pub(crate) fn thin<T: ?Sized>(ptr: *const T) -> usize {
	ptr as *const () as usize
}

pub struct RcAddr<T: ?Sized> {
	ptr: Rc<T>,
}

impl<T: ?Sized> RcAddr<T> {
	pub fn new(ptr: Rc<T>) -> Self {
		RcAddr { ptr }
	}

	pub fn addr(&self) -> usize {
		thin(Rc::as_ptr(&self.ptr))
	}
}

impl<T: ?Sized> Clone for RcAddr<T> {
	fn clone(&self) -> Self {
		RcAddr {
			ptr: self.ptr.clone(),
		}
	}
}

impl<T: ?Sized> Deref for RcAddr<T> {
	type Target = Rc<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for RcAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: ?Sized> Eq for RcAddr<T> {}

pub struct WeakAddr<T: ?Sized> {
	ptr: Weak<T>,
}

impl<T: ?Sized> WeakAddr<T> {
	pub fn new(ptr: Weak<T>) -> Self {
		WeakAddr { ptr }
	}

	pub fn addr(&self) -> usize {
		thin(Weak::as_ptr(&self.ptr))
	}

	pub fn is_alive(&self) -> bool {
		self.ptr.strong_count() > 0
	}
}

impl<T: ?Sized> Clone for WeakAddr<T> {
	fn clone(&self) -> Self {
		WeakAddr {
			ptr: self.ptr.clone(),
		}
	}
}

impl<T: ?Sized> Deref for WeakAddr<T> {
	type Target = Weak<T>;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<T: ?Sized> PartialEq for WeakAddr<T> {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: ?Sized> Eq for WeakAddr<T> {}
