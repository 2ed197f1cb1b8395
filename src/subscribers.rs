use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::addr::WeakAddr;
use crate::Observer;

/// The observers that must hear about a node's changes, in subscription order.
#[derive(Default)]
pub(crate) struct Subscribers {
	list: SmallVec<[WeakAddr<dyn Observer>; 2]>,
}

impl Subscribers {
	pub fn new() -> Self {
		Subscribers {
			list: SmallVec::new(),
		}
	}

	pub fn add(&mut self, observer: Weak<dyn Observer>) {
		let observer = WeakAddr::new(observer);
		if !self.list.contains(&observer) {
			self.list.push(observer);
		}
	}

	pub fn remove(&mut self, observer: &Weak<dyn Observer>) {
		let observer = WeakAddr::new(observer.clone());
		self.list.retain(|item| *item != observer);
	}

	/// True when no live observer is left.
	pub fn is_empty(&self) -> bool {
		!self.list.iter().any(WeakAddr::is_alive)
	}

	/// Upgrades every live observer and forgets the dead ones.
	///
	/// Callers notify the returned list without holding a borrow of `self`,
	/// since notification can re-enter the graph.
	pub fn snapshot(&mut self) -> SmallVec<[Rc<dyn Observer>; 4]> {
		self.list.retain(|item| item.is_alive());
		self.list.iter().filter_map(|item| item.upgrade()).collect()
	}

	pub fn len(&self) -> usize {
		self.list.iter().filter(|item| item.is_alive()).count()
	}
}
