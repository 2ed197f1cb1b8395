use std::rc::{Rc, Weak};

use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::addr::RcAddr;
use crate::{Observable, Observer, Version};

#[derive(Clone)]
pub struct Dependency {
	pub(crate) node: RcAddr<dyn Observable>,
	pub(crate) version: Version,
}

impl Dependency {
	pub(crate) fn new(node: Rc<dyn Observable>, version: Version) -> Self {
		Dependency {
			node: RcAddr::new(node),
			version,
		}
	}
}

/// The observables a derived node read during its last evaluation, in the
/// order they were read, together with the version each one had at the time.
#[derive(Clone, Default)]
pub struct Dependencies {
	list: SmallVec<[Dependency; 4]>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self {
			list: SmallVec::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.list.len()
	}

	pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Dependency> {
		self.list.get_mut(index)
	}

	/// Brings every dependency up to date in read order and reports whether all
	/// of them still have the version this node saw. Stops at the first one
	/// that moved on.
	pub fn are_valid(&self) -> bool {
		self.list
			.iter()
			.all(|dependency| dependency.node.update() == dependency.version)
	}

	/// Unsubscribes `observer` from everything and forgets the list.
	pub fn detach(&mut self, observer: &Weak<dyn Observer>) {
		for dependency in self.list.drain(..) {
			dependency.node.not_used_by(observer);
		}
	}

	/// Subscribes to and appends the entries of `fresh` that are not in the
	/// list yet.
	pub(crate) fn append(
		&mut self,
		fresh: SmallVec<[Dependency; 4]>,
		observer: &Weak<dyn Observer>,
	) {
		let known: FxHashSet<usize> = self.list.iter().map(|d| d.node.addr()).collect();
		for dependency in fresh {
			if !known.contains(&dependency.node.addr()) {
				dependency.node.used_by(observer.clone());
				self.list.push(dependency);
			}
		}
	}

	/// Finishes an evaluation: the first `cursor` entries were read again in
	/// the same order and stay subscribed, `fresh` holds everything read after
	/// that, in read order. The list becomes `list[..cursor] ++ fresh`; entries
	/// past the cursor that were not read again are unsubscribed.
	pub(crate) fn merge(
		&mut self,
		cursor: usize,
		fresh: SmallVec<[Dependency; 4]>,
		observer: &Weak<dyn Observer>,
	) {
		if cursor == self.list.len() && fresh.is_empty() {
			return;
		}

		let stale: SmallVec<[Dependency; 4]> = self.list.drain(cursor..).collect();
		let fresh_addrs: FxHashSet<usize> = fresh.iter().map(|d| d.node.addr()).collect();
		let stale_addrs: FxHashSet<usize> = stale.iter().map(|d| d.node.addr()).collect();

		for dependency in &stale {
			if !fresh_addrs.contains(&dependency.node.addr()) {
				dependency.node.not_used_by(observer);
			}
		}

		for dependency in fresh {
			if !stale_addrs.contains(&dependency.node.addr()) {
				dependency.node.used_by(observer.clone());
			}
			self.list.push(dependency);
		}
	}
}
