pub mod macros;

mod addr;
mod batch;
mod bindings;
mod computed;
mod dependencies;
pub mod dom;
mod effect;
mod error;
mod lifecycle;
mod list;
mod list_source;
pub mod place;
mod placeholder;
mod source;
mod subscribers;
mod tracking;
mod value;

use std::rc::{Rc, Weak};

pub use batch::{batch, in_batch, try_batch};
pub use bindings::{re_content, re_if, re_list, re_text};
pub use computed::{computed, Computed};
pub use dom::Node;
pub use effect::{effect, Effect};
pub use error::ContractViolation;
pub use lifecycle::{lifecycle, Hooks, Lifecycle};
pub use list::PlaceholderList;
pub use list_source::{list_source, ListObserver, ListSource, ListSubscription};
pub use place::{DomPlace, Place};
pub use placeholder::{component, mount_root, Placeholder, PlaceholderComponent, Renderer};
pub use source::{source, Source};
pub use tracking::is_computing;
pub use value::{Access, Value};

/// Receives change notifications from the observables it depends on.
pub trait Observer: 'static {
	/// A direct dependency definitely changed.
	fn mark_changed(self: Rc<Self>);

	/// Something further upstream changed; a dependency may or may not
	/// produce a new value once it is read.
	fn mark_possibly_changed(self: Rc<Self>);
}

pub trait Observable: 'static {
	/// Brings this observable up to date, recomputing it if needed,
	/// and returns the resulting version.
	fn update(&self) -> Version;

	/// The version as of now, without recomputing.
	fn version(&self) -> Version;

	/// Notify this observable that `observer` started to listen.
	fn used_by(&self, observer: Weak<dyn Observer>);

	/// Notify this observable that `observer` stopped to listen.
	fn not_used_by(&self, observer: &Weak<dyn Observer>);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
	/// Settled: the cached value is current.
	NotChanged,
	/// Something upstream changed; dependencies must be checked on read.
	PossiblyChanged,
	/// A direct dependency changed or the last evaluation failed; the next
	/// read recomputes.
	Changed,
	/// Not wired into the graph; the next read computes from scratch.
	Dangling,
	/// Effects only: detached from the trigger, ignoring notifications.
	Suspended,
}

/// Bumped every time an observable's value actually changes.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Version(u64);

impl Version {
	pub(crate) fn next(self) -> Version {
		Version(self.0 + 1)
	}
}
