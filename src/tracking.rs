use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::dependencies::{Dependencies, Dependency};
use crate::error::ContractViolation;
use crate::{Observable, Observer, Version};

thread_local! {
	static STACK: RefCell<Vec<Evaluation>> = const { RefCell::new(Vec::new()) };
}

/// One running compute function and what it has read so far.
struct Evaluation {
	observer: Weak<dyn Observer>,
	dependencies: Dependencies,
	cursor: usize,
	diverged: bool,
	fresh: SmallVec<[Dependency; 4]>,
	seen: FxHashSet<usize>,
}

impl Evaluation {
	fn new(observer: Weak<dyn Observer>, dependencies: Dependencies) -> Self {
		Evaluation {
			observer,
			dependencies,
			cursor: 0,
			diverged: false,
			fresh: SmallVec::new(),
			seen: FxHashSet::default(),
		}
	}

	fn read(&mut self, node: Rc<dyn Observable>, version: Version) {
		let addr = crate::addr::thin(Rc::as_ptr(&node));
		if !self.seen.insert(addr) {
			return;
		}

		// Once the reads leave the recorded order, the rest of the list is
		// rebuilt from `fresh` so it stays in read order.
		if !self.diverged {
			match self.dependencies.get_mut(self.cursor) {
				Some(dependency) if dependency.node.addr() == addr => {
					dependency.version = version;
					self.cursor += 1;
					return;
				}
				_ => self.diverged = true,
			}
		}

		self.fresh.push(Dependency::new(node, version));
	}

	fn finish(self) -> Dependencies {
		let Evaluation {
			observer,
			mut dependencies,
			cursor,
			fresh,
			..
		} = self;
		dependencies.merge(cursor, fresh, &observer);
		dependencies
	}

	/// A failed run keeps every previous dependency and adds what it read
	/// before failing, so a change to any of them retries the computation.
	fn fail(self) -> Dependencies {
		let Evaluation {
			observer,
			mut dependencies,
			fresh,
			..
		} = self;
		dependencies.append(fresh, &observer);
		dependencies
	}
}

/// Pops the evaluation on unwind so a panicking compute function does not
/// leave the tracking stack pointing at a dead frame.
struct Frame<'a> {
	target: &'a RefCell<Dependencies>,
	done: bool,
}

impl Frame<'_> {
	fn finish(mut self) {
		self.done = true;
		*self.target.borrow_mut() = pop().finish();
	}
}

impl Drop for Frame<'_> {
	fn drop(&mut self) {
		if !self.done {
			*self.target.borrow_mut() = pop().fail();
		}
	}
}

fn pop() -> Evaluation {
	STACK.with(|stack| match stack.borrow_mut().pop() {
		Some(evaluation) => evaluation,
		None => unreachable!("tracking stack underflow"),
	})
}

/// True while a compute function is executing on this thread.
pub fn is_computing() -> bool {
	STACK.with(|stack| !stack.borrow().is_empty())
}

pub(crate) fn ensure_not_computing(violation: ContractViolation) -> Result<(), ContractViolation> {
	if is_computing() {
		Err(violation)
	} else {
		Ok(())
	}
}

/// Registers `node` as a dependency of the innermost running evaluation, if any.
pub(crate) fn track(node: Rc<dyn Observable>, version: Version) {
	STACK.with(|stack| {
		if let Some(top) = stack.borrow_mut().last_mut() {
			top.read(node, version);
		}
	})
}

/// Runs `func` with `observer` as the tracking target. `dependencies` holds
/// the list recorded by the previous run and receives the merged one, also
/// when `func` unwinds.
pub(crate) fn evaluate<R>(
	observer: Weak<dyn Observer>,
	dependencies: &RefCell<Dependencies>,
	func: impl FnOnce() -> R,
) -> R {
	let previous = dependencies.borrow().clone();
	STACK.with(|stack| {
		stack
			.borrow_mut()
			.push(Evaluation::new(observer, previous))
	});

	let frame = Frame {
		target: dependencies,
		done: false,
	};
	let value = func();
	frame.finish();
	value
}
