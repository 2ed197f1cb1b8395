use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Weak;

use crate::error::ContractViolation;
use crate::tracking;

/// Something the flush loop runs, one at a time, in scheduling order.
pub(crate) trait Task {
	fn name(&self) -> &'static str;
	fn run(&self);
}

/// A node that may have lost all of its subscribers.
pub(crate) trait Cleanup {
	fn cleanup(&self);
}

thread_local! {
	static DEPTH: Cell<usize> = const { Cell::new(0) };
	static FLUSHING: Cell<bool> = const { Cell::new(false) };
	static TASKS: RefCell<VecDeque<Weak<dyn Task>>> = const { RefCell::new(VecDeque::new()) };
	static CLEANUPS: RefCell<Vec<Weak<dyn Cleanup>>> = const { RefCell::new(Vec::new()) };
}

pub fn in_batch() -> bool {
	DEPTH.with(|depth| depth.get() > 0)
}

/// Runs `func` with effect execution deferred until the outermost batch exits.
#[track_caller]
pub fn batch<R>(func: impl FnOnce() -> R) -> R {
	match try_batch(func) {
		Ok(value) => value,
		Err(violation) => violation.raise(),
	}
}

pub fn try_batch<R>(func: impl FnOnce() -> R) -> Result<R, ContractViolation> {
	tracking::ensure_not_computing(ContractViolation::BatchDuringCompute)?;

	let depth = Depth::enter();
	let value = func();
	if depth.exit() == 0 {
		flush();
	}

	Ok(value)
}

/// Keeps the batch depth balanced when the batched function unwinds.
struct Depth {
	done: bool,
}

impl Depth {
	fn enter() -> Self {
		DEPTH.with(|depth| depth.set(depth.get() + 1));
		Depth { done: false }
	}

	fn exit(mut self) -> usize {
		self.done = true;
		DEPTH.with(|depth| {
			let left = depth.get() - 1;
			depth.set(left);
			left
		})
	}
}

impl Drop for Depth {
	fn drop(&mut self) {
		if !self.done {
			DEPTH.with(|depth| depth.set(depth.get() - 1));
		}
	}
}

pub(crate) fn schedule(task: Weak<dyn Task>) {
	TASKS.with(|tasks| tasks.borrow_mut().push_back(task));
}

pub(crate) fn schedule_cleanup(node: Weak<dyn Cleanup>) {
	CLEANUPS.with(|cleanups| cleanups.borrow_mut().push(node));
}

/// Flushes right away unless a batch (or a flush) is already open.
pub(crate) fn flush_unless_batching() {
	if !in_batch() {
		flush();
	}
}

fn next_task() -> Option<Weak<dyn Task>> {
	TASKS.with(|tasks| tasks.borrow_mut().pop_front())
}

fn take_cleanups() -> Vec<Weak<dyn Cleanup>> {
	CLEANUPS.with(|cleanups| std::mem::take(&mut *cleanups.borrow_mut()))
}

/// Drains the task queue and the cleanup queue until both stay empty.
///
/// The loop runs as a batch of its own, so changes made by effects only
/// enqueue more work for this loop instead of flushing recursively.
pub(crate) fn flush() {
	if FLUSHING.with(|flushing| flushing.replace(true)) {
		return;
	}

	let _flushing = Flushing;
	let _depth = Depth::enter();
	let _span = tracing::trace_span!("flush").entered();

	loop {
		let mut progressed = false;

		while let Some(task) = next_task() {
			progressed = true;
			if let Some(task) = task.upgrade() {
				run_guarded(&*task);
			}
		}

		let cleanups = take_cleanups();
		for node in cleanups {
			progressed = true;
			if let Some(node) = node.upgrade() {
				node.cleanup();
			}
		}

		if !progressed {
			break;
		}
	}
}

struct Flushing;

impl Drop for Flushing {
	fn drop(&mut self) {
		FLUSHING.with(|flushing| flushing.set(false));
	}
}

fn run_guarded(task: &dyn Task) {
	tracing::trace!(task = task.name(), "running");
	let result = panic::catch_unwind(AssertUnwindSafe(|| task.run()));
	if let Err(payload) = result {
		let message = payload
			.downcast_ref::<&str>()
			.copied()
			.or_else(|| payload.downcast_ref::<String>().map(String::as_str))
			.unwrap_or("<non-string panic payload>");
		tracing::error!(task = task.name(), "effect failed: {}", message);
	}
}
