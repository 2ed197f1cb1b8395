use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::batch::{self, Task};
use crate::error::ContractViolation;
use crate::lifecycle::Lifecycle;
use crate::value::Value;
use crate::{tracking, Observable, Observer, Status, Version};

/// Runs a side effect whenever its trigger produces a new value.
///
/// The effect is scheduled on creation and subscribes to the trigger the first
/// time the task queue runs it. Dropping the last handle detaches it.
#[derive(Clone)]
pub struct Effect {
	pub(crate) body: Rc<EffectBody>,
}

pub struct EffectBody {
	name: &'static str,
	status: Cell<Status>,
	subscribed: Cell<bool>,
	scheduled: Cell<bool>,
	terminated: Cell<bool>,
	seen: Cell<Option<Version>>,
	trigger: Rc<dyn Observable>,
	func: RefCell<Box<dyn FnMut()>>,
	this: Weak<EffectBody>,
}

impl Drop for EffectBody {
	fn drop(&mut self) {
		if self.subscribed.get() {
			let observer = self.this.clone() as Weak<dyn Observer>;
			self.trigger.not_used_by(&observer);
		}
	}
}

#[track_caller]
#[must_use]
pub fn effect<T>(trigger: impl Into<Value<T>>, func: impl FnMut(T) + 'static) -> Effect
where
	T: 'static,
{
	Effect::new(trigger, func)
}

impl Effect {
	#[track_caller]
	#[must_use]
	pub fn new<T>(trigger: impl Into<Value<T>>, func: impl FnMut(T) + 'static) -> Self
	where
		T: 'static,
	{
		Self::new_with_name("<unnamed>", trigger, func)
	}

	#[track_caller]
	#[must_use]
	pub fn new_with_name<T>(
		name: &'static str,
		trigger: impl Into<Value<T>>,
		mut func: impl FnMut(T) + 'static,
	) -> Self
	where
		T: 'static,
	{
		if let Err(violation) =
			tracking::ensure_not_computing(ContractViolation::CreateDuringCompute("effect"))
		{
			violation.raise();
		}

		let trigger = trigger.into();
		let observable = trigger.observable();
		let effect = Effect {
			body: Rc::new_cyclic(|this| EffectBody {
				name,
				status: Cell::new(Status::Changed),
				subscribed: Cell::new(false),
				scheduled: Cell::new(false),
				terminated: Cell::new(false),
				seen: Cell::new(None),
				trigger: observable,
				func: RefCell::new(Box::new(move || func(trigger.current()))),
				this: this.clone(),
			}),
		};

		effect.body.schedule();
		batch::flush_unless_batching();
		effect
	}

	pub fn name(&self) -> &'static str {
		self.body.name
	}

	pub fn status(&self) -> Status {
		self.body.status.get()
	}

	pub fn is_terminated(&self) -> bool {
		self.body.terminated.get()
	}

	#[track_caller]
	pub fn suspend(&self) {
		if let Err(violation) = self.try_suspend() {
			violation.raise();
		}
	}

	/// Detaches from the trigger and ignores notifications until resumed.
	pub fn try_suspend(&self) -> Result<(), ContractViolation> {
		tracking::ensure_not_computing(ContractViolation::SuspendDuringCompute)?;
		self.body.detach();
		self.body.status.set(Status::Suspended);
		Ok(())
	}

	/// Reconnects a suspended effect. It runs again if the trigger moved on
	/// while it was suspended.
	pub fn resume(&self) {
		if self.body.terminated.get() || self.body.status.get() != Status::Suspended {
			return;
		}

		self.body.status.set(Status::Changed);
		self.body.schedule();
		batch::flush_unless_batching();
	}

	/// Suspends for good. The trigger may lose its last subscriber, so a
	/// cleanup pass is flushed unless a batch is open.
	#[track_caller]
	pub fn unsubscribe(&self) {
		self.suspend();
		self.body.terminated.set(true);
		batch::flush_unless_batching();
	}
}

impl EffectBody {
	fn schedule(&self) {
		if !self.scheduled.replace(true) {
			batch::schedule(self.this.clone() as Weak<dyn Task>);
		}
	}

	fn detach(&self) {
		if self.subscribed.replace(false) {
			let observer = self.this.clone() as Weak<dyn Observer>;
			self.trigger.not_used_by(&observer);
		}
	}

	fn mark(&self, status: Status) {
		match self.status.get() {
			Status::Suspended => {}
			Status::NotChanged => {
				self.status.set(status);
				self.schedule();
			}
			Status::PossiblyChanged if status == Status::Changed => self.status.set(status),
			_ => {}
		}
	}
}

impl Task for EffectBody {
	fn name(&self) -> &'static str {
		self.name
	}

	fn run(&self) {
		self.scheduled.set(false);
		if self.status.get() == Status::Suspended {
			return;
		}

		if !self.subscribed.replace(true) {
			self.trigger.used_by(self.this.clone() as Weak<dyn Observer>);
		}

		// Clean before pulling, so a trigger that fails to compute still lets
		// the next change reschedule this effect.
		self.status.set(Status::NotChanged);
		let version = self.trigger.update();
		if self.seen.replace(Some(version)) == Some(version) {
			return;
		}

		let mut func = self.func.borrow_mut();
		(*func)();
	}
}

impl Observer for EffectBody {
	fn mark_changed(self: Rc<Self>) {
		self.mark(Status::Changed);
	}

	fn mark_possibly_changed(self: Rc<Self>) {
		self.mark(Status::PossiblyChanged);
	}
}

impl Lifecycle for Effect {
	fn dispose(&self) {
		self.unsubscribe();
	}
}

impl std::fmt::Debug for Effect {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Effect")
			.field("name", &self.body.name)
			.field("status", &self.body.status.get())
			.finish()
	}
}
