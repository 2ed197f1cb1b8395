use std::sync::{Arc, Mutex, MutexGuard};

use mockall::*;

#[automock]
pub trait Spy {
	fn trigger(&self, value: u64);
	fn inserted(&self, index: usize, value: String);
	fn moved(&self, from: usize, to: usize);
	fn removed(&self, index: usize);
}

#[allow(dead_code)]
#[derive(Clone)]
pub struct SharedMock(Arc<Mutex<MockSpy>>);

#[allow(dead_code)]
impl SharedMock {
	pub fn new() -> SharedMock {
		SharedMock(Arc::new(Mutex::new(MockSpy::new())))
	}

	pub fn get<'a>(&'a self) -> MutexGuard<'a, MockSpy> {
		return self.0.lock().unwrap();
	}
}

/// Records lifecycle callbacks in the order they happen.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct Journal(std::rc::Rc<std::cell::RefCell<Vec<String>>>);

#[allow(dead_code)]
impl Journal {
	pub fn push(&self, entry: impl Into<String>) {
		self.0.borrow_mut().push(entry.into());
	}

	pub fn take(&self) -> Vec<String> {
		std::mem::take(&mut *self.0.borrow_mut())
	}

	pub fn hooks(&self, name: &str) -> splice::Hooks {
		let (mount, unmount, dispose) = (self.clone(), self.clone(), self.clone());
		let (a, b, c) = (
			format!("mount {}", name),
			format!("unmount {}", name),
			format!("dispose {}", name),
		);
		splice::lifecycle()
			.on_mount(move || mount.push(a.clone()))
			.on_unmount(move || unmount.push(b.clone()))
			.on_dispose(move || dispose.push(c.clone()))
	}
}

#[allow(dead_code)]
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::TRACE)
		.try_init();
}
