/// Callbacks a placeholder drives for the things rendered into it.
///
/// `mount` and `unmount` run top-down as the owning tree is attached and
/// detached; `dispose` runs once when the owner throws its content away.
pub trait Lifecycle {
	fn mount(&self) {}
	fn unmount(&self) {}
	fn dispose(&self) {}
}

/// A lifecycle assembled from closures.
#[derive(Default)]
pub struct Hooks {
	on_mount: Option<Box<dyn Fn()>>,
	on_unmount: Option<Box<dyn Fn()>>,
	on_dispose: Option<Box<dyn Fn()>>,
}

pub fn lifecycle() -> Hooks {
	Hooks::default()
}

impl Hooks {
	pub fn on_mount(mut self, func: impl Fn() + 'static) -> Self {
		self.on_mount = Some(Box::new(func));
		self
	}

	pub fn on_unmount(mut self, func: impl Fn() + 'static) -> Self {
		self.on_unmount = Some(Box::new(func));
		self
	}

	pub fn on_dispose(mut self, func: impl Fn() + 'static) -> Self {
		self.on_dispose = Some(Box::new(func));
		self
	}
}

impl Lifecycle for Hooks {
	fn mount(&self) {
		if let Some(func) = &self.on_mount {
			func()
		}
	}

	fn unmount(&self) {
		if let Some(func) = &self.on_unmount {
			func()
		}
	}

	fn dispose(&self) {
		if let Some(func) = &self.on_dispose {
			func()
		}
	}
}
