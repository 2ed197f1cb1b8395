use thiserror::Error;

/// A programmer error detected at the call site.
///
/// These are never retried and never swallowed. The panicking APIs of the
/// crate raise them with their `Display` message; the `try_*` variants hand
/// them back instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
	#[error("cannot change a source while a computed value is being evaluated")]
	ChangeDuringCompute,

	#[error("cannot create a {0} while a computed value is being evaluated")]
	CreateDuringCompute(&'static str),

	#[error("cannot start a batch while a computed value is being evaluated")]
	BatchDuringCompute,

	#[error("cannot suspend an effect while a computed value is being evaluated")]
	SuspendDuringCompute,

	#[error("computed value depends on itself")]
	CyclicDependency,

	#[error("cannot insert a node after an anchor that has no parent")]
	DetachedAnchor,
}

impl ContractViolation {
	#[track_caller]
	pub(crate) fn raise(self) -> ! {
		panic!("{}", self)
	}
}
