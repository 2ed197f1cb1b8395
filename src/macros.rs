pub use enclose::*;

/// Builds a [`Computed`](crate::Computed), cloning the listed captures into
/// the compute function.
///
/// ```ignore
/// let total = computed!((price, count) => price.current() * count.current());
/// ```
#[macro_export]
macro_rules! computed {
	(( $($d_tt:tt)* ) => $($b:tt)*) => {
		$crate::Computed::new($crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
	};
	(=> $($b:tt)*) => {
		$crate::Computed::new(move || { $($b)* })
	};
}

/// Builds an [`Effect`](crate::Effect) on `trigger`, cloning the listed
/// captures into the effect function.
///
/// ```ignore
/// let log = effect!((node) total => |value: u32| node.set_data(value.to_string()));
/// ```
#[macro_export]
macro_rules! effect {
	(( $($d_tt:tt)* ) $trigger:expr => |$value:ident : $ty:ty| $($b:tt)*) => {
		$crate::Effect::new($trigger, $crate::macros::enclose!(($( $d_tt )*) move |$value: $ty| { $($b)* }))
	};
	($trigger:expr => |$value:ident : $ty:ty| $($b:tt)*) => {
		$crate::Effect::new($trigger, move |$value: $ty| { $($b)* })
	};
}

#[macro_export]
macro_rules! batch {
	(( $($d_tt:tt)* ) => $($b:tt)*) => {
		$crate::batch($crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
	};
	(=> $($b:tt)*) => {
		$crate::batch(move || { $($b)* })
	};
}
