use std::cell::RefCell;
use std::rc::Rc;

use splice::macros::enclose;
use splice::{computed, effect, list_source, ListObserver, ListSource, Source};

mod mock;

use mock::Spy;

struct Recorder(mock::SharedMock);

impl ListObserver<String> for Recorder {
	fn on_insert(&self, index: usize, item: &Source<String>) {
		self.0.get().inserted(index, item.current());
	}

	fn on_move(&self, from: usize, to: usize) {
		self.0.get().moved(from, to);
	}

	fn on_remove(&self, index: usize) {
		self.0.get().removed(index);
	}
}

fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| value.to_string()).collect()
}

fn observed(values: &[&str]) -> (ListSource<String>, mock::SharedMock) {
	let list = list_source(strings(values));
	let mock = mock::SharedMock::new();
	let _subscription = list.subscribe(Rc::new(Recorder(mock.clone())));
	(list, mock)
}

#[test]
fn move_item_reorders_and_notifies_once() {
	let (list, mock) = observed(&["1", "2", "3"]);
	mock.get().expect_moved().withf(|from, to| (*from, *to) == (0, 2)).times(1).return_const(());

	list.move_item(0, 2);

	assert_eq!(list.current(), strings(&["2", "3", "1"]));
	mock.get().checkpoint();
}

#[test]
fn change_to_a_rotation_is_a_single_move() {
	let (list, mock) = observed(&["1", "2", "3"]);
	mock.get().expect_moved().withf(|from, to| (*from, *to) == (2, 0)).times(1).return_const(());
	mock.get().expect_inserted().times(0);
	mock.get().expect_removed().times(0);

	list.change(strings(&["3", "1", "2"]));

	assert_eq!(list.current(), strings(&["3", "1", "2"]));
	mock.get().checkpoint();
}

#[test]
fn change_removes_then_inserts() {
	let (list, mock) = observed(&["1", "2", "3"]);
	let mut seq = mockall::Sequence::new();
	mock.get()
		.expect_removed()
		.withf(|index| *index == 0)
		.times(1)
		.in_sequence(&mut seq)
		.return_const(());
	mock.get()
		.expect_removed()
		.withf(|index| *index == 1)
		.times(1)
		.in_sequence(&mut seq)
		.return_const(());
	mock.get()
		.expect_inserted()
		.withf(|index, value| *index == 1 && value == "4")
		.times(1)
		.in_sequence(&mut seq)
		.return_const(());

	list.change(strings(&["2", "4"]));

	assert_eq!(list.current(), strings(&["2", "4"]));
	mock.get().checkpoint();
}

#[test]
fn duplicates_match_the_first_remaining_occurrence() {
	let (list, mock) = observed(&["a", "a", "b"]);
	let first_a = list.item(0).unwrap();
	mock.get().expect_moved().withf(|from, to| (*from, *to) == (2, 0)).times(1).return_const(());
	mock.get().expect_removed().withf(|index| *index == 2).times(1).return_const(());

	list.change(strings(&["b", "a"]));

	assert_eq!(list.current(), strings(&["b", "a"]));
	first_a.change("first".to_string());
	assert_eq!(list.current(), strings(&["b", "first"]));
	mock.get().checkpoint();
}

#[test]
fn out_of_range_edits_are_ignored() {
	let (list, _mock) = observed(&["1"]);
	list.move_item(0, 3);
	list.move_item(4, 0);
	list.remove_item(1);
	assert_eq!(list.current(), strings(&["1"]));
}

#[test]
fn insert_item_clamps_the_index() {
	let (list, mock) = observed(&["1"]);
	mock.get()
		.expect_inserted()
		.withf(|index, value| *index == 1 && value == "2")
		.times(1)
		.return_const(());

	list.insert_item(10, "2".to_string());
	assert_eq!(list.current(), strings(&["1", "2"]));
	mock.get().checkpoint();
}

#[test]
fn current_is_tracked() {
	let list = list_source(strings(&["a"]));
	let joined = computed(enclose!((list) move || list.current().join(",")));

	let seen = Rc::new(RefCell::new(Vec::new()));
	let _effect = effect(
		&joined,
		enclose!((seen) move |value: String| seen.borrow_mut().push(value)),
	);

	list.push("b".to_string());
	list.item(0).unwrap().change("A".to_string());
	list.move_item(1, 0);
	list.remove_item(0);

	assert_eq!(*seen.borrow(), strings(&["a", "a,b", "A,b", "b,A", "A"]));
}

#[test]
fn cancelled_subscriptions_hear_nothing() {
	let list = list_source(strings(&["1"]));
	let mock = mock::SharedMock::new();
	let subscription = list.subscribe(Rc::new(Recorder(mock.clone())));
	assert_eq!(list.observer_count(), 1);

	subscription.cancel();
	assert_eq!(list.observer_count(), 0);

	list.push("2".to_string());
	list.remove_item(0);
	mock.get().checkpoint();
}
