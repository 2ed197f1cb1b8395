use std::cell::Cell;
use std::rc::Rc;

use splice::macros::enclose;
use splice::{
	batch, component, computed, list_source, mount_root, re_if, re_list, re_text, source, Lifecycle,
	Node, Place, Renderer, Source,
};

mod mock;

use mock::Spy;

fn expect_text_update(mock: &mock::SharedMock, count: u64) {
	mock.get()
		.expect_trigger()
		.withf(move |value| *value == count)
		.times(1)
		.return_const(());
}

#[test]
fn counter_updates_text_and_swaps_branch() {
	mock::init_tracing();

	let counter = source(0u64);
	let texts = mock::SharedMock::new();
	let message = computed(enclose!((counter, texts) move || {
		let count = counter.current();
		texts.get().trigger(count);
		format!("Hello world {} times!", count)
	}));
	let even = counter.map(|count| count % 2 == 0);
	let renders = Rc::new(Cell::new(0));

	let root = Node::element("div");
	expect_text_update(&texts, 0);
	let app = mount_root(
		&root,
		component(enclose!((message, even, renders) move |r: &mut Renderer| {
			let paragraph = r.insert_node(Node::element("p"));
			let mut inside = r.create_renderer_at(Place::ParentContainer(paragraph));
			re_text(&mut inside, &message);

			re_if(
				r,
				&even,
				enclose!((renders) move || {
					renders.set(renders.get() + 1);
					Some(component(|r: &mut Renderer| {
						r.insert_node(Node::text("Even!"));
					}))
				}),
				enclose!((renders) move || {
					renders.set(renders.get() + 1);
					Some(component(|r: &mut Renderer| {
						r.insert_node(Node::text("Odd!"));
					}))
				}),
			);
		})),
	);

	assert_eq!(root.to_html(), "<div><p>Hello world 0 times!</p>Even!</div>");
	assert_eq!(renders.get(), 1);
	texts.get().checkpoint();

	let text = root.first_child().and_then(|p| p.first_child()).unwrap();
	let branch = root.last_child().unwrap();

	expect_text_update(&texts, 1);
	counter.change(1);
	assert_eq!(root.to_html(), "<div><p>Hello world 1 times!</p>Odd!</div>");
	assert_eq!(renders.get(), 2);
	texts.get().checkpoint();

	// The text node is updated in place, the branch is replaced.
	assert!(text.ptr_eq(&root.first_child().and_then(|p| p.first_child()).unwrap()));
	assert!(!branch.ptr_eq(&root.last_child().unwrap()));
	assert!(branch.parent_node().is_none());

	expect_text_update(&texts, 2);
	counter.change(2);
	assert_eq!(root.to_html(), "<div><p>Hello world 2 times!</p>Even!</div>");
	assert_eq!(renders.get(), 3);
	texts.get().checkpoint();

	// Several increments in one batch update the page once.
	expect_text_update(&texts, 4);
	batch(|| {
		counter.change(3);
		counter.change(4);
	});
	assert_eq!(root.to_html(), "<div><p>Hello world 4 times!</p>Even!</div>");
	assert_eq!(renders.get(), 3);
	texts.get().checkpoint();

	app.dispose();
	assert_eq!(counter.subscriber_count(), 0);

	texts.get().expect_trigger().times(0).return_const(());
	counter.change(5);
	assert_eq!(root.to_html(), "<div><p>Hello world 4 times!</p>Even!</div>");
	assert_eq!(renders.get(), 3);
	texts.get().checkpoint();
}

#[test]
fn bound_list_follows_its_source() {
	let todos = list_source(["a", "b"].map(String::from));
	let root = Node::element("ul");

	let _app = mount_root(
		&root,
		component(enclose!((todos) move |r: &mut Renderer| {
			re_list(r, &todos, |item: &Source<String>| {
				let item = item.clone();
				Some(component(move |r: &mut Renderer| {
					let li = r.insert_node(Node::element("li"));
					let mut inside = r.create_renderer_at(Place::ParentContainer(li));
					re_text(&mut inside, &item);
				}))
			});
		})),
	);
	assert_eq!(root.to_html(), "<ul><li>a</li><li>b</li></ul>");

	todos.push("c".to_string());
	assert_eq!(root.to_html(), "<ul><li>a</li><li>b</li><li>c</li></ul>");

	todos.move_item(2, 0);
	assert_eq!(root.text_content(), "cab");

	todos.item(1).unwrap().change("A".to_string());
	assert_eq!(root.text_content(), "cAb");

	todos.change(["b", "c"].map(String::from).to_vec());
	assert_eq!(root.to_html(), "<ul><li>b</li><li>c</li></ul>");

	todos.remove_item(0);
	assert_eq!(root.to_html(), "<ul><li>c</li></ul>");
	assert_eq!(todos.observer_count(), 1);
}

#[test]
fn disposing_the_root_detaches_list_bindings() {
	let todos = list_source(vec![1u32, 2]);
	let root = Node::element("ol");

	let app = mount_root(
		&root,
		component(enclose!((todos) move |r: &mut Renderer| {
			re_list(r, &todos, |item: &Source<u32>| {
				let label = item.map(|value| value.to_string());
				Some(component(move |r: &mut Renderer| {
					re_text(r, &label);
				}))
			});
		})),
	);
	assert_eq!(root.text_content(), "12");

	app.dispose();
	assert_eq!(todos.observer_count(), 0);

	todos.push(3);
	todos.item(0).unwrap().change(10);
	assert_eq!(root.text_content(), "12");
}
