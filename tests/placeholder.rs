use std::cell::RefCell;
use std::rc::Rc;

use splice::macros::enclose;
use splice::{
	component, mount_root, Lifecycle, Node, Place, Placeholder, PlaceholderComponent, Renderer,
};

mod mock;

use mock::Journal;

fn text(value: &str) -> Option<PlaceholderComponent> {
	let value = value.to_string();
	Some(component(move |r: &mut Renderer| {
		r.insert_node(Node::text(value));
	}))
}

#[test]
fn replacing_content_unmounts_and_disposes_before_mounting() {
	let root = Node::element("div");
	let journal = Journal::default();

	let placeholder = mount_root(
		&root,
		component(enclose!((journal) move |r: &mut Renderer| {
			r.insert_node(Node::text("old"));
			r.register_lifecycle(Rc::new(journal.hooks("a")));
			r.register_lifecycle(Rc::new(journal.hooks("b")));
		})),
	);
	assert_eq!(journal.take(), ["mount a", "mount b"]);
	assert_eq!(root.to_html(), "<div>old</div>");

	placeholder.replace_content(Some(component(enclose!((journal) move |r: &mut Renderer| {
		journal.push("render new");
		r.insert_node(Node::text("new"));
		r.register_lifecycle(Rc::new(journal.hooks("c")));
	}))));

	assert_eq!(
		journal.take(),
		["unmount a", "unmount b", "dispose a", "dispose b", "render new", "mount c"]
	);
	assert_eq!(root.to_html(), "<div>new</div>");

	placeholder.replace_content(None);
	assert_eq!(journal.take(), ["unmount c", "dispose c"]);
	assert_eq!(root.to_html(), "<div></div>");
	assert!(placeholder.is_empty());
}

#[test]
fn nested_placeholder_keeps_its_siblings_in_place() {
	let root = Node::element("div");
	root.append_child(Node::text("tail"));

	let inner: Rc<RefCell<Option<Placeholder>>> = Default::default();
	let outer = mount_root(
		&root,
		component(enclose!((inner) move |r: &mut Renderer| {
			r.insert_node(Node::text("a"));
			*inner.borrow_mut() = Some(r.insert_placeholder(text("b")));
			r.insert_node(Node::text("c"));
		})),
	);
	assert_eq!(root.to_html(), "<div>abctail</div>");

	let inner = inner.borrow().clone().unwrap();
	inner.replace_content(Some(component(|r: &mut Renderer| {
		r.insert_node(Node::text("x"));
		r.insert_node(Node::text("y"));
	})));
	assert_eq!(root.to_html(), "<div>axyctail</div>");

	inner.replace_content(None);
	assert_eq!(root.to_html(), "<div>actail</div>");

	inner.replace_content(text("z"));
	assert_eq!(root.to_html(), "<div>azctail</div>");

	outer.replace_content(None);
	assert_eq!(root.to_html(), "<div>tail</div>");
}

#[test]
fn empty_nested_placeholder_resolves_to_its_start() {
	let root = Node::element("div");
	let inner: Rc<RefCell<Option<Placeholder>>> = Default::default();
	let _outer = mount_root(
		&root,
		component(enclose!((inner) move |r: &mut Renderer| {
			*inner.borrow_mut() = Some(r.insert_placeholder(None));
			r.insert_node(Node::text("after"));
		})),
	);

	let inner = inner.borrow().clone().unwrap();
	assert!(inner.is_empty());

	inner.replace_content(text("first"));
	assert_eq!(root.to_html(), "<div>firstafter</div>");
}

#[test]
fn lifecycles_cascade_and_dispose_once() {
	let root = Node::element("div");
	let journal = Journal::default();

	let outer = mount_root(
		&root,
		component(enclose!((journal) move |r: &mut Renderer| {
			r.register_lifecycle(Rc::new(journal.hooks("outer")));
			r.insert_placeholder(Some(component(enclose!((journal) move |r: &mut Renderer| {
				r.register_lifecycle(Rc::new(journal.hooks("inner")));
			}))));
		})),
	);
	assert_eq!(journal.take(), ["mount outer", "mount inner"]);

	outer.unmount();
	assert_eq!(journal.take(), ["unmount outer", "unmount inner"]);

	outer.dispose();
	assert_eq!(journal.take(), ["dispose outer", "dispose inner"]);

	outer.dispose();
	outer.mount();
	assert!(journal.take().is_empty());
	assert_eq!(outer.lifecycle_count(), 0);
}

#[test]
fn registering_twice_runs_callbacks_twice() {
	let root = Node::element("div");
	let journal = Journal::default();

	let hooks = Rc::new(journal.hooks("twice"));
	let _root = mount_root(
		&root,
		component(enclose!((hooks) move |r: &mut Renderer| {
			let same = r.register_lifecycle(hooks.clone());
			r.register_lifecycle(same);
		})),
	);

	assert_eq!(journal.take(), ["mount twice", "mount twice"]);
}

#[test]
fn renderer_at_another_place_shares_the_owner() {
	let root = Node::element("div");
	let journal = Journal::default();

	let _root = mount_root(
		&root,
		component(enclose!((journal) move |r: &mut Renderer| {
			let list = r.insert_node(Node::element("ul"));
			let mut inside = r.create_renderer_at(Place::ParentContainer(list));
			inside.insert_node(Node::element("li"));
			inside.register_lifecycle(Rc::new(journal.hooks("item")));
			r.insert_node(Node::text("after"));
		})),
	);

	assert_eq!(root.to_html(), "<div><ul><li></li></ul>after</div>");
	assert_eq!(journal.take(), ["mount item"]);
}

#[test]
fn fragments_are_spliced_into_the_region() {
	let root = Node::element("div");
	let placeholder = mount_root(
		&root,
		component(|r: &mut Renderer| {
			let fragment = Node::fragment();
			fragment.append_child(Node::text("1"));
			fragment.append_child(Node::text("2"));
			r.insert_node(fragment);
			r.insert_node(Node::text("3"));
		}),
	);
	assert_eq!(root.to_html(), "<div>123</div>");

	placeholder.replace_content(text("4"));
	assert_eq!(root.to_html(), "<div>4</div>");
}

#[test]
fn inserting_after_a_detached_node_fails() {
	let failed = Rc::new(RefCell::new(None));
	let orphan = Node::text("orphan");

	Placeholder::new(
		Place::Node(orphan),
		Some(component(enclose!((failed) move |r: &mut Renderer| {
			*failed.borrow_mut() = r.try_insert_node(Node::text("x")).err();
		}))),
	);

	assert_eq!(*failed.borrow(), Some(splice::ContractViolation::DetachedAnchor));
}

#[test]
#[should_panic(expected = "cannot insert a node after an anchor that has no parent")]
fn insert_node_panics_on_a_detached_anchor() {
	Placeholder::new(
		Place::Node(Node::text("orphan")),
		Some(component(|r: &mut Renderer| {
			r.insert_node(Node::text("x"));
		})),
	);
}
