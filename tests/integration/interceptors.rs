//! Observing the render pipeline through registered interceptors.

use std::cell::RefCell;
use std::rc::Rc;

use docweave::{
    BoxedError, Composer, DocweaveError, Event, ExecutionPoint, Interceptor, RenderOptions,
    Template,
};

struct Recording {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Interceptor for Recording {
    fn intercept(&mut self, event: &Event) -> Result<(), BoxedError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}

fn recording() -> (Rc<RefCell<Recording>>, Rc<RefCell<Vec<Event>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    (Rc::new(RefCell::new(Recording { events: events.clone() })), events)
}

#[test]
fn all_six_points_fire_for_a_preprocessed_markdown_fragment() {
    crate::init_tracing();
    let mut composer = Composer::new();
    let (interceptor, events) = recording();
    for point in [
        ExecutionPoint::BeforePreprocessing,
        ExecutionPoint::AfterPreprocessing,
        ExecutionPoint::BeforeRendering,
        ExecutionPoint::AfterRendering,
        ExecutionPoint::BeforeMarkdown,
        ExecutionPoint::AfterMarkdown,
    ] {
        composer.register_interceptor(interceptor.clone(), point);
    }

    let pairs = Rc::new(RefCell::new(std::collections::HashMap::new()));
    composer.register_preprocessor(Rc::new(RefCell::new(
        docweave::KeyValueProcessor::new(pairs),
    )));

    let fragment =
        Template::fragment("doc", "# heading", RenderOptions::default()).unwrap();
    composer.render(&fragment).unwrap();

    let points: Vec<ExecutionPoint> = events.borrow().iter().map(Event::point).collect();
    assert_eq!(
        points,
        vec![
            ExecutionPoint::BeforePreprocessing,
            ExecutionPoint::AfterPreprocessing,
            ExecutionPoint::BeforeRendering,
            ExecutionPoint::AfterRendering,
            ExecutionPoint::BeforeMarkdown,
            ExecutionPoint::AfterMarkdown,
        ]
    );

    let events = events.borrow();
    assert!(events.iter().all(|e| e.template() == "doc"));
    assert_eq!(events[0].content(), "# heading");
    assert!(events[5].content().contains("<h1>heading</h1>"));
}

#[test]
fn root_subscription_observes_descendant_phases() {
    let mut composer = Composer::new();
    let (interceptor, events) = recording();
    composer.register_interceptor(interceptor, ExecutionPoint::AfterRendering);

    let layout =
        Template::layout("layout", "{{ a }} {{ b }}", RenderOptions::without_markdown()).unwrap();
    let a = Template::fragment("a", "one", RenderOptions::without_markdown()).unwrap();
    let b = Template::fragment("b", "two", RenderOptions::without_markdown()).unwrap();
    layout.set_child("a", &a).unwrap();
    layout.set_child("b", &b).unwrap();

    composer.render(&layout).unwrap();

    let sources: Vec<String> =
        events.borrow().iter().map(|e| e.template().to_string()).collect();
    assert_eq!(sources.len(), 3);
    assert!(sources.contains(&"a".to_string()));
    assert!(sources.contains(&"b".to_string()));
    // Children render before their parent evaluates.
    assert_eq!(sources.last().map(String::as_str), Some("layout"));
}

#[test]
fn failing_interceptor_aborts_the_render() {
    struct Refusing;
    impl Interceptor for Refusing {
        fn intercept(&mut self, _event: &Event) -> Result<(), BoxedError> {
            Err("refused".into())
        }
    }

    let mut composer = Composer::new();
    composer
        .register_interceptor(Rc::new(RefCell::new(Refusing)), ExecutionPoint::AfterRendering);

    let fragment =
        Template::fragment("doc", "text", RenderOptions::without_markdown()).unwrap();
    let err = composer.render(&fragment).unwrap_err();
    match err {
        DocweaveError::Interceptor { point, template, source } => {
            assert_eq!(point, ExecutionPoint::AfterRendering);
            assert_eq!(template, "doc");
            assert_eq!(source.to_string(), "refused");
        }
        other => panic!("expected Interceptor, got {other:?}"),
    }
}

#[test]
fn no_listeners_linger_after_a_failed_render() {
    let mut composer = Composer::new();
    let (interceptor, events) = recording();
    composer.register_interceptor(interceptor, ExecutionPoint::BeforeRendering);

    let broken =
        Template::fragment("doc", "{{ nope }}", RenderOptions::without_markdown()).unwrap();
    composer.render(&broken).unwrap_err();
    let after_failure = events.borrow().len();

    // A direct render outside the composer reaches no listeners.
    broken.assign("nope", "fixed").unwrap();
    broken
        .render(&docweave::TeraEngine::new(), &docweave::CmarkConverter::new())
        .unwrap();
    assert_eq!(events.borrow().len(), after_failure);
}

#[test]
fn preprocessing_events_carry_old_then_new_text() {
    struct Erasing;
    impl docweave::PreProcessor for Erasing {
        fn target(&self) -> &str {
            "erase"
        }
        fn process(&mut self, _block: &str) -> String {
            String::new()
        }
    }

    let mut composer = Composer::new();
    let (interceptor, events) = recording();
    composer.register_interceptor(interceptor.clone(), ExecutionPoint::BeforePreprocessing);
    composer.register_interceptor(interceptor, ExecutionPoint::AfterPreprocessing);
    composer.register_preprocessor(Rc::new(RefCell::new(Erasing)));

    let fragment = Template::fragment(
        "doc",
        "keep <?erase gone ?>",
        RenderOptions::without_markdown(),
    )
    .unwrap();
    composer.render(&fragment).unwrap();

    let events = events.borrow();
    assert_eq!(events[0].content(), "keep <?erase gone ?>");
    assert_eq!(events[1].content(), "keep ");
}
