//! End-to-end render cycles over composite trees.

use std::io::Write;

use docweave::{Composer, DocweaveError, RenderOptions, Template};

#[test]
fn layout_substitutes_children_regardless_of_storage_order() {
    crate::init_tracing();
    let layout = Template::layout(
        "layout",
        "<p>{{ fragmentOne }}</p>\n<p>{{ fragmentTwo }}</p>\n<p>{{ fragmentThree }}</p>\n",
        RenderOptions::without_markdown(),
    )
    .unwrap();

    let one = Template::fragment("one", "foo", RenderOptions::without_markdown()).unwrap();
    let two = Template::fragment("two", "bar", RenderOptions::without_markdown()).unwrap();
    let three = Template::fragment("three", "baz", RenderOptions::without_markdown()).unwrap();
    layout.set_child("fragmentOne", &one).unwrap();
    layout.set_child("fragmentTwo", &two).unwrap();
    layout.set_child("fragmentThree", &three).unwrap();

    let composer = Composer::new();
    let result = composer.render(&layout).unwrap();
    assert_eq!(result, "<p>foo</p>\n<p>bar</p>\n<p>baz</p>\n");
}

#[test]
fn layouts_nest() {
    let outer =
        Template::layout("outer", "[{{ inner }}]", RenderOptions::without_markdown()).unwrap();
    let inner =
        Template::layout("inner", "({{ leaf }})", RenderOptions::without_markdown()).unwrap();
    let leaf = Template::fragment("leaf", "kernel", RenderOptions::without_markdown()).unwrap();
    inner.set_child("leaf", &leaf).unwrap();
    outer.set_child("inner", &inner).unwrap();

    let composer = Composer::new();
    assert_eq!(composer.render(&outer).unwrap(), "[(kernel)]");
}

#[test]
fn variables_flow_down_the_scope_chain() {
    let layout =
        Template::layout("layout", "{{ child }}", RenderOptions::without_markdown()).unwrap();
    let child = Template::fragment(
        "child",
        "site: {{ siteName }}",
        RenderOptions::without_markdown(),
    )
    .unwrap();
    layout.set_child("child", &child).unwrap();

    // Assigned to the layout after attachment, read by the child.
    layout.assign("siteName", "example.org").unwrap();

    let composer = Composer::new();
    assert_eq!(composer.render(&layout).unwrap(), "site: example.org");
}

#[test]
fn markdown_phase_converts_the_evaluated_text() {
    let fragment = Template::fragment(
        "doc",
        "# {{ heading }}\n\nSome *{{ tone }}* text.",
        RenderOptions::default(),
    )
    .unwrap();
    fragment.assign("heading", "Welcome").unwrap();
    fragment.assign("tone", "friendly").unwrap();

    let composer = Composer::new();
    let html = composer.render(&fragment).unwrap();
    assert!(html.contains("<h1>Welcome</h1>"));
    assert!(html.contains("<em>friendly</em>"));
}

#[test]
fn skip_markdown_is_per_node() {
    // Children opt out individually; the layout still converts its own text.
    let layout = Template::layout("page", "{{ raw }}", RenderOptions::default()).unwrap();
    let raw = Template::fragment("raw", "*not emphasis*", RenderOptions::without_markdown())
        .unwrap();
    layout.set_child("raw", &raw).unwrap();

    let composer = Composer::new();
    let html = composer.render(&layout).unwrap();
    assert!(html.contains("<em>not emphasis</em>"));
}

#[test]
fn evaluation_failure_surfaces_with_no_partial_output() {
    let layout =
        Template::layout("page", "{{ good }} {{ bad }}", RenderOptions::without_markdown())
            .unwrap();
    let good = Template::fragment("good", "fine", RenderOptions::without_markdown()).unwrap();
    let bad = Template::fragment("bad", "{{ undefined_reference }}", RenderOptions::without_markdown())
        .unwrap();
    layout.set_child("good", &good).unwrap();
    layout.set_child("bad", &bad).unwrap();

    let composer = Composer::new();
    let err = composer.render(&layout).unwrap_err();
    match err {
        DocweaveError::TemplateEvaluation { template, .. } => assert_eq!(template, "bad"),
        other => panic!("expected TemplateEvaluation, got {other:?}"),
    }
}

#[test]
fn templates_load_from_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "Hello {{{{ who }}}}!").unwrap();

    let fragment =
        Template::fragment_from_file(file.path(), RenderOptions::without_markdown()).unwrap();
    fragment.assign("who", "disk").unwrap();

    let composer = Composer::new();
    assert_eq!(composer.render(&fragment).unwrap(), "Hello disk!");
}

#[test]
fn missing_template_file_is_a_read_error() {
    let err = Template::fragment_from_file(
        "/definitely/not/here.tpl",
        RenderOptions::default(),
    )
    .unwrap_err();
    match err {
        DocweaveError::TemplateRead { path, .. } => {
            assert_eq!(path.to_string_lossy(), "/definitely/not/here.tpl");
        }
        other => panic!("expected TemplateRead, got {other:?}"),
    }
}

#[test]
fn rendering_twice_is_stable() {
    let layout =
        Template::layout("page", "({{ body }})", RenderOptions::without_markdown()).unwrap();
    let body = Template::fragment("body", "text", RenderOptions::without_markdown()).unwrap();
    layout.set_child("body", &body).unwrap();

    let composer = Composer::new();
    let first = composer.render(&layout).unwrap();
    let second = composer.render(&layout).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "(text)");
}
