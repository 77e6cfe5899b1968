//! Integration tests rendering the fixture templates under tests/data

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use template_tree::{
    ChildSpec, Environment, FileLocator, Lookup, Placeholders, RenderConfig, Settings, Template,
    TemplateError, Value, ViewSpec,
};

const DATA_DIR: &str = "tests/data";

const SITE: &str = "<title>Site</title>\n\
<header>Header|<em>Header</em>\n</header>\n\n\
<main>Site <em>MAIN ARTICLE</em>\n</main>\n\n";

fn env() -> Arc<Environment> {
    Arc::new(Environment::new(FileLocator::new([DATA_DIR]).unwrap()))
}

fn site(env: &Arc<Environment>) -> Template {
    let mut header = env
        .template("header.html", [("title", "Header")].into_iter().collect())
        .unwrap();
    let header_root = header.root();
    header
        .add_child_by_file(header_root, "partial", "partial.html", Placeholders::new())
        .unwrap();

    let mut layout = env
        .template("layout.html", [("title", "Site")].into_iter().collect())
        .unwrap();
    let root = layout.root();
    layout
        .add_child(root, "header", header)
        .unwrap()
        .add_child_by_file(root, "main", "main.html", Placeholders::new())
        .unwrap();
    layout
}

#[test]
fn test_site_renders_with_inheritance() {
    let env = env();
    let mut layout = site(&env);
    assert_eq!(layout.render_root(&Placeholders::new()), SITE);
}

#[test]
fn test_rendering_is_repeatable() {
    let env = env();
    let mut layout = site(&env);
    let first = layout.render_root(&Placeholders::new());
    let second = layout.render_root(&Placeholders::new());
    assert_eq!(first, second);
}

#[test]
fn test_root_default_title() {
    let env = env();
    let mut layout = env.template("layout.html", Placeholders::new()).unwrap();
    let html = layout.render_root(&Placeholders::new());
    assert!(html.starts_with("<title>Root Template</title>\n"));
    assert!(html.contains(r#"data-code="not-found""#));
}

#[test]
fn test_render_overrides_do_not_persist() {
    let env = env();
    let mut layout = site(&env);
    let overridden = layout.render_root(&[("title", "Special")].into_iter().collect());
    assert!(overridden.starts_with("<title>Special</title>"));
    // header shadows the root title, main inherits the override
    assert!(overridden.contains("<header>Header|"));
    assert!(overridden.contains("<main>Special <em>MAIN ARTICLE</em>"));

    assert_eq!(layout.render_root(&Placeholders::new()), SITE);
    assert_eq!(
        layout.get(layout.root(), "title", None).unwrap(),
        Lookup::Found(Value::from("Site"))
    );
}

#[test]
fn test_faults_stay_inside_their_node() {
    let env = env();
    let mut page = env.template("page.html", Placeholders::new()).unwrap();
    let root = page.root();
    page.add_child_by_file(root, "body", "broken.html", Placeholders::new())
        .unwrap();

    let html = page.render_root(&Placeholders::new());
    assert!(html.starts_with("[<span class=\"template-diagnostic template-error\" data-code=\"undefined-variable\""));
    assert!(html.contains(r#"data-line="2">undefined variable &quot;nope&quot;</span>|"#));
    assert!(html.contains("child template &quot;sidebar&quot; not found in &quot;page&quot;"));
    assert!(html.ends_with("</span>]\n"));
    assert!(!html.contains("before"));
}

#[test]
fn test_syntax_errors_render_inline() {
    let env = env();
    let mut template = env.template("syntax.html", Placeholders::new()).unwrap();
    let html = template.render_root(&Placeholders::new());
    assert!(html.contains(r#"data-code="syntax""#));
    assert!(html.contains(r#"data-line="2""#));
}

#[test]
fn test_self_include_is_bounded() {
    let env = Arc::new(
        Environment::new(FileLocator::new([DATA_DIR]).unwrap())
            .with_config(RenderConfig::default().with_max_include_depth(3)),
    );
    let html = Template::render_file(env, "loop.html", &Placeholders::new()).unwrap();
    assert_eq!(html.matches(r#"data-code="include-depth""#).count(), 1);
    assert!(html.contains("maximum include depth of 3 exceeded"));
}

#[test]
fn test_markers_wrap_every_node() {
    let env = Arc::new(
        Environment::new(FileLocator::new([DATA_DIR]).unwrap())
            .with_config(RenderConfig::default().with_verbose(true)),
    );
    let mut layout = site(&env);
    let html = layout.render_root(&Placeholders::new());

    assert!(html.starts_with("\n<!-- START: \"layout.html\" (layout) -->\n"));
    assert!(html.contains("<!-- START: \"partial.html\" (layout/header/partial) -->"));
    assert!(html.contains("<!-- END: \"main.html\" (layout/main) -->"));
    // the standalone include is its own root
    assert!(html.contains("<!-- START: \"partial.html\" (partial) -->"));
}

#[test]
fn test_view_from_settings() {
    let settings = Settings::from_file(&Path::new(DATA_DIR).join("settings.toml")).unwrap();
    assert_eq!(settings.render.diagnostic_class, "volta");

    let env = Arc::new(Environment::from_settings(&settings).unwrap());
    let view = settings.view.clone().unwrap();
    let mut layout = view.build(env).unwrap();
    assert_eq!(layout.render_root(&Placeholders::new()), SITE);
}

#[test]
fn test_view_built_in_code_matches_settings() {
    let view = ViewSpec {
        layout: "layout.html".to_string(),
        placeholders: [("title", "Site")].into_iter().collect(),
        children: vec![
            ChildSpec::new("header", "header.html")
                .with_placeholder("title", "Header")
                .with_child(ChildSpec::new("partial", "partial.html")),
            ChildSpec::new("main", "main.html"),
        ],
    };
    let mut layout = view.build(env()).unwrap();
    assert_eq!(layout.render_root(&Placeholders::new()), SITE);
}

#[test]
fn test_removed_subtree_renders_standalone() {
    let env = env();
    let mut layout = site(&env);
    let root = layout.root();
    let mut header = layout.remove_child(root, "header").unwrap();

    assert_eq!(
        header.render_root(&Placeholders::new()),
        "<header>Header|<em>Header</em>\n</header>\n"
    );
    let html = layout.render_root(&Placeholders::new());
    assert!(html.contains("child template &quot;header&quot; not found in &quot;layout&quot;"));

    layout.add_child(root, "header", header).unwrap();
    assert_eq!(layout.render_root(&Placeholders::new()), SITE);
}

#[test]
fn test_hard_errors() {
    let env = env();
    let mut layout = site(&env);
    let root = layout.root();

    assert_eq!(
        layout
            .add_child_by_file(root, "main", "partial.html", Placeholders::new())
            .unwrap_err(),
        TemplateError::duplicate("layout", "main")
    );
    assert!(layout
        .add_child_by_file(root, "footer", "footer.html", Placeholders::new())
        .unwrap_err()
        .is_not_found());
    assert!(layout
        .add_child_by_file(root, "escape", "../Cargo.toml", Placeholders::new())
        .unwrap_err()
        .is_not_found());
    assert!(matches!(
        FileLocator::new(["tests/no-such-dir"]),
        Err(TemplateError::InvalidConfiguration { .. })
    ));
}
