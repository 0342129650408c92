//! Integration tests for the Renderer API
//!
//! These tests drive the public API the way the command-line tool and
//! embedding applications do.

use std::{sync::Arc, thread};

use trestle::{
    DiagramError, Renderer, TrestleError,
    config::AppConfig,
    diagram::{Node, OptionalDefault},
    draw::{TextDefinition, TextMeasure},
    export::svg::read_primitives,
};

const SELECT: &str = r#"
    // Column list of a SELECT statement
    let column = nonterminal("column", "Column.html#column");
    diagram "Select" =
        "SELECT",
        optional("DISTINCT", skip),
        one_or_more(column, ","),
        stack("FROM", nonterminal("table"));
"#;

#[derive(Debug)]
struct BrokenMeasure;

impl TextMeasure for BrokenMeasure {
    fn text_width(&self, _text: &str, _font: &TextDefinition) -> Result<f32, String> {
        Err("no fonts available".to_string())
    }
}

#[test]
fn test_parse_and_render_svg() {
    let renderer = Renderer::default();
    let diagrams = renderer.parse(SELECT).expect("Should parse valid source");
    assert_eq!(diagrams.len(), 1);
    assert_eq!(diagrams[0].name(), "Select");

    let svg = renderer
        .render_svg(diagrams[0].root())
        .expect("Should render parsed diagram");
    assert!(svg.starts_with("<svg"), "Output should start with the SVG tag");
    assert!(svg.ends_with("</svg>"), "Output should be complete SVG");
    assert!(svg.contains("href=\"Column.html#column\""));
}

#[test]
fn test_rendered_svg_reads_back() {
    let renderer = Renderer::default();
    let diagrams = renderer.parse(SELECT).unwrap();
    let document = renderer.render(diagrams[0].root()).unwrap();

    let parsed = read_primitives(&renderer.render_svg(diagrams[0].root()).unwrap()).unwrap();
    assert!(parsed.matches(&document, 1e-3));
    assert_eq!(parsed.links().len(), 1);
}

#[test]
fn test_parse_error_keeps_source() {
    let source = r#"diagram "Broken" = choice(5, "a", "b");"#;
    let err = Renderer::default().parse(source).unwrap_err();

    match err {
        TrestleError::Parse { err, src } => {
            assert_eq!(src, source);
            assert!(!err.diagnostics().is_empty());
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_invalid_config_rejected_before_layout() {
    let mut config = AppConfig::default();
    config.style_mut().set_arc_radius(0.0);
    assert!(matches!(Renderer::new(config), Err(TrestleError::Config(_))));

    let config: AppConfig = toml::from_str(
        r#"
        [style]
        terminal_fill = "not-a-color"
        "#,
    )
    .unwrap();
    let err = Renderer::new(config).unwrap_err();
    assert!(err.to_string().contains("style.terminal_fill"));
}

#[test]
fn test_config_from_toml_changes_geometry() {
    let config: AppConfig = toml::from_str(
        r#"
        [layout]
        connector_length = 20
        terminators = false

        [style]
        padding = 0
        "#,
    )
    .unwrap();
    let renderer = Renderer::new(config).unwrap();
    let root = Node::sequence(vec![Node::terminal("a"), Node::terminal("b")]);

    let wide = renderer.measure(&root).unwrap();
    let narrow = Renderer::default().measure(&root).unwrap();
    assert!(wide.width() > narrow.width());

    let document = renderer.render(&root).unwrap();
    assert!((document.size().width() - wide.width()).abs() < 1e-3);
}

#[test]
fn test_measurement_failure_is_reported() {
    let renderer = Renderer::default().with_text_measure(Arc::new(BrokenMeasure));
    let err = renderer.render(&Node::terminal("SELECT")).unwrap_err();

    assert!(matches!(
        err,
        TrestleError::Diagram(DiagramError::UnmeasurableText { .. })
    ));
}

#[test]
fn test_repetition_equivalences() {
    let renderer = Renderer::default();
    let item = Node::non_terminal("item");

    let zero_or_more = Node::zero_or_more(item.clone(), None).unwrap();
    let optional_loop = Node::optional(
        Node::one_or_more(item.clone(), None).unwrap(),
        OptionalDefault::Skip,
    );
    assert_eq!(
        renderer.measure(&zero_or_more).unwrap(),
        renderer.measure(&optional_loop).unwrap()
    );

    let optional = Node::optional(item.clone(), OptionalDefault::Skip);
    let choice = Node::choice(0, vec![Node::skip(), item]).unwrap();
    assert_eq!(
        renderer.measure(&optional).unwrap().height(),
        renderer.measure(&choice).unwrap().height()
    );
}

#[test]
fn test_concurrent_renders_share_renderer() {
    let renderer = Arc::new(Renderer::default());
    let expected = renderer.render_svg(&Node::terminal("shared")).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let renderer = Arc::clone(&renderer);
            thread::spawn(move || renderer.render_svg(&Node::terminal("shared")).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
