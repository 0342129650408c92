//! Trestle - layout and SVG rendering of railroad diagrams.
//!
//! A railroad diagram shows every legal path through a grammar rule as a
//! route along a rail: boxes for terminals and rule references, branches for
//! alternatives and loops for repetition. Trestle takes a rule as a tree of
//! [`diagram::Node`]s, measures it bottom-up, places it top-down and
//! serializes the resulting [`document::Document`] as SVG.
//!
//! # Pipeline
//!
//! ```text
//! Source Text ──parse──► Node tree ──measure──► Geometry
//!                                  ──render───► Document ──export──► SVG
//! ```
//!
//! The [`Renderer`] ties the stages together for the common case; the
//! [`layout`], [`render`] and [`export`] modules expose each stage on its own.

pub mod config;
pub mod export;
pub mod layout;
pub mod render;

mod error;

pub use trestle_core::{DiagramError, color, diagram, document, draw, geometry};
pub use trestle_parser::NamedDiagram;

pub use error::TrestleError;

use std::sync::Arc;

use log::{debug, info, trace};

use config::{AppConfig, TextMeasureKind};
use diagram::Node;
use document::Document;
use draw::{FontMeasure, GlyphCountMeasure, TextMeasure};
use layout::{Geometry, LayoutContext};
use render::RenderOptions;

/// Parses, measures and renders railroad diagrams with one configuration.
///
/// Rendering never mutates the renderer, so one instance may serve many
/// diagrams, including from several threads at once.
///
/// # Examples
///
/// ```rust
/// use trestle::{Renderer, config::AppConfig, diagram::Node};
///
/// let renderer = Renderer::new(AppConfig::default())?;
///
/// // From the declarative notation
/// let diagrams = renderer.parse(r#"diagram "Greeting" = "hello", nonterminal("name");"#)?;
/// let svg = renderer.render_svg(diagrams[0].root())?;
/// assert!(svg.starts_with("<svg"));
///
/// // Or from a tree built in code
/// let rule = Node::sequence(vec![Node::terminal("hello"), Node::non_terminal("name")]);
/// assert_eq!(renderer.render_svg(&rule)?, svg);
/// # Ok::<(), trestle::TrestleError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    config: AppConfig,
    text_measure: Arc<dyn TextMeasure>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            text_measure: Arc::new(GlyphCountMeasure::default()),
        }
    }
}

impl Renderer {
    /// Creates a renderer after validating `config`.
    ///
    /// The text measure is chosen by
    /// [`LayoutConfig::text_measure`](config::LayoutConfig::text_measure).
    ///
    /// # Errors
    ///
    /// Returns [`TrestleError::Config`] for invalid sizes or colors.
    pub fn new(config: AppConfig) -> Result<Self, TrestleError> {
        config.validate()?;

        let text_measure: Arc<dyn TextMeasure> = match config.layout().text_measure() {
            TextMeasureKind::Glyph => Arc::new(GlyphCountMeasure::default()),
            TextMeasureKind::Font => Arc::new(FontMeasure::new()),
        };
        debug!(text_measure:? = config.layout().text_measure(); "Renderer created");

        Ok(Self {
            config,
            text_measure,
        })
    }

    /// Replaces the text measure, e.g. with a deterministic stub in tests.
    pub fn with_text_measure(mut self, text_measure: Arc<dyn TextMeasure>) -> Self {
        self.text_measure = text_measure;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parses source text into named diagrams.
    ///
    /// # Errors
    ///
    /// Returns [`TrestleError::Parse`] carrying every diagnostic and the
    /// source text.
    pub fn parse(&self, source: &str) -> Result<Vec<NamedDiagram>, TrestleError> {
        info!("Parsing diagrams");
        let diagrams = trestle_parser::parse(source)
            .map_err(|err| TrestleError::new_parse_error(err, source))?;
        info!(diagrams = diagrams.len(); "Diagrams parsed");
        trace!(diagrams:?; "Parsed diagrams");
        Ok(diagrams)
    }

    /// Measures a diagram tree.
    ///
    /// # Errors
    ///
    /// Returns [`TrestleError::Diagram`] for malformed trees or unmeasurable text.
    pub fn measure(&self, root: &Node) -> Result<Geometry, TrestleError> {
        Ok(layout::measure(root, &self.context())?)
    }

    /// Measures and places a diagram tree.
    ///
    /// # Errors
    ///
    /// Returns [`TrestleError::Diagram`] for malformed trees or unmeasurable
    /// text, and [`TrestleError::Config`] for unparsable colors.
    pub fn render(&self, root: &Node) -> Result<Document, TrestleError> {
        let options = RenderOptions::from_config(&self.config)?;
        let document = render::render(root, &self.context(), &options)?;
        info!(primitives = document.primitives().len(); "Diagram rendered");
        Ok(document)
    }

    /// Renders a diagram tree to an SVG string.
    ///
    /// # Errors
    ///
    /// Same as [`Renderer::render`].
    pub fn render_svg(&self, root: &Node) -> Result<String, TrestleError> {
        let document = self.render(root)?;
        Ok(export::svg::to_string(&document))
    }

    fn context(&self) -> LayoutContext<'_> {
        LayoutContext::from_config(&self.config, self.text_measure.as_ref())
    }
}
