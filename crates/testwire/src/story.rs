//! Component-story engine.
//!
//! Story runners render a component into a canvas element before the test
//! body runs, and interact through user-level events. `StoryEngine` wraps a
//! [`MemoryDom`] accordingly: "rendering" only scopes the wiring to an
//! existing canvas, clicks focus their target first, typing is delivered
//! one character at a time, and serialization is refused.

use crate::dom::{ElementSpec, MemoryDom};
use crate::element::{DomEvent, Element, FindValue};
use crate::engine::{BuiltinKind, Engine, Render, Rendered};
use crate::result::{WiringError, WiringResult};
use crate::wait::WaitOptions;

/// Test id given to canvases created by [`StoryEngine::mount_canvas`]
pub const CANVAS_TEST_ID: &str = "story-canvas";

/// Engine for component stories
#[derive(Debug, Clone, Default)]
pub struct StoryEngine {
    dom: MemoryDom,
}

impl StoryEngine {
    /// Wrap a DOM
    #[must_use]
    pub const fn new(dom: MemoryDom) -> Self {
        Self { dom }
    }

    /// Underlying DOM
    #[must_use]
    pub const fn dom(&self) -> &MemoryDom {
        &self.dom
    }

    /// Mount a story into a fresh canvas and return the canvas
    pub fn mount_canvas(&self, story: ElementSpec) -> WiringResult<Element> {
        let canvas = self
            .dom
            .mount(&self.dom.body(), ElementSpec::new("div").test_id(CANVAS_TEST_ID))?;
        let _ = self.dom.mount(&canvas, story)?;
        Ok(canvas)
    }
}

impl Engine for StoryEngine {
    fn name(&self) -> &str {
        "story"
    }

    fn base_element(&self) -> Element {
        self.dom.body()
    }

    fn query_all(
        &self,
        container: &Element,
        kind: BuiltinKind,
        value: &FindValue,
    ) -> WiringResult<Vec<Element>> {
        self.dom.query_all(container, kind, value)
    }

    fn query_all_by_attribute(
        &self,
        container: &Element,
        attribute: &str,
        value: &FindValue,
    ) -> WiringResult<Vec<Element>> {
        self.dom.query_all_by_attribute(container, attribute, value)
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        self.dom.attribute(element, name)
    }

    fn text_content(&self, element: &Element) -> String {
        self.dom.text_content(element)
    }

    fn value(&self, element: &Element) -> Option<String> {
        self.dom.value(element)
    }

    fn is_connected(&self, element: &Element) -> bool {
        self.dom.is_connected(element)
    }

    fn dispatch(&self, element: &Element, event: DomEvent) -> WiringResult<()> {
        if event == DomEvent::Click && self.dom.active_element().as_ref() != Some(element) {
            self.dom.dispatch(element, DomEvent::Focus)?;
        }
        self.dom.dispatch(element, event)
    }

    fn type_into(&self, element: &Element, text: &str) -> WiringResult<()> {
        self.dispatch(element, DomEvent::Click)?;
        for data in text.chars() {
            self.dom.dispatch(element, DomEvent::Input { data })?;
        }
        Ok(())
    }

    fn supports_serialize(&self) -> bool {
        false
    }

    fn wait_options(&self) -> WaitOptions {
        self.dom.wait_options()
    }
}

impl Render for StoryEngine {
    type Fixture = Element;

    fn render(&self, canvas: Element) -> WiringResult<Rendered> {
        if !self.dom.is_connected(&canvas) {
            return Err(WiringError::engine(format!(
                "canvas {canvas} is not attached to the document"
            )));
        }
        Ok(Rendered {
            container: canvas,
            base_element: self.dom.body(),
        })
    }
}
