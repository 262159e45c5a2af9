//! Shared fixtures for the integration scenarios.
//!
//! The fixtures are plain [`ElementSpec`] trees whose listeners mutate the
//! in-memory DOM the way the components they model would re-render.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use testwire::prelude::*;
use testwire::BuiltinKind;

/// Text in front of the summary total
pub const SUMMARY_PREFIX: &str = "Total value of counters: ";

/// Short waits keep timeouts in the failure paths fast
pub fn wait_options() -> WaitOptions {
    WaitOptions::new().with_timeout(500).with_poll_interval(5)
}

/// Fresh DOM plus a config that renders into it
pub fn memory_config(dom: &MemoryDom) -> WiringConfig<ElementSpec> {
    WiringConfig::for_engine(Arc::new(dom.clone())).wait_options(wait_options())
}

fn by_test_id(dom: &MemoryDom, container: &Element, test_id: &str) -> Vec<Element> {
    dom.query_all(container, BuiltinKind::TestId, &FindValue::exact(test_id))
        .unwrap()
}

// =============================================================================
// COUNTER LIST
// =============================================================================

/// A counter of the list: name plus `default`, `reset` or `addTen`
#[derive(Debug, Clone)]
pub struct CounterDef {
    pub name: String,
    pub kind: String,
}

impl CounterDef {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// The three counters used by the scenarios
pub fn default_counters() -> Vec<CounterDef> {
    vec![
        CounterDef::new("first", "default"),
        CounterDef::new("second", "reset"),
        CounterDef::new("third", "addTen"),
    ]
}

fn refresh_summary(dom: &MemoryDom) {
    let body = dom.body();
    let total: i64 = by_test_id(dom, &body, "count")
        .iter()
        .map(|count| dom.text_content(count).trim().parse::<i64>().unwrap_or(0))
        .sum();
    for summary in by_test_id(dom, &body, "summary") {
        dom.set_text(&summary, format!("{SUMMARY_PREFIX}{total}")).unwrap();
    }
}

fn update_count(dom: &MemoryDom, button: &Element, update: impl Fn(i64) -> i64) {
    let counter = dom.parent(button).unwrap();
    let count = by_test_id(dom, &counter, "count").remove(0);
    let current = dom.text_content(&count).parse::<i64>().unwrap_or(0);
    dom.set_text(&count, update(current).to_string()).unwrap();
    refresh_summary(dom);
}

fn counter(def: &CounterDef) -> ElementSpec {
    let extra = match def.kind.as_str() {
        "reset" => Some(
            ElementSpec::new("button")
                .text("Reset")
                .on_click(|dom, button| update_count(dom, button, |_| 0)),
        ),
        "addTen" => Some(
            ElementSpec::new("button")
                .text("Add Ten")
                .on_click(|dom, button| update_count(dom, button, |count| count + 10)),
        ),
        _ => None,
    };
    ElementSpec::new("li")
        .attr("data-type", def.kind.clone())
        .test_id(format!("counter_{}", def.name))
        .child(
            ElementSpec::new("span")
                .test_id("name")
                .text(format!("{}: ", def.name)),
        )
        .child(ElementSpec::new("span").test_id("count").text("0"))
        .child(
            ElementSpec::new("button")
                .text("+")
                .on_click(|dom, button| update_count(dom, button, |count| count + 1)),
        )
        .child(
            ElementSpec::new("button")
                .text("-")
                .on_click(|dom, button| update_count(dom, button, |count| count - 1)),
        )
        .child_opt(extra)
}

fn list(list_name: &str, counters: &[CounterDef]) -> ElementSpec {
    ElementSpec::new("div")
        .test_id("list")
        .child(ElementSpec::new("span").test_id("list-name").text(list_name))
        .child(ElementSpec::new("ul").children(counters.iter().map(counter)))
}

/// Counter container: a "Show" button that turns into the list
pub fn counter_list(list_name: &str, counters: Vec<CounterDef>) -> ElementSpec {
    let list_name = list_name.to_string();
    ElementSpec::new("div").test_id("counter-container").child(
        ElementSpec::new("button")
            .text("Show")
            .on_click(move |dom, button| {
                let _ = dom.replace(button, list(&list_name, &counters)).unwrap();
            }),
    )
}

/// Summary line rendered straight into the body
pub fn summary() -> ElementSpec {
    ElementSpec::new("span")
        .test_id("summary")
        .text(format!("{SUMMARY_PREFIX}0"))
}

/// Config whose render also mounts the summary into the body
pub fn counter_list_config(dom: &MemoryDom) -> WiringConfig<ElementSpec> {
    let mounter = dom.clone();
    memory_config(dom).render(move |fixture| {
        let rendered = mounter.render(fixture)?;
        let _ = mounter.mount(&rendered.base_element, summary())?;
        Ok(rendered)
    })
}

// =============================================================================
// ICON CONTROLS
// =============================================================================

/// Delay between clicking "Open"/"Close" and the icons changing
pub const TOGGLE_DELAY: Duration = Duration::from_millis(20);

fn icon(name: &str, step: i64) -> ElementSpec {
    ElementSpec::new("span")
        .attr("xlink:href", name)
        .on_click(move |dom, icon| {
            let controls = dom.parent(icon).unwrap();
            let page = dom
                .query_all(
                    &controls,
                    BuiltinKind::Text,
                    &FindValue::pattern("^Page:").unwrap(),
                )
                .unwrap()
                .remove(0);
            let current = dom
                .text_content(&page)
                .trim_start_matches("Page:")
                .trim()
                .parse::<i64>()
                .unwrap_or(0);
            dom.set_text(&page, format!("Page: {}", current + step)).unwrap();
        })
}

fn toggle_icons(dom: MemoryDom, button: Element) {
    let _ = tokio::spawn(async move {
        tokio::time::sleep(TOGGLE_DELAY).await;
        let Some(controls) = dom.parent(&button) else {
            return;
        };
        let icons = dom
            .query_all_by_attribute(&controls, "xlink:href", &FindValue::pattern(".").unwrap())
            .unwrap();
        if icons.is_empty() {
            let _ = dom.mount(&controls, icon("forward", 1)).unwrap();
            let _ = dom.mount(&controls, icon("backward", -1)).unwrap();
            dom.set_text(&button, "Close").unwrap();
        } else {
            for icon in icons {
                dom.remove(&icon).unwrap();
            }
            dom.set_text(&button, "Open").unwrap();
        }
    });
}

/// Controls whose "Open" button shows two icons after a short delay
pub fn icon_controls() -> ElementSpec {
    ElementSpec::new("div")
        .test_id("controls")
        .child(
            ElementSpec::new("button")
                .test_id("show")
                .text("Open")
                .on_click(|dom, button| toggle_icons(dom.clone(), button.clone())),
        )
        .child(ElementSpec::new("span").text("Page: 0"))
}

// =============================================================================
// INPUT
// =============================================================================

/// Input that marks itself with `data-focused` while focused
pub fn focus_input(test_id: &str) -> ElementSpec {
    ElementSpec::new("input")
        .test_id(test_id)
        .attr("type", "text")
        .on("focus", |dom, el, _| {
            dom.set_attribute(el, "data-focused", "true").unwrap();
        })
        .on("blur", |dom, el, _| dom.remove_attribute(el, "data-focused").unwrap())
}

/// `[Focused: value]` style input serializer
pub fn input_serializer(_: &Element, s: &SerializeScope) -> String {
    let focused = if s.has_attribute("data-focused") {
        "Focused: "
    } else {
        ""
    };
    format!("[{focused}{}]", s.value().unwrap_or_default())
}
