//! Custom query kinds get the whole function family: delayed finds,
//! find-and-click and waiting for removal.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{icon_controls, memory_config};
use testwire::prelude::*;

fn wiring() -> Wiring {
    Wiring::new().child(
        "iconControls",
        WiringNode::new("controls")
            .child(
                "showButton",
                WiringNode::new("show").serialize(|_, s| format!("[{}]", s.text_content())),
            )
            .child(
                "forwardIcon",
                WiringNode::new("forward")
                    .kind("iconName")
                    .serialize(|_, _| "⏩".to_string()),
            )
            .child(
                "backwardIcon",
                WiringNode::new("backward")
                    .kind("iconName")
                    .serialize(|_, _| "⏪".to_string()),
            )
            .child(
                "page",
                WiringNode::new(FindValue::pattern("^Page:").unwrap())
                    .kind("text")
                    .serialize(|_, s| s.text_content()),
            )
            .extend(|_, _| {
                Actions::new()
                    .with("clickShowButton", |s, _| async move {
                        s.find_one("showButton").await?.click()
                    })
                    .with("showIcons", |s, _| async move {
                        s.call("clickShowButton").await?;
                        s.by("iconName")?.find("forward").await
                    })
                    .with("showIconsAndGoForward", |s, _| async move {
                        s.call("clickShowButton").await?;
                        s.by("iconName")?.find_and_click("forward").await
                    })
                    .with("hideIcons", |s, _| async move {
                        s.call("clickShowButton").await?;
                        s.by("iconName")?.eliminate("forward").await
                    })
            })
            .serialize(|_, s| {
                s.combine([
                    s.child_string("showButton"),
                    s.child_string("forwardIcon"),
                    s.child_string("backwardIcon"),
                    s.child_string("page"),
                ])
            }),
    )
}

fn handler(dom: &MemoryDom) -> RenderHandler<ElementSpec> {
    get_render(
        wiring(),
        memory_config(dom).attribute_query("IconName", "xlink:href"),
    )
}

#[tokio::test]
async fn test_custom_query_with_builtin_functions() {
    let dom = MemoryDom::new();
    let handler = handler(&dom);
    let root = handler.render(icon_controls()).unwrap();
    let controls = root.find_one("iconControls").await.unwrap();
    let snapshot = || handler.serialize(controls.element()).unwrap();

    assert_eq!(snapshot(), "[Open]\nPage: 0");

    controls.call("showIcons").await.unwrap();
    assert_eq!(snapshot(), "[Close]\n⏩\n⏪\nPage: 0");

    controls.call("hideIcons").await.unwrap();
    assert_eq!(snapshot(), "[Open]\nPage: 0");

    let forward = controls.call("showIconsAndGoForward").await.unwrap();
    assert!(forward.into_element().is_some());
    assert_eq!(snapshot(), "[Close]\n⏩\n⏪\nPage: 1");
}

#[tokio::test]
async fn test_custom_kind_finder_waits() {
    let dom = MemoryDom::new();
    let handler = handler(&dom);
    let root = handler.render(icon_controls()).unwrap();
    let controls = root.find_one("iconControls").await.unwrap();

    controls.find_one("showButton").await.unwrap().click().unwrap();
    let backward = controls.find_one("backwardIcon").await.unwrap();
    backward.click().unwrap();
    assert_eq!(
        controls.find_one("page").await.unwrap().text_content(),
        "Page: -1"
    );
}

#[tokio::test]
async fn test_custom_kind_errors_name_the_kind() {
    let dom = MemoryDom::new();
    let handler = handler(&dom);
    let root = handler.render(icon_controls()).unwrap();
    let controls = root.find_one("iconControls").await.unwrap();
    let icons = controls.by("iconName").unwrap();

    assert_eq!(icons.kind(), "IconName");
    assert_eq!(
        icons.get("forward").unwrap_err().to_string(),
        "Unable to find an element with IconName of forward"
    );
    assert_eq!(
        icons.wait_for("forward").await.unwrap_err().to_string(),
        "Unable to find an element with IconName of forward"
    );

    controls.call("showIcons").await.unwrap();
    assert_eq!(
        icons.eliminate("forward").await.unwrap_err().to_string(),
        "IconName forward is still found in the dom it was supposed to be removed"
    );
}

#[tokio::test]
async fn test_unknown_kind() {
    let wiring = Wiring::new().child(
        "controls",
        WiringNode::new("controls").child("spinner", WiringNode::new("busy").kind("spinner")),
    );
    let dom = MemoryDom::new();
    let handler = get_render(wiring, memory_config(&dom));
    let root = handler.render(icon_controls()).unwrap();
    let controls = root.find_one("controls").await.unwrap();

    let err = controls.find_one("spinner").await.unwrap_err();
    assert!(matches!(err, WiringError::UnknownQueryKind { ref kind } if kind == "Spinner"));
    assert!(matches!(
        root.by("spinner").unwrap_err(),
        WiringError::UnknownQueryKind { .. }
    ));
}
