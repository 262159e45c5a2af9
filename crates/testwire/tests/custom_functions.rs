//! Default and custom functions available from every scope.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::BTreeMap;

use common::{focus_input, input_serializer, memory_config};
use serde_json::json;
use testwire::prelude::*;

fn fixture() -> ElementSpec {
    ElementSpec::new("div")
        .test_id("wrapper")
        .child(
            ElementSpec::new("div")
                .attr("data-disabled", "")
                .test_id("label")
                .text("Label Content"),
        )
        .child(ElementSpec::new("div").test_id("title").text("Title Content"))
        .child(focus_input("input"))
}

fn wiring() -> Wiring {
    Wiring::new().child(
        "wrapper",
        WiringNode::new("wrapper")
            .child("title", WiringNode::new("title"))
            .child("label", WiringNode::new("label"))
            .child("input", WiringNode::new("input").serialize(input_serializer)),
    )
}

mod defaults {
    use super::*;

    #[tokio::test]
    async fn test_get_text_content() {
        let dom = MemoryDom::new();
        let root = get_render(wiring(), memory_config(&dom))
            .render(fixture())
            .unwrap();
        assert_eq!(root.get_text_content("label").unwrap(), "Label Content");
        assert_eq!(
            root.get_text_contents(&["label", "title"]).unwrap(),
            vec!["Label Content".to_string(), "Title Content".to_string()]
        );
        assert!(root.get_text_content("missing").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_test_id_of_found_element() {
        let dom = MemoryDom::new();
        let root = get_render(wiring(), memory_config(&dom))
            .render(fixture())
            .unwrap();
        let wrapper = root.find_one("wrapper").await.unwrap();
        assert_eq!(wrapper.test_id().as_deref(), Some("wrapper"));
        assert_eq!(wrapper.container(), wrapper.element());
        assert_eq!(root.test_id(), None);
    }

    #[tokio::test]
    async fn test_within_other_element() {
        let dom = MemoryDom::new();
        let root = get_render(wiring(), memory_config(&dom))
            .render(fixture())
            .unwrap();
        let label = root.by_test_id().get("label").unwrap();
        let within = root.within(&label);
        assert_eq!(within.text_content(), "Label Content");
        assert!(within.has_attribute("data-disabled"));
        assert!(within.by_test_id().query("title").unwrap().is_none());
        assert_eq!(root.within_base_element().element(), &dom.body());
    }
}

mod custom {
    use super::*;

    #[tokio::test]
    async fn test_within_element_functions_everywhere() {
        let dom = MemoryDom::new();
        let config = memory_config(&dom).within_element_functions(|_| {
            Actions::new().with_sync("isDisabled", |s, _| Ok(s.has_attribute("data-disabled")))
        });
        let root = get_render(wiring(), config).render(fixture()).unwrap();

        assert!(root.has_function("isDisabled"));
        let wrapper = root.find_one("wrapper").await.unwrap();
        assert_eq!(wrapper.call("isDisabled").await.unwrap().as_bool(), Some(false));
        let label = wrapper.find_one("label").await.unwrap();
        assert_eq!(label.call("isDisabled").await.unwrap().as_bool(), Some(true));
    }

    #[tokio::test]
    async fn test_within_element_sees_every_function_type() {
        let dom = MemoryDom::new();
        let config = memory_config(&dom)
            .attribute_query("IconName", "xlink:href")
            .global_functions(|_| Actions::new().with_sync("customGlobalFunction", |_, _| Ok(())))
            .within_element_functions(|scope| {
                let types = json!({
                    "customGlobal": scope.has_function("customGlobalFunction"),
                    "customQueries": scope.by("iconName").is_ok(),
                    "standardFunctions": scope.by("text").is_ok(),
                });
                Actions::new().with_sync("getAvailableFunctionTypes", move |_, _| Ok(types.clone()))
            });
        let root = get_render(wiring(), config).render(fixture()).unwrap();
        let wrapper = root.find_one("wrapper").await.unwrap();

        let types: BTreeMap<String, bool> = wrapper
            .call("getAvailableFunctionTypes")
            .await
            .unwrap()
            .deserialize()
            .unwrap();
        assert_eq!(types.len(), 3);
        assert!(types.values().all(|available| *available));

        let err = wrapper
            .call("getAvailableFunctionTypes")
            .await
            .unwrap()
            .deserialize::<Vec<String>>()
            .unwrap_err();
        assert!(matches!(err, WiringError::Json(_)));
    }

    #[tokio::test]
    async fn test_global_functions_see_default_globals() {
        let dom = MemoryDom::new();
        let config = memory_config(&dom).global_functions(|_| {
            Actions::new().with("focusByTestId", |s, args| async move {
                let test_id = args.str(0).unwrap_or_default().to_string();
                let element = s.within_base_element().by_test_id().find(test_id).await?;
                s.globals().focus_element(&element)?;
                Ok(element)
            })
        });
        let handler = get_render(wiring(), config);
        let root = handler.render(fixture()).unwrap();
        let wrapper = root.find_one("wrapper").await.unwrap();
        let input = wrapper.find_one("input").await.unwrap();

        assert!(input.has_function("focusByTestId"));
        root.call_with("focusByTestId", Args::new().with_value("input"))
            .await
            .unwrap();
        assert_eq!(dom.active_element().as_ref(), Some(input.element()));
        assert_eq!(
            handler.serialize(input.element()).unwrap_err().to_string(),
            "Element can't be serialized, make sure it's defined in wiring"
        );
        assert_eq!(handler.serialize(wrapper.element()).unwrap(), "");
    }

    #[tokio::test]
    async fn test_extend_overrides_custom_functions() {
        let dom = MemoryDom::new();
        let wiring = Wiring::new().child(
            "wrapper",
            WiringNode::new("wrapper")
                .extend(|_, _| Actions::new().with_sync("whoAmI", |_, _| Ok("extend"))),
        );
        let config = memory_config(&dom)
            .global_functions(|_| Actions::new().with_sync("whoAmI", |_, _| Ok("global")))
            .within_element_functions(|_| Actions::new().with_sync("whoAmI", |_, _| Ok("within")));
        let root = get_render(wiring, config).render(fixture()).unwrap();

        assert_eq!(root.call("whoAmI").await.unwrap().as_str(), Some("within"));
        let wrapper = root.find_one("wrapper").await.unwrap();
        assert_eq!(wrapper.call("whoAmI").await.unwrap().as_str(), Some("extend"));
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let dom = MemoryDom::new();
        let root = get_render(wiring(), memory_config(&dom))
            .render(fixture())
            .unwrap();
        assert!(matches!(
            root.call("nothingHere").await.unwrap_err(),
            WiringError::UnknownFunction { ref name } if name == "nothingHere"
        ));
    }
}
