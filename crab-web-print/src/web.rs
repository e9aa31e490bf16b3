//! Browser staging platform
//!
//! Stages content in a hidden iframe appended to `<body>`, writes the
//! staged document through `document.open/write/close` and opens the
//! frame's own print dialog. Timers go through `window.setTimeout`.

use std::time::Duration;

use js_sys::{Array, Function, Object, Promise, Reflect};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlDocument, HtmlIFrameElement, Window};

use crate::content::ContentNode;
use crate::error::PrintError;
use crate::format::PrintFormat;
use crate::options::{PrintOptions, PrintResult};
use crate::orchestrator::PrintOrchestrator;
use crate::platform::{StagingPlatform, StagingSurface};

const FRAME_STYLE: &str =
    "position:absolute;left:-9999px;top:-9999px;width:0;height:0;border:0;visibility:hidden;";

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn describe(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn timer_ms(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

impl ContentNode for Element {
    fn deep_clone(&self) -> Result<Self, PrintError> {
        self.clone_node_with_deep(true)
            .map_err(|e| PrintError::StagingUnavailable(describe(&e)))?
            .dyn_into::<Element>()
            .map_err(|_| PrintError::StagingUnavailable("cloned content is not an element".to_string()))
    }

    fn inner_html(&self) -> String {
        Element::inner_html(self)
    }
}

/// Current browser window and document
#[derive(Debug, Clone)]
pub struct WebPlatform {
    window: Window,
    document: Document,
}

impl WebPlatform {
    pub fn new() -> Result<Self, PrintError> {
        let window = web_sys::window()
            .ok_or_else(|| PrintError::StagingUnavailable("no global window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| PrintError::StagingUnavailable("window has no document".to_string()))?;
        Ok(Self { window, document })
    }
}

impl StagingPlatform for WebPlatform {
    type Node = Element;
    type Surface = FrameSurface;

    fn create_surface(&self) -> Result<FrameSurface, PrintError> {
        let unavailable = |e: JsValue| PrintError::StagingUnavailable(describe(&e));

        let frame: HtmlIFrameElement = self
            .document
            .create_element("iframe")
            .map_err(unavailable)?
            .dyn_into()
            .map_err(|_| PrintError::StagingUnavailable("iframe not supported".to_string()))?;
        frame.set_attribute("style", FRAME_STYLE).map_err(unavailable)?;
        frame.set_attribute("aria-hidden", "true").map_err(unavailable)?;

        let body = self
            .document
            .body()
            .ok_or_else(|| PrintError::StagingUnavailable("document has no body".to_string()))?;
        body.append_child(&frame).map_err(unavailable)?;

        Ok(FrameSurface { frame })
    }

    async fn delay(&self, duration: Duration) {
        let window = self.window.clone();
        let ms = timer_ms(duration);
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            {
                warn!(error = %describe(&e), "setTimeout failed");
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    fn defer_removal(&self, surface: FrameSurface, grace: Duration) {
        let mut fallback = surface.clone();
        let mut surface = surface;
        let callback = Closure::once_into_js(move || surface.remove());

        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                timer_ms(grace),
            )
        {
            warn!(error = %describe(&e), "Deferred removal not scheduled, removing frame now");
            fallback.remove();
        }
    }
}

/// Hidden iframe hosting one staged document
#[derive(Debug, Clone)]
pub struct FrameSurface {
    frame: HtmlIFrameElement,
}

impl StagingSurface for FrameSurface {
    fn write_document(&mut self, markup: &str) -> Result<(), PrintError> {
        if self.frame.content_window().is_none() {
            return Err(PrintError::StagingUnavailable(
                "frame window unavailable".to_string(),
            ));
        }
        let document: HtmlDocument = self
            .frame
            .content_document()
            .ok_or_else(|| PrintError::StagingUnavailable("frame document unavailable".to_string()))?
            .dyn_into()
            .map_err(|_| PrintError::StagingUnavailable("frame document is not HTML".to_string()))?;

        let failed = |e: JsValue| PrintError::StagingUnavailable(describe(&e));
        document.open().map_err(failed)?;
        document
            .write(&Array::of1(&JsValue::from_str(markup)))
            .map_err(failed)?;
        document.close().map_err(failed)?;
        Ok(())
    }

    async fn loaded(&mut self) -> Result<(), PrintError> {
        let frame = self.frame.clone();
        let promise = Promise::new(&mut |resolve, reject| {
            frame.set_onload(Some(&resolve));
            frame.set_onerror(Some(&reject));
        });
        let outcome = JsFuture::from(promise).await;

        self.frame.set_onload(None);
        self.frame.set_onerror(None);
        outcome
            .map(|_| ())
            .map_err(|e| PrintError::LoadFailure(describe(&e)))
    }

    fn print(&mut self) -> Result<(), PrintError> {
        let window = self.frame.content_window().ok_or_else(|| {
            PrintError::StagingUnavailable("frame window unavailable".to_string())
        })?;
        let failed = |e: JsValue| PrintError::TriggerFailure(describe(&e));
        window.focus().map_err(failed)?;
        window.print().map_err(failed)
    }

    fn remove(&mut self) {
        let Some(parent) = self.frame.parent_node() else {
            return;
        };
        if let Err(e) = parent.remove_child(&self.frame) {
            warn!(error = %describe(&e), "Failed to remove print frame");
        }
    }
}

fn hook(options: Option<&Object>, name: &str) -> Option<Function> {
    Reflect::get(options?, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

/// Non-finite values fall back to the configured default; zero and negative
/// values mean an immediate deadline.
fn timeout_option(options: Option<&Object>) -> Option<Duration> {
    let ms = Reflect::get(options?, &JsValue::from_str("timeout"))
        .ok()?
        .as_f64()?;
    ms.is_finite()
        .then(|| Duration::from_millis(ms.max(0.0) as u64))
}

/// Accepts an element or a host ref object (`{ current: element }`)
fn resolve_element(content: &JsValue) -> Option<Element> {
    if content.is_null() || content.is_undefined() {
        return None;
    }
    if let Some(element) = content.dyn_ref::<Element>() {
        return Some(element.clone());
    }
    Reflect::get(content, &JsValue::from_str("current"))
        .ok()?
        .dyn_into::<Element>()
        .ok()
}

fn result_to_js(result: &PrintResult) -> JsValue {
    let obj = Object::new();
    let _ = Reflect::set(&obj, &"success".into(), &JsValue::from_bool(result.success));
    if let Some(error) = &result.error {
        let _ = Reflect::set(&obj, &"error".into(), &JsValue::from_str(error));
    }
    let _ = Reflect::set(&obj, &"message".into(), &JsValue::from_str(&result.message));
    obj.into()
}

/// `printElement(content, format = "a4", { onStart, onSuccess, onError, timeout })`
///
/// `content` is an element or a ref object holding one in `current`.
/// `timeout` is in milliseconds; `0` or a negative value gives an immediate
/// deadline, a missing or non-numeric value the 5000ms default.
/// Always resolves to `{ success, error?, message }`.
#[wasm_bindgen(js_name = printElement)]
pub async fn print_element(
    content: JsValue,
    format: Option<String>,
    options: Option<Object>,
) -> Result<JsValue, JsValue> {
    let opts = options.as_ref();

    let mut print_options = PrintOptions::new();
    if let Some(f) = hook(opts, "onStart") {
        print_options = print_options.on_start(move || {
            if let Err(e) = f.call0(&JsValue::NULL) {
                warn!(error = %describe(&e), "onStart callback threw");
            }
        });
    }
    if let Some(f) = hook(opts, "onSuccess") {
        print_options = print_options.on_success(move |msg| {
            if let Err(e) = f.call1(&JsValue::NULL, &JsValue::from_str(msg)) {
                warn!(error = %describe(&e), "onSuccess callback threw");
            }
        });
    }
    if let Some(f) = hook(opts, "onError") {
        print_options = print_options.on_error(move |msg| {
            if let Err(e) = f.call1(&JsValue::NULL, &JsValue::from_str(msg)) {
                warn!(error = %describe(&e), "onError callback threw");
            }
        });
    }
    if let Some(timeout) = timeout_option(opts) {
        print_options = print_options.with_timeout(timeout);
    }

    let format = match format.as_deref().map(str::parse::<PrintFormat>).transpose() {
        Ok(format) => format.unwrap_or_default(),
        Err(e) => return Ok(result_to_js(&print_options.fail(e))),
    };
    let platform = match WebPlatform::new() {
        Ok(platform) => platform,
        Err(e) => return Ok(result_to_js(&print_options.fail(e))),
    };

    let element = resolve_element(&content);
    let result = PrintOrchestrator::new(platform)
        .execute(element, format, print_options)
        .await;
    Ok(result_to_js(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn object(entries: &[(&str, JsValue)]) -> Object {
        let obj = Object::new();
        for (key, value) in entries {
            Reflect::set(&obj, &JsValue::from_str(key), value).unwrap();
        }
        obj
    }

    fn field(value: &JsValue, key: &str) -> JsValue {
        Reflect::get(value, &JsValue::from_str(key)).unwrap()
    }

    fn body_children() -> u32 {
        let platform = WebPlatform::new().unwrap();
        platform.document.body().unwrap().child_element_count()
    }

    fn element(tag: &str) -> Element {
        WebPlatform::new().unwrap().document.create_element(tag).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_timeout_option() {
        let with = |value: JsValue| timeout_option(Some(&object(&[("timeout", value)])));

        assert_eq!(with(JsValue::from_f64(250.0)), Some(Duration::from_millis(250)));
        assert_eq!(with(JsValue::from_f64(0.0)), Some(Duration::ZERO));
        assert_eq!(with(JsValue::from_f64(-10.0)), Some(Duration::ZERO));
        assert_eq!(with(JsValue::from_f64(f64::NAN)), None);
        assert_eq!(with(JsValue::from_str("fast")), None);
        assert_eq!(timeout_option(Some(&Object::new())), None);
        assert_eq!(timeout_option(None), None);
    }

    #[wasm_bindgen_test]
    fn test_hook_requires_function() {
        let opts = object(&[
            ("onStart", Function::new_no_args("").into()),
            ("onError", JsValue::from_str("not a function")),
        ]);

        assert!(hook(Some(&opts), "onStart").is_some());
        assert!(hook(Some(&opts), "onError").is_none());
        assert!(hook(Some(&opts), "onSuccess").is_none());
        assert!(hook(None, "onStart").is_none());
    }

    #[wasm_bindgen_test]
    fn test_result_to_js_shape() {
        let ok = result_to_js(&PrintResult::succeeded("done"));
        assert_eq!(field(&ok, "success"), JsValue::TRUE);
        assert_eq!(field(&ok, "message").as_string().as_deref(), Some("done"));
        assert!(!Reflect::has(&ok, &"error".into()).unwrap());

        let err = result_to_js(&PrintResult::from(PrintError::Timeout(0)));
        assert_eq!(field(&err, "success"), JsValue::FALSE);
        assert_eq!(field(&err, "error").as_string(), field(&err, "message").as_string());
    }

    #[wasm_bindgen_test]
    fn test_resolve_element() {
        let el = element("div");
        let el_value: JsValue = el.clone().into();

        assert_eq!(resolve_element(&el_value), Some(el.clone()));
        assert_eq!(
            resolve_element(&object(&[("current", el_value.clone())]).into()),
            Some(el)
        );
        assert_eq!(resolve_element(&object(&[("current", JsValue::NULL)]).into()), None);
        assert_eq!(resolve_element(&Object::new().into()), None);
        assert_eq!(resolve_element(&JsValue::NULL), None);
        assert_eq!(resolve_element(&JsValue::UNDEFINED), None);
        assert_eq!(resolve_element(&JsValue::from_f64(5.0)), None);
    }

    #[wasm_bindgen_test]
    async fn test_empty_ref_creates_no_frame() {
        let before = body_children();
        let content: JsValue = object(&[("current", JsValue::NULL)]).into();

        let result = print_element(content, None, None).await.unwrap();

        assert_eq!(field(&result, "success"), JsValue::FALSE);
        assert_eq!(
            field(&result, "message").as_string().as_deref(),
            Some("Print content not found")
        );
        assert_eq!(body_children(), before);
    }

    #[wasm_bindgen_test]
    async fn test_unknown_format_rejected() {
        let before = body_children();

        let result = print_element(element("div").into(), Some("letter".into()), None)
            .await
            .unwrap();

        assert_eq!(field(&result, "success"), JsValue::FALSE);
        assert!(
            field(&result, "message")
                .as_string()
                .unwrap()
                .contains("letter")
        );
        assert_eq!(body_children(), before);
    }

    #[wasm_bindgen_test]
    async fn test_throwing_callback_still_resolves() {
        let opts = object(&[(
            "onError",
            Function::new_no_args("throw new Error('boom')").into(),
        )]);

        let result = print_element(JsValue::NULL, None, Some(opts)).await.unwrap();

        assert_eq!(field(&result, "success"), JsValue::FALSE);
    }

    #[wasm_bindgen_test]
    fn test_frame_remove_is_idempotent() {
        let before = body_children();
        let platform = WebPlatform::new().unwrap();
        let mut surface = platform.create_surface().unwrap();
        assert!(surface.frame.parent_node().is_some());
        assert_eq!(body_children(), before + 1);

        surface.remove();
        surface.remove();

        assert!(surface.frame.parent_node().is_none());
        assert_eq!(body_children(), before);
    }
}
