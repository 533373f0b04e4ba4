//! Page scripts and `Runtime.evaluate` helpers.

use framesnap_protocols::{CollaboratorError, FrameId, Session};
use serde_json::{json, Value};

use crate::cdp::RemoteObject;

/// Xpaths (same `tag[n]` steps as the DOM index) of every scrollable element
/// in the document and its same-origin iframe documents.
pub(crate) const SCROLLABLE_XPATHS_SCRIPT: &str = r#"(() => {
  const step = (el) => {
    let i = 1;
    for (let s = el.previousElementSibling; s; s = s.previousElementSibling) {
      if (s.localName === el.localName) i++;
    }
    return `${el.localName}[${i}]`;
  };
  const pathOf = (el, prefix) => {
    const parts = [];
    for (let n = el; n && n.nodeType === 1; n = n.parentElement) parts.unshift(step(n));
    return `${prefix}/${parts.join("/")}`;
  };
  const scrolls = (v) => v === "auto" || v === "scroll" || v === "overlay";
  const out = new Set();
  const visit = (doc, prefix) => {
    for (const el of doc.querySelectorAll("*")) {
      const style = doc.defaultView.getComputedStyle(el);
      if ((el.scrollHeight > el.clientHeight && scrolls(style.overflowY)) ||
          (el.scrollWidth > el.clientWidth && scrolls(style.overflowX))) {
        out.add(pathOf(el, prefix));
      }
      if (el.localName === "iframe" || el.localName === "frame") {
        try {
          if (el.contentDocument) visit(el.contentDocument, pathOf(el, prefix));
        } catch (e) {}
      }
    }
    const root = doc.scrollingElement;
    if (root && root.scrollHeight > root.clientHeight) out.add(pathOf(root, prefix));
  };
  visit(document, "");
  return [...out];
})()"#;

/// Function declaration computing the `tag[n]` xpath of `this` within its
/// own document.
pub(crate) const NODE_XPATH_FUNCTION: &str = r#"function() {
  const parts = [];
  for (let n = this; n && n.nodeType === 1; n = n.parentElement) {
    let i = 1;
    for (let s = n.previousElementSibling; s; s = s.previousElementSibling) {
      if (s.localName === n.localName) i++;
    }
    parts.unshift(`${n.localName}[${i}]`);
  }
  return `/${parts.join("/")}`;
}"#;

/// Expression resolving an xpath to its first matching node.
pub(crate) fn xpath_lookup_expression(xpath: &str) -> Result<String, CollaboratorError> {
    let literal = serde_json::to_string(xpath)?;
    Ok(format!(
        "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
        literal
    ))
}

/// Expression resolving a CSS selector in the document.
pub(crate) fn css_lookup_expression(selector: &str) -> Result<String, CollaboratorError> {
    let literal = serde_json::to_string(selector)?;
    Ok(format!("document.querySelector({})", literal))
}

/// Name of the isolated world used for node lookups.
const WORLD_NAME: &str = "framesnap";

/// `DOM.describeNode` description of the first node matching `xpath` in
/// `frame_id`, evaluated in an isolated world of that frame.
///
/// `Ok(None)` when nothing matches.
pub(crate) async fn describe_xpath_node(
    session: &dyn Session,
    frame_id: &FrameId,
    xpath: &str,
) -> Result<Option<Value>, CollaboratorError> {
    let world = session
        .send(
            "Page.createIsolatedWorld",
            Some(json!({
                "frameId": frame_id.as_str(),
                "worldName": WORLD_NAME,
                "grantUniveralAccess": true,
            })),
        )
        .await?;
    let context_id = world["executionContextId"].as_i64().ok_or_else(|| {
        CollaboratorError::FrameNotFound(format!("no execution context for {}", frame_id))
    })?;

    let handle =
        evaluate_handle(session, &xpath_lookup_expression(xpath)?, Some(context_id)).await?;
    let Some(object_id) = handle.object_id else {
        return Ok(None);
    };

    let described = session
        .send("DOM.describeNode", Some(json!({ "objectId": object_id })))
        .await?;
    Ok(Some(described["node"].clone()))
}

/// Evaluate `expression` and return its value.
///
/// `context_id` targets an execution context such as an isolated world.
pub(crate) async fn evaluate_value(
    session: &dyn Session,
    expression: &str,
    context_id: Option<i64>,
) -> Result<Value, CollaboratorError> {
    let result = evaluate(session, expression, context_id, true).await?;
    Ok(result["result"]["value"].clone())
}

/// Evaluate `expression` and return a handle to the result.
pub(crate) async fn evaluate_handle(
    session: &dyn Session,
    expression: &str,
    context_id: Option<i64>,
) -> Result<RemoteObject, CollaboratorError> {
    let result = evaluate(session, expression, context_id, false).await?;
    let remote: RemoteObject = serde_json::from_value(result["result"].clone())?;
    Ok(remote)
}

/// Call a function declaration with `this` bound to `object_id`.
pub(crate) async fn call_function_on(
    session: &dyn Session,
    object_id: &str,
    function: &str,
) -> Result<Value, CollaboratorError> {
    let result = session
        .send(
            "Runtime.callFunctionOn",
            Some(json!({
                "objectId": object_id,
                "functionDeclaration": function,
                "returnByValue": true,
            })),
        )
        .await?;
    check_exception(&result)?;
    Ok(result["result"]["value"].clone())
}

async fn evaluate(
    session: &dyn Session,
    expression: &str,
    context_id: Option<i64>,
    by_value: bool,
) -> Result<Value, CollaboratorError> {
    let mut params = json!({
        "expression": expression,
        "returnByValue": by_value,
        "awaitPromise": true,
    });
    if let Some(id) = context_id {
        params["contextId"] = json!(id);
    }

    let result = session.send("Runtime.evaluate", Some(params)).await?;
    check_exception(&result)?;
    Ok(result)
}

fn check_exception(result: &Value) -> Result<(), CollaboratorError> {
    match result.get("exceptionDetails") {
        Some(exception) => {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            Err(CollaboratorError::Script(text.to_string()))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xpath_lookup_expression_escapes() {
        let expr = xpath_lookup_expression("//a[@title=\"x\"]").unwrap();
        assert!(expr.starts_with("document.evaluate(\"//a[@title=\\\"x\\\"]\""));
        assert!(expr.ends_with(".singleNodeValue"));
    }

    #[test]
    fn test_css_lookup_expression() {
        let expr = css_lookup_expression("#login > button").unwrap();
        assert_eq!(expr, "document.querySelector(\"#login > button\")");
    }

    #[test]
    fn test_check_exception() {
        assert!(check_exception(&json!({"result": {"type": "undefined"}})).is_ok());

        let err = check_exception(&json!({
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": {"description": "TypeError: x is null"}
            }
        }))
        .unwrap_err();
        assert!(matches!(err, CollaboratorError::Script(ref m) if m.contains("TypeError")));
    }
}
