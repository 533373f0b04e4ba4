//! Focus selector resolution across iframe boundaries.

use async_trait::async_trait;
use framesnap_protocols::{
    join_xpath, CollaboratorError, FocusResolver, FocusTarget, FrameId, Page, Session,
};
use tracing::debug;

use crate::js::{
    call_function_on, css_lookup_expression, describe_xpath_node, evaluate_handle,
    NODE_XPATH_FUNCTION,
};

/// [`FocusResolver`] backed by CDP.
///
/// XPath selectors may cross iframes: every `iframe`/`frame` step followed by
/// more steps is resolved in its frame and the remainder continues in the
/// child frame. CSS selectors only address the main frame.
#[derive(Debug, Default, Clone)]
pub struct CdpFocusResolver;

impl CdpFocusResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FocusResolver for CdpFocusResolver {
    async fn resolve(
        &self,
        page: &dyn Page,
        selector: &str,
    ) -> Result<Option<FocusTarget>, CollaboratorError> {
        let selector = selector.trim();
        match Selector::parse(selector)? {
            Selector::XPath(xpath) => resolve_xpath(page, xpath).await,
            Selector::Css(css) => resolve_css(page, css).await,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Selector<'a> {
    XPath(&'a str),
    Css(&'a str),
}

impl<'a> Selector<'a> {
    fn parse(selector: &'a str) -> Result<Self, CollaboratorError> {
        if selector.is_empty() {
            return Err(CollaboratorError::InvalidSelector("empty selector".to_string()));
        }
        if let Some(xpath) = selector.strip_prefix("xpath=") {
            return Ok(Self::XPath(xpath.trim()));
        }
        if let Some(css) = selector.strip_prefix("css=") {
            return Ok(Self::Css(css.trim()));
        }
        if selector.starts_with('/') || selector.starts_with('(') {
            Ok(Self::XPath(selector))
        } else {
            Ok(Self::Css(selector))
        }
    }
}

/// Split an xpath on `/`, ignoring separators inside predicates and quotes.
///
/// Empty steps are kept so that joining with `/` restores the input,
/// including `//` descendant steps.
pub(crate) fn split_steps(xpath: &str) -> Result<Vec<String>, CollaboratorError> {
    let mut steps = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in xpath.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    CollaboratorError::InvalidSelector(format!("unbalanced brackets: {}", xpath))
                })?;
            }
            (None, '/') if depth == 0 => {
                steps.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if depth != 0 || quote.is_some() {
        return Err(CollaboratorError::InvalidSelector(format!(
            "unterminated predicate: {}",
            xpath
        )));
    }
    steps.push(current);
    Ok(steps)
}

/// True for steps that select a frame owner element.
fn is_frame_step(step: &str) -> bool {
    let name = step.split('[').next().unwrap_or_default().trim();
    name.eq_ignore_ascii_case("iframe") || name.eq_ignore_ascii_case("frame")
}

/// Indices of frame steps that have more steps after them.
fn hop_indices(steps: &[String]) -> Vec<usize> {
    steps
        .iter()
        .enumerate()
        .filter(|(i, step)| is_frame_step(step) && *i + 1 < steps.len())
        .map(|(i, _)| i)
        .collect()
}

fn segment_path(steps: &[String]) -> String {
    let joined = steps.join("/");
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{}", joined)
    }
}

async fn resolve_xpath(
    page: &dyn Page,
    xpath: &str,
) -> Result<Option<FocusTarget>, CollaboratorError> {
    let steps = split_steps(xpath)?;
    let mut frame_id = page.main_frame_id();
    let mut abs_prefix: Option<String> = None;
    let mut start = 0;

    for end in hop_indices(&steps) {
        // the first segment keeps the caller's form; later ones restart at the child root
        let segment = if start == 0 {
            segment_path(&steps[..=end])
        } else {
            format!("/{}", steps[start..=end].join("/"))
        };

        let session = page.session_for_frame(&frame_id)?;
        let Some(child) = frame_behind(session.as_ref(), &frame_id, &segment).await? else {
            debug!(frame_id = %frame_id, segment = %segment, "Focus iframe not found");
            return Ok(None);
        };

        let prefix = abs_prefix.as_deref().unwrap_or("/");
        abs_prefix = Some(join_xpath(prefix, &segment));
        debug!(parent = %frame_id, child = %child, "Focus selector entered frame");
        frame_id = child;
        start = end + 1;
    }

    let rest = &steps[start..];
    let tail = if start == 0 {
        Some(segment_path(rest))
    } else {
        let joined = rest.join("/");
        (!joined.is_empty()).then(|| format!("/{}", joined))
    };

    Ok(Some(FocusTarget {
        target_frame_id: frame_id,
        tail_xpath: tail.filter(|t| t != "/"),
        abs_prefix,
    }))
}

/// Child frame id of the iframe element at `xpath` in `frame_id`.
async fn frame_behind(
    session: &dyn Session,
    frame_id: &FrameId,
    xpath: &str,
) -> Result<Option<FrameId>, CollaboratorError> {
    let node = describe_xpath_node(session, frame_id, xpath).await?;
    Ok(node
        .as_ref()
        .and_then(|n| n["frameId"].as_str())
        .map(FrameId::from))
}

async fn resolve_css(
    page: &dyn Page,
    selector: &str,
) -> Result<Option<FocusTarget>, CollaboratorError> {
    let frame_id = page.main_frame_id();
    let session = page.session_for_frame(&frame_id)?;

    let handle = evaluate_handle(session.as_ref(), &css_lookup_expression(selector)?, None).await?;
    let Some(object_id) = handle.object_id else {
        debug!(selector, "Focus CSS selector matched nothing");
        return Ok(None);
    };

    let tail = call_function_on(session.as_ref(), &object_id, NODE_XPATH_FUNCTION).await?;
    let tail = tail
        .as_str()
        .filter(|t| !t.is_empty() && *t != "/")
        .map(str::to_string);

    Ok(Some(FocusTarget {
        target_frame_id: frame_id,
        tail_xpath: tail,
        abs_prefix: None,
    }))
}

#[cfg(test)]
#[path = "focus_tests.rs"]
mod tests;
