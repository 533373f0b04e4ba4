//! Capture and frame listing command handlers.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use framesnap_cdp::{CdpClient, CdpDomIndexer, CdpFocusResolver, CdpOutlineProvider, CdpPage};
use framesnap_config::Config;
use framesnap_core::{build_frame_context, CaptureOptions, HybridSnapshotter};
use framesnap_protocols::{CombinedSnapshot, FrameContext, FrameId, Page};

use crate::cli::{BrowserArgs, OutputFormat};

/// Options for `framesnap capture` after merging CLI flags over the config.
pub(crate) struct CaptureCommand {
    pub focus: Option<String>,
    pub experimental: bool,
    pub per_frame: bool,
    pub format: OutputFormat,
}

impl CaptureCommand {
    /// CLI flags win; switches enable a setting, they never disable one.
    pub(crate) fn resolve(
        config: &Config,
        focus: Option<String>,
        experimental: bool,
        per_frame: bool,
        format: OutputFormat,
    ) -> Self {
        Self {
            focus: focus.or_else(|| config.capture.focus_selector().map(str::to_string)),
            experimental: experimental || config.capture.experimental,
            per_frame: per_frame || config.capture.include_per_frame,
            format,
        }
    }

    fn options(&self) -> CaptureOptions {
        let mut options = CaptureOptions::new()
            .with_experimental(self.experimental)
            .with_per_frame(self.per_frame);
        if let Some(focus) = &self.focus {
            options = options.with_focus_selector(focus.clone());
        }
        options
    }
}

async fn connect(
    config: &Config,
    browser: &BrowserArgs,
) -> Result<(CdpClient, CdpPage), Box<dyn std::error::Error>> {
    let endpoint = browser
        .endpoint
        .as_deref()
        .unwrap_or(&config.browser.endpoint);
    let target = browser.target.as_deref().or(config.browser.target());

    let client = CdpClient::connect(endpoint, config.browser.call_timeout()).await?;
    let page = CdpPage::attach(&client, target).await?;
    Ok((client, page))
}

/// Capture one snapshot and print or write it.
pub(crate) async fn run_capture(
    config: &Config,
    browser: &BrowserArgs,
    command: CaptureCommand,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_client, page) = connect(config, browser).await?;

    let snapshotter = HybridSnapshotter::new(
        Arc::new(CdpDomIndexer::new()),
        Arc::new(CdpOutlineProvider::new()),
        Arc::new(CdpFocusResolver::new()),
    );
    let snapshot = snapshotter.capture(&page, &command.options()).await?;

    for diagnostic in &snapshot.diagnostics {
        warn!(
            stage = ?diagnostic.stage,
            frame_id = ?diagnostic.frame_id,
            "Partial capture: {}",
            diagnostic.message
        );
    }

    let rendered = render(&snapshot, command.format)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!("Snapshot written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

pub(crate) fn render(
    snapshot: &CombinedSnapshot,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Tree => Ok(snapshot.combined_tree.clone()),
        OutputFormat::Json => serde_json::to_string_pretty(snapshot),
    }
}

/// Print the page's frames in capture order.
pub(crate) async fn run_frames(
    config: &Config,
    browser: &BrowserArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let (_client, page) = connect(config, browser).await?;
    let context = build_frame_context(&page)?;
    let tree = page.frame_tree();

    println!("{:<8} {:<34} {:<34} URL", "ORDINAL", "FRAME", "SESSION");
    for frame_id in &context.frames {
        let depth = depth_of(&context, frame_id);
        let session = page
            .session_for_frame(frame_id)
            .ok()
            .and_then(|s| s.id().map(str::to_string))
            .unwrap_or_else(|| "-".to_string());
        let url = tree
            .find(frame_id)
            .and_then(|node| node.url.clone())
            .unwrap_or_default();
        println!(
            "{:<8} {:<34} {:<34} {}",
            page.ordinal(frame_id),
            format!("{}{}", "  ".repeat(depth), frame_id),
            session,
            url
        );
    }
    Ok(())
}

fn depth_of(context: &FrameContext, frame_id: &FrameId) -> usize {
    let mut depth = 0;
    let mut current = frame_id;
    while let Some(parent) = context.parent_of(current) {
        depth += 1;
        current = parent;
        if depth > context.frames.len() {
            break;
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use framesnap_config::ConfigLoader;

    #[test]
    fn test_capture_command_prefers_cli() {
        let config = ConfigLoader::load_str(
            r#"
[capture]
experimental = true
focus_selector = "//main"
"#,
        )
        .unwrap();

        let cmd = CaptureCommand::resolve(
            &config,
            Some("#cart".into()),
            false,
            false,
            OutputFormat::Tree,
        );
        assert_eq!(cmd.focus.as_deref(), Some("#cart"));
        assert!(cmd.experimental);
        assert!(!cmd.per_frame);

        let cmd = CaptureCommand::resolve(&config, None, false, true, OutputFormat::Json);
        assert_eq!(cmd.focus.as_deref(), Some("//main"));
        assert!(cmd.per_frame);
        assert_eq!(cmd.options().focus_selector.as_deref(), Some("//main"));
    }

    #[test]
    fn test_render_formats() {
        let snapshot = CombinedSnapshot {
            combined_tree: "[0-1] RootWebArea: Home".to_string(),
            ..Default::default()
        };

        assert_eq!(
            render(&snapshot, OutputFormat::Tree).unwrap(),
            "[0-1] RootWebArea: Home"
        );
        let json = render(&snapshot, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["combined_tree"], "[0-1] RootWebArea: Home");
    }
}
