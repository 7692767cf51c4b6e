//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::bake::{BakeRequest, BakeStep};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar for a bake.
///
/// Steps are: copy base, one per overlay, manifest, publish. Shows an
/// indicatif bar in interactive mode and one line per step otherwise.
pub struct BakeProgress {
    bar: Option<ProgressBar>,
    total: u64,
    visible: bool,
}

impl BakeProgress {
    /// Bar for `request`, or no output when `ctx` is not human-facing
    pub fn for_request(ctx: &UiContext, request: &BakeRequest) -> Self {
        if ctx.is_human() {
            Self::new(ctx, &request.base.base_type, request.overlays.len())
        } else {
            Self::hidden()
        }
    }

    pub fn new(ctx: &UiContext, label: &str, overlay_count: usize) -> Self {
        let total = overlay_count as u64 + 3;
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total);
            if let Ok(bar_style) = ProgressStyle::default_bar().template(
                "  {spinner:.cyan} Baking {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}",
            ) {
                bar.set_style(
                    bar_style
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .progress_chars("━╸─"),
                );
            }
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Baking {}...", label);
            None
        };
        Self {
            bar,
            total,
            visible: true,
        }
    }

    /// No output at all (machine-readable formats)
    pub fn hidden() -> Self {
        Self {
            bar: None,
            total: 0,
            visible: false,
        }
    }

    pub fn on_step(&self, step: &BakeStep) {
        if !self.visible {
            return;
        }

        let Some((pos, message)) = describe_step(step, self.total) else {
            return;
        };

        if let Some(ref bar) = self.bar {
            bar.set_position(pos);
            bar.set_message(message);
        } else {
            println!("  STEP {}/{}: {}", pos, self.total, message);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Map a step to its bar position and label; `None` for steps with no position
fn describe_step(step: &BakeStep, total: u64) -> Option<(u64, String)> {
    match step {
        BakeStep::CacheHit | BakeStep::Resolved(_) => None,
        BakeStep::CopyingBase => Some((1, "copying base".to_string())),
        BakeStep::ApplyingOverlay { index, overlay, .. } => {
            Some((1 + *index as u64, format!("overlay {}", overlay)))
        }
        BakeStep::WritingManifest => Some((total.saturating_sub(1), "manifest".to_string())),
        BakeStep::Publishing => Some((total, "publishing".to_string())),
    }
}
