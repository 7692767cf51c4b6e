//! Terminal output for the CLI
//!
//! `cliclack` styles step output and `indicatif` draws bake progress. Both
//! fall back to plain lines outside a terminal, and stay silent when a
//! command prints JSON or plain results.
//!
//! ```rust,ignore
//! use modbake::ui::{self, BakeProgress, UiContext};
//!
//! let ctx = UiContext::for_format(format);
//! ui::report::bake_header(&ctx, &request);
//! let progress = BakeProgress::for_request(&ctx, &request);
//! let outcome = baker.bake_with_progress(&request, |step| progress.on_step(&step)).await?;
//! progress.finish();
//! ui::report::bake_outcome(&ctx, &outcome);
//! ```

mod context;
mod progress;
pub mod report;

pub use context::UiContext;
pub use progress::{BakeProgress, TaskSpinner};
