//! Terminal capabilities for one command run

use crate::cli::OutputFormat;
use std::io::IsTerminal;

/// Presence of any of these means a build server, not a person
const CI_MARKERS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// How much decoration a command may print.
///
/// `human` is false for machine-readable formats, where stdout must carry
/// only the requested data. `animated` additionally requires a real
/// terminal outside CI, and enables spinners and progress bars.
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    human: bool,
    animated: bool,
}

impl UiContext {
    /// Context for human-facing commands with no `--format` choice
    pub fn detect() -> Self {
        Self::for_format(OutputFormat::Table)
    }

    /// Context for a command printing in `format`
    pub fn for_format(format: OutputFormat) -> Self {
        let human = format == OutputFormat::Table;
        Self {
            human,
            animated: human && attached_to_terminal() && !in_ci(),
        }
    }

    /// Human output without animation, as in a CI log
    pub fn non_interactive() -> Self {
        Self {
            human: true,
            animated: false,
        }
    }

    /// Whether headers, progress and summaries belong on stdout
    pub fn is_human(&self) -> bool {
        self.human
    }

    /// Whether spinners, bars and cliclack styling may be used
    pub fn use_fancy_output(&self) -> bool {
        self.animated
    }
}

fn attached_to_terminal() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

fn in_ci() -> bool {
    CI_MARKERS.iter().any(|name| std::env::var_os(name).is_some())
}
