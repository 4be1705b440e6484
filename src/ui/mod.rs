//! Terminal output
//!
//! Interactive terminals get cliclack logs and indicatif spinners. CI and
//! piped output fall back to plain `[OK]`/`[WARN]` lines so build logs stay
//! readable.
//!
//! ```rust,ignore
//! use bunch::ui::{self, PhaseProgress, UiContext};
//!
//! let ctx = UiContext::detect();
//! let progress = PhaseProgress::new(&ctx, "Fetching");
//! // hand `&progress` to the orchestrator as its reporter
//! progress.finish();
//! ui::step_ok_detail(&ctx, "Fetched", "vendor/bundle");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{key_value, remark, step_info, step_ok_detail, step_warn_hint};
pub use progress::PhaseProgress;
pub use prompts::confirm;
pub use theme::{init_theme, BunchTheme};
