use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

/// Stage progress on stderr for the dataset tools.
///
/// `--ui pretty` or `--ui auto` on a terminal draws a spinner per stage;
/// anything else prints `==> stage` lines.
#[derive(Clone, Copy, Debug)]
pub struct Ui {
    spinners: bool,
}

impl Ui {
    pub fn from_args(ui_flag: &str, is_tty: bool) -> Self {
        Self {
            spinners: is_tty && ui_flag != "plain",
        }
    }

    /// Line output only, for tools that prompt on the same terminal.
    pub fn plain(self) -> Self {
        Self { spinners: false }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        let spinner = if self.spinners {
            let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_message(format!("{name}…"));
            Some(spinner)
        } else {
            eprintln!("==> {name}");
            None
        };
        StageGuard {
            name: name.to_string(),
            start: Instant::now(),
            spinner,
        }
    }
}

/// Reports the stage as done, with its duration, when dropped.
pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let took = if elapsed.as_secs() >= 1 {
            format!("{:.2}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        };
        let message = format!("✔ {} ({})", self.name, took);
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}
