use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{info, warn, LevelFilter};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static MULTI: OnceLock<MultiProgress> = OnceLock::new();

pub fn init(log_level: LevelFilter) {
    let logger = env_logger::builder()
        .filter_level(log_level)
        .parse_default_env() // Allow overriding log level through RUST_LOG env var
        .build();

    let multi = MultiProgress::new();

    let wrapper = LogWrapper::new(multi.clone(), logger);
    if wrapper.try_init().is_err() {
        warn!(target: "main", "A logger was already installed, keeping it");
    }
    log::set_max_level(log_level);

    let _ = MULTI.set(multi);
}

pub fn run_with_spinner<'a, F, Out>(
    target: &'a str, task_desc: &'a str, function: F,
) -> Out where
    F: FnOnce() -> Out,
{
    let start_time = Instant::now();

    let pb = ProgressBar::new_spinner()
        .with_message(format!("{}...", task_desc));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.white} [{elapsed:.green}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));

    // Set up connection with log library so that progress bars don't jump around
    let multi = MULTI.get();
    if let Some(multi) = multi {
        multi.add(pb.clone());
    }

    let out = function();

    pb.finish_and_clear();
    if let Some(multi) = multi {
        multi.remove(&pb);
    }
    let elapsed = indicatif::HumanDuration(start_time.elapsed());
    info!(target: target, "{} finished (took {})", task_desc, elapsed);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_without_init_returns_result() {
        let out = run_with_spinner("test", "Adding numbers", || 40 + 2);
        assert_eq!(out, 42);
    }
}
