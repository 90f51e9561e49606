use std::time::Duration;

use indicatif::ProgressBar;

/// Spinner for work with no known length, such as the startup rating scan.
pub fn indeterminate_bar(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}
