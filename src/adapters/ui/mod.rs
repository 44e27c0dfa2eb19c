pub mod banner;
pub mod progress;
pub mod tui;

pub use banner::RunInfo;

/// Prints the welcome banner with the run summary. Call once, after config is loaded.
pub fn init_ui(info: &RunInfo) {
    banner::print_welcome(info);
}
