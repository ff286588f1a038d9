//! Progress display for the zip command, driven by pipeline events

use gsz_core::ZipHandlers;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

/// Progress bar fed by [`ZipHandlers`] callbacks
#[derive(Debug, Clone)]
pub struct ZipProgress {
    bar: ProgressBar,
}

impl ZipProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_message("Listing objects...");
        Self { bar }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }

    /// Attach listing, download and encoding events to `handlers`
    pub fn attach(&self, handlers: ZipHandlers) -> ZipHandlers {
        let listed = self.bar.clone();
        let received = self.bar.clone();
        let finished = self.bar.clone();

        handlers
            .on_files_listed(move |event| {
                listed.set_style(Self::style());
                listed.set_length(event.count as u64);
                listed.set_message(format!(
                    "{} object(s), {}",
                    event.count,
                    humansize::format_size(event.total_size, humansize::BINARY)
                ));
            })
            .on_file_received(move |event| {
                received.inc(1);
                received.set_message(event.name.to_string());
            })
            .on_finished(move |event| {
                finished.set_message(format!(
                    "archive {}",
                    humansize::format_size(event.size, humansize::BINARY)
                ));
            })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
