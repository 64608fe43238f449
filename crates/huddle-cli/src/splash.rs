//! Intro banner, shown at most once per process

use std::sync::atomic::{AtomicBool, Ordering};

static INTRO_SHOWN: AtomicBool = AtomicBool::new(false);

pub const TITLE: &str = "huddle";
pub const TAGLINE: &str = "Intelligent Meeting Assistant";

/// Claim the intro. Returns true only for the first caller in this process.
pub fn claim_intro() -> bool {
    !INTRO_SHOWN.swap(true, Ordering::AcqRel)
}

/// Print the banner to stderr if it has not been shown yet
pub fn print_intro(base_url: &str) {
    if claim_intro() {
        eprintln!("{TITLE} - {TAGLINE}");
        eprintln!("backend: {base_url}");
        eprintln!("Type /help for commands.");
        eprintln!();
    }
}
