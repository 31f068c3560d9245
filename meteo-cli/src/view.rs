use meteo_core::{Coordinates, CurrentWeather, FetchView, presenter};
use std::sync::atomic::{AtomicBool, Ordering};

const RATIONALE: &str = "Location permission was not granted; the application cannot continue.";

/// Terminal stand-in for the entry and details screens.
///
/// stdout carries the details; everything transient goes to stderr.
#[derive(Debug)]
pub struct TerminalView {
    attached: AtomicBool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self { attached: AtomicBool::new(true) }
    }

    /// The session is over; late results must not be printed.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchView for TerminalView {
    fn set_busy(&self, busy: bool) {
        if busy {
            eprintln!("Fetching current weather...");
        }
    }

    fn show_coordinates(&self, coords: &Coordinates) {
        eprintln!("Latitude: {}", coords.latitude);
        eprintln!("Longitude: {}", coords.longitude);
    }

    fn show_notice(&self, message: &str) {
        eprintln!("{message}");
    }

    fn show_permission_rationale(&self) {
        eprintln!("Warning: {RATIONALE}");
    }

    fn show_details(&self, weather: &CurrentWeather) {
        print!("{}", presenter::render(Some(weather)));
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}
