// Presentation layer - Console facade consumed by the UI
pub mod console;
