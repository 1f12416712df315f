//! Cargo-style status lines on stderr, e.g. `   Compiling g:app:1.0`.

use std::io::Write;

use console::Style;

/// Width the verb column is right-aligned to.
const LABEL_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Action,
    Info,
    Warn,
}

impl Tone {
    fn style(self) -> Style {
        let style = Style::new().for_stderr().bold();
        match self {
            Tone::Action => style.green(),
            Tone::Info => style.cyan(),
            Tone::Warn => style.yellow(),
        }
    }
}

fn line(tone: Tone, label: &str, message: &str) -> String {
    let padded = format!("{label:>LABEL_WIDTH$}");
    format!("{} {message}", tone.style().apply_to(padded))
}

fn emit(tone: Tone, label: &str, message: &str) {
    let _ = writeln!(std::io::stderr(), "{}", line(tone, label, message));
}

/// Work being done: `Compiling`, `Packaging`, `Downloading`, `Finished`.
pub fn status(label: &str, message: &str) {
    emit(Tone::Action, label, message);
}

/// Work skipped or reported, such as `Fresh`.
pub fn status_info(label: &str, message: &str) {
    emit(Tone::Info, label, message);
}

/// Something the user should look at, such as `Conflicts`.
pub fn status_warn(label: &str, message: &str) {
    emit(Tone::Warn, label, message);
}
