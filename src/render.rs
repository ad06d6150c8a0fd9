//! Terminal rendering of a highlighted document.

use std::fmt::Write;

use docwright_core::StyledDocument;
use docwright_syntax::StyleDescriptor;

const RESET: &str = "\x1b[0m";

/// Renders every block with 24-bit ANSI colors, one line per block.
pub fn to_ansi(document: &StyledDocument) -> String {
    let mut out = String::with_capacity(document.buffer().len_chars() * 2);
    for (i, block) in document.block_ids().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for run in document.styled_runs(block) {
            match run.style.map(sgr).filter(|codes| !codes.is_empty()) {
                Some(codes) => {
                    let _ = write!(out, "\x1b[{codes}m{}{RESET}", run.text);
                }
                None => out.push_str(&run.text),
            }
        }
    }
    out
}

/// SGR parameters for a style, empty for plain text.
fn sgr(style: StyleDescriptor) -> String {
    let mut codes: Vec<String> = Vec::new();
    if style.bold {
        codes.push("1".into());
    }
    if style.italic {
        codes.push("3".into());
    }
    if style.underline {
        codes.push("4".into());
    }
    if let Some(fg) = style.foreground {
        codes.push(format!("38;2;{};{};{}", fg.r, fg.g, fg.b));
    }
    if let Some(bg) = style.background {
        codes.push(format!("48;2;{};{};{}", bg.r, bg.g, bg.b));
    }
    codes.join(";")
}
