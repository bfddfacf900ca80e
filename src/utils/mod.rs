pub mod styles;

pub use styles::*;

pub fn warn(mesg: &str) {
    eprintln!("{}", mesg.warn());
}

/// Formats a 64-bit value the way every report does: zero padded hex.
pub fn u64_hex(value: u64) -> String {
    format!("0x{value:016x}")
}

/// Like writeln! but drops write errors: the reports go to stdout/stderr and there's
/// nothing useful to do if those are closed.
macro_rules! uwriteln {
    ($out:expr) => {{
        let _ = writeln!($out);
    }};
    ($out:expr, $($arg:tt)*) => {{
        let _ = writeln!($out, $($arg)*);
    }};
}
pub(crate) use uwriteln;

/// Remove escape sequences from the string (e.g. for colors).
#[cfg(test)]
pub fn strip_escapes(s: &str) -> String {
    // The other way to do this is to change styles.rs to not emit escape sequences for
    // unit tests. But even with an empty style sheet the tabled crate will add escape
    // sequences to the end of lines to reset all modes.
    let mut result = String::with_capacity(s.len());
    let mut escaping = false;

    // Note that escape sequences can be fairly gnarly, e.g. for RGB colors.
    // See https://gist.github.com/fnky/458719343aabd01cfb17a3a4f7296797
    for c in s.chars() {
        if c == '\x1b' {
            escaping = true;
        } else if escaping {
            if c == 'm' {
                escaping = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Runs a report writer against a buffer and returns what it wrote, minus styling.
#[cfg(test)]
pub fn captured<F>(f: F) -> String
where
    F: FnOnce(&mut Vec<u8>),
{
    let mut v: Vec<u8> = Vec::new();
    f(&mut v);
    let s = String::from_utf8(v).unwrap();
    strip_escapes(&s)
}
