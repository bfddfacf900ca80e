//! Used to color and otherwise style various bits of output using a
//! ~/.wosdump/styles.tcss file.
use std::fs::OpenOptions;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use std::sync::LazyLock;
use std::{fs, path::PathBuf};
use termio::prelude::*;
use termio::{StyledString, Termio};

const STYLE_FILE: &str = "styles.tcss";

/// ~/.wosdump
fn config_dir() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".wosdump");
    Some(path)
}

/// Create the style file if it is missing.
pub fn generate_style_file() {
    match config_dir() {
        Some(dir) if make_dir(&dir) => default_styles(dir.join(STYLE_FILE)),
        Some(_) => (),
        None => log::debug!("couldn't find home directory"), // don't use warn() here
    }
}

pub trait Styling {
    fn explain_title(self) -> StyledString;
    fn explain_text(self) -> StyledString;
    fn hex_offset(self) -> StyledString;
    fn hex_hex(self) -> StyledString;
    fn hex_ascii(self) -> StyledString;
    fn dump_gutter(self) -> StyledString;
    fn dump_note(self) -> StyledString;
    fn section_title(self) -> StyledString;
    fn table_header(self) -> StyledString;
    fn table_sep(self) -> StyledString;
    fn table_field(self) -> StyledString;
    fn warn(self) -> StyledString;
}

// Both String and &str get the same set of styles.
macro_rules! impl_styling {
    ($type:ty) => {
        impl Styling for $type {
            fn explain_title(self) -> StyledString {
                self.style("explain title", &TCSS)
            }

            fn explain_text(self) -> StyledString {
                self.style("explain text", &TCSS)
            }

            fn hex_offset(self) -> StyledString {
                self.style("hex offset", &TCSS)
            }

            fn hex_hex(self) -> StyledString {
                self.style("hex hex", &TCSS)
            }

            fn hex_ascii(self) -> StyledString {
                self.style("hex ascii", &TCSS)
            }

            fn dump_gutter(self) -> StyledString {
                self.style("dump gutter", &TCSS)
            }

            fn dump_note(self) -> StyledString {
                self.style("dump note", &TCSS)
            }

            fn section_title(self) -> StyledString {
                self.style("section title", &TCSS)
            }

            fn table_header(self) -> StyledString {
                self.style("table header", &TCSS)
            }

            fn table_sep(self) -> StyledString {
                self.style("table separator", &TCSS)
            }

            fn table_field(self) -> StyledString {
                self.style("table field", &TCSS)
            }

            fn warn(self) -> StyledString {
                self.style("warn", &TCSS)
            }
        }
    };
}

impl_styling!(String);
impl_styling!(&str);

static TCSS: LazyLock<Termio> = LazyLock::new(|| {
    let Some(path) = config_dir().map(|dir| dir.join(STYLE_FILE)) else {
        return Termio::new();
    };
    if !path.exists() {
        return Termio::new();
    }
    let os_path = path.to_string_lossy().into_owned();
    Termio::from_file(&os_path).unwrap_or_else(|err| {
        eprintln!("couldn't parse file at {os_path}: {err}"); // don't use warn() here
        Termio::new()
    })
});

fn make_dir(path: &Path) -> bool {
    match fs::create_dir(path) {
        Ok(_) => true,
        Err(err) => match err.kind() {
            io::ErrorKind::AlreadyExists => true,
            _ => {
                log::debug!("couldn't create path for {}: {err}", path.display()); // don't use warn() here
                false
            }
        },
    }
}

fn default_styles(path: PathBuf) {
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path.clone())
    {
        Ok(mut file) => {
            let defaults = include_str!("default.tcss");
            if let Err(err) = file.write_all(defaults.as_bytes()) {
                log::debug!("error writing defaults to {}: {err}", path.display());
            }
        }
        Err(err) => match err.kind() {
            io::ErrorKind::AlreadyExists => (), // user already has a styles file
            _ => log::debug!("error creating {}: {err}", path.display()), // don't use warn() here
        },
    }
}
