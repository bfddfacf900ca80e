//! C++ symbol demangling. The kernel is C++ so most symbols arrive mangled; we hand them
//! all to an external demangler in one batch.
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const EXIT_POLL: Duration = Duration::from_millis(5);

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

pub trait Demangler {
    /// Returns one name per input name, in the same order, or None if demangling
    /// wasn't possible.
    fn demangle(&self, names: &[String]) -> Option<Vec<String>>;
}

/// Leaves names alone.
pub struct NoDemangle;

impl Demangler for NoDemangle {
    fn demangle(&self, names: &[String]) -> Option<Vec<String>> {
        Some(names.to_vec())
    }
}

/// Runs a c++filt style program: mangled names go to stdin one per line and come
/// back on stdout the same way.
pub struct CxxFilt {
    pub program: String,
    pub timeout: Duration,
}

impl CxxFilt {
    pub fn new(program: &str, timeout: Duration) -> Self {
        CxxFilt {
            program: program.to_string(),
            timeout,
        }
    }
}

impl Default for CxxFilt {
    fn default() -> Self {
        CxxFilt::new("llvm-cxxfilt", Duration::from_secs(10))
    }
}

impl Demangler for CxxFilt {
    fn demangle(&self, names: &[String]) -> Option<Vec<String>> {
        if names.is_empty() {
            return Some(Vec::new());
        }

        let mut child = match Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                log::debug!("couldn't run {}: {err}", self.program);
                return None;
            }
        };

        // Write and read on their own threads: a large batch can fill both pipes. The
        // writer isn't joined, killing the child unblocks it.
        let deadline = Instant::now() + self.timeout;
        let mut stdin = child.stdin.take()?;
        let mut stdout = child.stdout.take()?;
        let input = names.join("\n");
        thread::spawn(move || {
            let _ = stdin.write_all(input.as_bytes());
        });
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut output = String::new();
            let result = stdout.read_to_string(&mut output).map(|_| output);
            let _ = tx.send(result);
        });

        let output = match rx.recv_timeout(self.timeout) {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                log::debug!("error reading from {}: {err}", self.program);
                kill(&mut child);
                return None;
            }
            Err(_) => {
                log::debug!("{} timed out after {:?}", self.program, self.timeout);
                kill(&mut child);
                return None;
            }
        };

        // stdout can close before the program exits.
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL),
                Ok(None) => {
                    log::debug!("{} didn't exit after {:?}", self.program, self.timeout);
                    kill(&mut child);
                    return None;
                }
                Err(err) => {
                    log::debug!("couldn't wait on {}: {err}", self.program);
                    kill(&mut child);
                    return None;
                }
            }
        };
        if !status.success() {
            log::debug!("{} failed: {status}", self.program);
            return None;
        }

        Some(
            output
                .trim_end_matches('\n')
                .split('\n')
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect(),
        )
    }
}

/// Demangles names, falling back to the original names if the demangler can't be
/// used or doesn't return one name per input.
pub fn demangle_batch(demangler: &dyn Demangler, names: Vec<String>) -> Vec<String> {
    if names.is_empty() {
        return names;
    }
    match demangler.demangle(&names) {
        Some(demangled) if demangled.len() == names.len() => demangled,
        Some(demangled) => {
            log::debug!(
                "demangler returned {} names for {} symbols",
                demangled.len(),
                names.len()
            );
            names
        }
        None => names,
    }
}
