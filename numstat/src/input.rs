use numstat_common::{NumstatError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;

/// Open every input up front and join them into one line stream.
///
/// An empty list, or a `-` entry, reads stdin. A file that cannot be opened
/// fails the whole call before any line is consumed. Sources are joined
/// byte-for-byte, so a file lacking a trailing newline runs into the next.
pub fn open_sources(paths: &[PathBuf]) -> Result<Box<dyn BufRead>> {
    if paths.is_empty() {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    let mut readers: Vec<Box<dyn Read>> = Vec::with_capacity(paths.len());
    for path in paths {
        if path.as_os_str() == "-" {
            readers.push(Box::new(io::stdin()));
            continue;
        }
        let file = File::open(path)
            .map_err(|e| NumstatError::Io(format!("cannot open {}: {e}", path.display())))?;
        readers.push(Box::new(file));
    }

    let joined = readers
        .into_iter()
        .fold(Box::new(io::empty()) as Box<dyn Read>, |acc, next| Box::new(acc.chain(next)));
    Ok(Box::new(BufReader::new(joined)))
}
