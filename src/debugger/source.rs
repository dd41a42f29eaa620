//! Source-line cache. Every displayed file is scanned once for line-start
//! byte offsets; later reads seek straight to the line instead of re-scanning
//! the file.

use crate::debugger::error::Error;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub struct SourceView {
    // line-start offsets per file plus a trailing sentinel equal to the file
    // size; populated on first reference, never evicted
    index: RefCell<HashMap<PathBuf, Vec<u64>>>,
}

impl Default for SourceView {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceView {
    pub fn new() -> Self {
        Self {
            index: RefCell::new(HashMap::new()),
        }
    }

    /// Scan the file once and record its line-start offsets. A no-op when
    /// the path is already indexed.
    pub fn ensure_indexed(&self, path: &Path) -> Result<(), Error> {
        if self.index.borrow().contains_key(path) {
            return Ok(());
        }

        let buf = fs::read(path).map_err(|e| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut offsets: Vec<u64> = buf
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .map(|(i, _)| (i + 1) as u64)
            .collect();
        offsets.push(buf.len() as u64);

        debug!(target: "debugger", "indexed {} ({} lines)", path.display(), offsets.len() - 1);
        self.index.borrow_mut().insert(path.to_path_buf(), offsets);
        Ok(())
    }

    /// Number of complete lines of an indexed file.
    pub fn line_count(&self, path: &Path) -> usize {
        self.index
            .borrow()
            .get(path)
            .map(|offsets| offsets.len() - 1)
            .unwrap_or(0)
    }

    /// Read physical line `line` (1-based), trailing newline bytes stripped.
    pub fn read_line(&self, path: &Path, line: usize) -> Result<String, Error> {
        self.ensure_indexed(path)?;

        let (first, last) = {
            let index = self.index.borrow();
            let offsets = &index[path];
            if line == 0 || line > offsets.len() {
                return Err(Error::LineOutOfRange {
                    path: path.to_path_buf(),
                    line,
                });
            }
            let first = if line > 1 { offsets[line - 2] } else { 0 };
            (first, offsets[line - 1])
        };

        let mut file = fs::File::open(path).map_err(|e| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut raw = vec![0u8; (last - first) as usize];
        file.seek(SeekFrom::Start(first))
            .and_then(|_| file.read_exact(&mut raw))
            .map_err(|e| Error::SourceUnavailable {
                path: path.to_path_buf(),
                source: e,
            })?;

        while raw.last() == Some(&b'\n') {
            raw.pop();
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Render `window` lines around `line`, the current line marked with `>`
    /// and every number right-justified to the digit width of the file's
    /// total line count.
    pub fn render_window(
        &self,
        path: &Path,
        line: usize,
        window: usize,
    ) -> Result<String, Error> {
        self.ensure_indexed(path)?;

        let count = self.line_count(path);
        let lines_ahead = (2 * window).saturating_sub(1) / 4;
        let start = line.saturating_sub(lines_ahead).max(1);
        // the upper bound is exclusive; count + 1 lets the window reach the
        // final physical line
        let end = (start + window).min(count + 1);
        let width = count.to_string().len();

        let mut out = String::new();
        for l in start..end {
            let text = self.read_line(path, l)?;
            let marker = if l == line { "> " } else { "  " };
            out = format!("{out}{marker}{l:>width$} {text}\n");
        }
        Ok(out)
    }
}
