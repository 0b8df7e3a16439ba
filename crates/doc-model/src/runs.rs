//! Run-length character format map.
//!
//! A [`RunMap`] assigns a [`CharFormat`] to every character of a text block as
//! a sorted list of contiguous runs. Like the style intervals of an editor's
//! highlight layer, the map must be re-based whenever text is inserted or
//! removed so run boundaries keep tracking the same characters.

use crate::format::{CharFormat, CharFormatPatch};
use std::ops::Range;

/// One contiguous run of identically formatted characters.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    len: usize,
    format: CharFormat,
}

/// Run-length map of character formats over char offsets.
///
/// Invariant: runs cover exactly `total_len()` characters, every run has a
/// non-zero length, and no two adjacent runs share the same format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunMap {
    runs: Vec<Run>,
}

impl RunMap {
    /// An empty map covering zero characters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A map covering `len` characters with the default format.
    pub fn with_len(len: usize) -> Self {
        let mut map = Self::new();
        map.inserted(0, len);
        map
    }

    /// Total number of characters covered.
    pub fn total_len(&self) -> usize {
        self.runs.iter().map(|run| run.len).sum()
    }

    /// Format in effect at `offset`. Falls back to the default format when the
    /// map is empty or `offset` is past the end.
    pub fn format_at(&self, offset: usize) -> CharFormat {
        let mut start = 0;
        for run in &self.runs {
            if offset < start + run.len {
                return run.format.clone();
            }
            start += run.len;
        }
        CharFormat::default()
    }

    /// Apply `patch` to every character in `[start, end)`.
    ///
    /// Returns the replaced runs, clipped to the range, so the caller can
    /// restore them later with [`restore`](Self::restore).
    pub fn set_format(
        &mut self,
        start: usize,
        end: usize,
        patch: &CharFormatPatch,
    ) -> Vec<(Range<usize>, CharFormat)> {
        let end = end.min(self.total_len());
        if start >= end {
            return Vec::new();
        }

        let saved = self.formats_in(start, end);
        self.split_at(start);
        self.split_at(end);

        let mut offset = 0;
        for run in &mut self.runs {
            let run_range = offset..offset + run.len;
            if run_range.start >= start && run_range.end <= end {
                patch.apply_to(&mut run.format);
            }
            offset = run_range.end;
        }

        self.coalesce();
        saved
    }

    /// Overwrite `[range]` with an exact format, bypassing patch semantics.
    /// Used to restore runs captured by [`set_format`](Self::set_format).
    pub fn restore(&mut self, saved: &[(Range<usize>, CharFormat)]) {
        for (range, format) in saved {
            self.split_at(range.start);
            self.split_at(range.end);
            let mut offset = 0;
            for run in &mut self.runs {
                let run_range = offset..offset + run.len;
                if run_range.start >= range.start && run_range.end <= range.end {
                    run.format = format.clone();
                }
                offset = run_range.end;
            }
        }
        self.coalesce();
    }

    /// Re-base the map after `len` characters were inserted at `pos`.
    ///
    /// The inserted characters inherit the format of the run containing the
    /// insertion point (the preceding run at a boundary), matching how typing
    /// continues the surrounding format.
    pub fn inserted(&mut self, pos: usize, len: usize) {
        if len == 0 {
            return;
        }
        let mut offset = 0;
        for run in &mut self.runs {
            // Boundary insertions extend the run that ends there.
            if pos > offset && pos <= offset + run.len {
                run.len += len;
                return;
            }
            offset += run.len;
        }
        // Insertion at offset 0 or into an empty map.
        if let Some(first) = self.runs.first_mut() {
            first.len += len;
        } else {
            self.runs.push(Run {
                len,
                format: CharFormat::default(),
            });
        }
    }

    /// Re-base the map after the characters in `[start, end)` were removed.
    pub fn removed(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let mut offset = 0;
        for run in &mut self.runs {
            let run_start = offset;
            let run_end = offset + run.len;
            offset = run_end;

            let overlap_start = run_start.max(start);
            let overlap_end = run_end.min(end);
            if overlap_start < overlap_end {
                run.len -= overlap_end - overlap_start;
            }
        }
        self.runs.retain(|run| run.len > 0);
        self.coalesce();
    }

    /// Replaced-run snapshot of `[start, end)` without mutating the map.
    fn formats_in(&self, start: usize, end: usize) -> Vec<(Range<usize>, CharFormat)> {
        let mut saved = Vec::new();
        let mut offset = 0;
        for run in &self.runs {
            let run_start = offset;
            let run_end = offset + run.len;
            offset = run_end;

            let overlap_start = run_start.max(start);
            let overlap_end = run_end.min(end);
            if overlap_start < overlap_end {
                saved.push((overlap_start..overlap_end, run.format.clone()));
            }
        }
        saved
    }

    /// Ensure a run boundary exists at `pos`.
    fn split_at(&mut self, pos: usize) {
        let mut offset = 0;
        for idx in 0..self.runs.len() {
            let run_start = offset;
            let run_end = offset + self.runs[idx].len;
            if pos > run_start && pos < run_end {
                let tail_len = run_end - pos;
                self.runs[idx].len = pos - run_start;
                let format = self.runs[idx].format.clone();
                self.runs.insert(
                    idx + 1,
                    Run {
                        len: tail_len,
                        format,
                    },
                );
                return;
            }
            offset = run_end;
        }
    }

    /// Merge adjacent runs with identical formats.
    fn coalesce(&mut self) {
        let mut idx = 0;
        while idx + 1 < self.runs.len() {
            if self.runs[idx].format == self.runs[idx + 1].format {
                let merged = self.runs.remove(idx + 1);
                self.runs[idx].len += merged.len;
            } else {
                idx += 1;
            }
        }
    }
}
