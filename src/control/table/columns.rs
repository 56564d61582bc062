//! Two-pass column width negotiation.
//!
//! Rows *propose* the width each of their cells wants during measure; the
//! table *finalizes* once, at arrange, by scaling every column so the widths
//! sum exactly to the width the table was given. Columns are never clamped
//! individually: a column that asked for 4000px next to one that asked for
//! 2000px still ends up twice as wide after normalization.

use std::collections::BTreeMap;

use crate::geometry::ColumnLength;

const EPSILON: f32 = 1e-3;

/// What the rows asked for one column.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnRequest {
    /// Largest content width proposed by any cell.
    pub desired: f32,
    /// Largest declared width of any cell.
    pub declared: ColumnLength,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnNegotiation {
    requests: BTreeMap<usize, ColumnRequest>,
    min_columns: usize,
    bound: f32,
    dpi: f32,
    widths: Vec<f32>,
}

impl ColumnNegotiation {
    /// `min_columns` forces a column count even when rows are short or
    /// absent. `bound` resolves percentage declarations.
    pub fn new(min_columns: usize, bound: f32, dpi: f32) -> Self {
        Self {
            requests: BTreeMap::new(),
            min_columns,
            bound,
            dpi,
            widths: Vec::new(),
        }
    }

    /// Record that a cell starting at column `index` and spanning `span`
    /// columns wants `desired` pixels. The width and any declaration are
    /// split evenly over the spanned columns; each column keeps the largest
    /// value it has seen.
    pub fn propose(&mut self, index: usize, span: u32, desired: f32, declared: ColumnLength) {
        let span = span.max(1);
        let share = desired / span as f32;
        let declared = declared.divided_by(span);
        for column in index..index + span as usize {
            let request = self.requests.entry(column).or_default();
            request.desired = request.desired.max(share);
            request.declared = request.declared.max_of(declared, self.bound, self.dpi);
        }
    }

    pub fn column_count(&self) -> usize {
        let proposed = self
            .requests
            .keys()
            .next_back()
            .map_or(0, |last| last + 1);
        proposed.max(self.min_columns)
    }

    pub fn request(&self, index: usize) -> Option<ColumnRequest> {
        self.requests.get(&index).copied()
    }

    /// Sum of desired widths, before normalization.
    pub fn desired_total(&self) -> f32 {
        (0..self.column_count())
            .map(|i| self.base_width(i))
            .sum()
    }

    fn base_width(&self, index: usize) -> f32 {
        match self.requests.get(&index) {
            Some(ColumnRequest {
                declared: ColumnLength::Fixed(length),
                ..
            }) if !length.is_auto() => length.to_pixels(self.bound, self.dpi),
            Some(request) => request.desired,
            None => 0.0,
        }
    }

    /// Compute final widths summing to `available`.
    ///
    /// Explicit declarations replace the desired width. Weighted (`n*`)
    /// columns share whatever the others leave. Everything is then scaled by
    /// `available / total`; with nothing requested the width is split evenly.
    pub fn finalize(&mut self, available: f32) -> &[f32] {
        let count = self.column_count();
        let mut widths: Vec<f32> = (0..count).map(|i| self.base_width(i)).collect();

        let weights: Vec<(usize, f32)> = self
            .requests
            .iter()
            .filter_map(|(i, r)| match r.declared {
                ColumnLength::Parts(p) => Some((*i, p)),
                ColumnLength::Fixed(_) => None,
            })
            .collect();
        if !weights.is_empty() {
            let fixed: f32 = widths
                .iter()
                .enumerate()
                .filter(|(i, _)| !weights.iter().any(|(w, _)| w == i))
                .map(|(_, w)| *w)
                .sum();
            let free = (available - fixed).max(0.0);
            let total_weight: f32 = weights.iter().map(|(_, p)| *p).sum();
            for (index, weight) in &weights {
                widths[*index] = if total_weight > EPSILON {
                    free * weight / total_weight
                } else {
                    free / weights.len() as f32
                };
            }
        }

        let total: f32 = widths.iter().sum();
        if count > 0 {
            if total <= EPSILON {
                widths.iter_mut().for_each(|w| *w = available / count as f32);
            } else {
                let factor = available / total;
                widths.iter_mut().for_each(|w| *w *= factor);
            }
        }
        log::debug!("finalized {count} columns over {available}px: {widths:?}");
        self.widths = widths;
        &self.widths
    }

    /// Widths from the last [`finalize`](Self::finalize).
    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    /// Combined width of `span` columns starting at `index`. Columns past
    /// the end contribute nothing.
    pub fn spanned(&self, index: usize, span: u32) -> f32 {
        self.widths
            .iter()
            .skip(index)
            .take(span as usize)
            .sum()
    }

    /// Left edge of column `index`.
    pub fn offset(&self, index: usize) -> f32 {
        self.widths.iter().take(index).sum()
    }
}
