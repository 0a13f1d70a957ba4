//! Text rendering of bar charts and stacked histograms

use crate::charts::histogram::StackedHistogram;
use std::fmt::Write;

/// Width of the longest bar in characters
pub const BAR_WIDTH: usize = 40;

const FULL_BLOCK: char = '\u{2588}';
const SERIES_GLYPHS: &[char] = &['\u{2588}', '\u{2593}', '\u{2592}', '\u{2591}'];

fn glyph(series_idx: usize) -> char {
    SERIES_GLYPHS[series_idx % SERIES_GLYPHS.len()]
}

fn scaled(count: usize, max: usize) -> usize {
    if max == 0 {
        return 0;
    }
    let len = (count * BAR_WIDTH + max / 2) / max;
    // keep non-zero counts visible
    if count > 0 {
        len.max(1)
    } else {
        len
    }
}

fn header(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
}

/// Horizontal bars, one row per label
pub fn render_bars(title: &str, rows: &[(String, usize)]) -> String {
    let mut out = String::new();
    header(&mut out, title);

    if rows.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|(_, c)| *c).max().unwrap_or(0);
    for (label, count) in rows {
        let bar: String = std::iter::repeat(FULL_BLOCK).take(scaled(*count, max)).collect();
        let _ = writeln!(out, "{label:>label_width$} | {bar} {count}");
    }
    out
}

/// Horizontal stacked bars, one row per group and one segment per series
pub fn render_grouped(
    title: &str,
    series_label: &str,
    groups: &[(String, Vec<(i64, usize)>)],
) -> String {
    let mut out = String::new();
    header(&mut out, title);

    if groups.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    let mut keys: Vec<i64> = groups
        .iter()
        .flat_map(|(_, parts)| parts.iter().map(|(k, _)| *k))
        .collect();
    keys.sort_unstable();
    keys.dedup();
    legend(&mut out, series_label, &keys);

    let label_width = groups.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = groups
        .iter()
        .map(|(_, parts)| parts.iter().map(|(_, c)| *c).sum::<usize>())
        .max()
        .unwrap_or(0);

    for (label, parts) in groups {
        let mut bar = String::new();
        let mut detail = Vec::new();
        for (idx, key) in keys.iter().enumerate() {
            let count = parts
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, c)| *c)
                .unwrap_or(0);
            bar.extend(std::iter::repeat(glyph(idx)).take(scaled(count, max)));
            detail.push(format!("{key}={count}"));
        }
        let _ = writeln!(out, "{label:>label_width$} | {bar} {}", detail.join(" "));
    }
    out
}

/// One row per bin, stacked by series
pub fn render_histogram(title: &str, series_label: &str, hist: &StackedHistogram) -> String {
    let mut out = String::new();
    header(&mut out, title);

    if hist.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    let keys: Vec<i64> = hist.series().keys().copied().collect();
    legend(&mut out, series_label, &keys);

    let ranges: Vec<String> = hist
        .edges()
        .windows(2)
        .map(|w| format!("{:.1}-{:.1}", w[0], w[1]))
        .collect();
    let label_width = ranges.iter().map(|r| r.len()).max().unwrap_or(0);
    let max = (0..hist.bins()).map(|b| hist.bin_total(b)).max().unwrap_or(0);

    for (bin, range) in ranges.iter().enumerate() {
        let mut bar = String::new();
        for (idx, counts) in hist.series().values().enumerate() {
            bar.extend(std::iter::repeat(glyph(idx)).take(scaled(counts[bin], max)));
        }
        let _ = writeln!(out, "{range:>label_width$} | {bar} {}", hist.bin_total(bin));
    }
    out
}

fn legend(out: &mut String, series_label: &str, keys: &[i64]) {
    let entries: Vec<String> = keys
        .iter()
        .enumerate()
        .map(|(idx, key)| format!("{} {key}", glyph(idx)))
        .collect();
    let _ = writeln!(out, "{series_label}: {}", entries.join("  "));
}
