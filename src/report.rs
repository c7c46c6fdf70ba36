use crate::entities::ClassnameCounts;
use crate::header::{Header, OffsetBase};

/// Raw entity text followed by a newline.
pub fn format_raw(text: &str) -> String {
    format!("{text}\n")
}

/// `"<classname>: <count>"` lines in byte-wise classname order.
pub fn format_sorted_counts(counts: &ClassnameCounts) -> Vec<String> {
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    entries
        .into_iter()
        .map(|(classname, count)| format!("{classname}: {count}"))
        .collect()
}

/// One line per directory slot. Entries that do not resolve show the stored offset.
pub fn format_lump_table(header: &Header, base: OffsetBase) -> Vec<String> {
    header
        .lump_defs()
        .map(|(kind, def)| {
            let offset = match header.resolve(kind, base) {
                Ok((offset, _)) => offset.to_string(),
                Err(_) => format!("invalid ({})", def.offset()),
            };
            format!(
                "lump {:2} {:<12} offset: {offset:>10}  length: {}",
                kind.index(),
                kind.name(),
                def.length()
            )
        })
        .collect()
}
