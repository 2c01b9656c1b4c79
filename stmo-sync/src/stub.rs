//! File-name stubs derived from query display names.

use stmo_core::QueryRecord;

/// Filesystem-safe slug of `name`: ASCII letters and digits lowercased, every
/// run of anything else collapsed to one `_`, no leading or trailing `_`.
///
/// `"My Life (And Hard Times)"` → `"my_life_and_hard_times"`.
pub fn stub(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut gap = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            out.push(c.to_ascii_lowercase());
        } else {
            gap = true;
        }
    }
    out
}

/// `<stub>.sql`, falling back to `query_<id>.sql` when the name has nothing
/// usable in it.
pub fn default_file_name(record: &QueryRecord) -> String {
    let stem = stub(&record.name);
    if stem.is_empty() {
        format!("query_{}.sql", stub(record.id.as_str()))
    } else {
        format!("{stem}.sql")
    }
}
