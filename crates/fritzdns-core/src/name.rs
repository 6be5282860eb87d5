//! Host name canonicalisation
//!
//! Every key in a snapshot and every name a query is matched with goes through
//! [`canonical_name`] first, so names differing only in case or in the presence
//! of a trailing dot compare equal.

/// The root name, what a bare label's suffix canonicalises to
pub const ROOT: &str = ".";

/// Case-fold a name and terminate it with a single trailing dot
///
/// An empty name becomes the root (`.`). A name that already ends in a dot is
/// left as is apart from case folding.
pub fn canonical_name(name: &str) -> String {
    let mut name = name.to_lowercase();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

/// Split a query name at its first dot into a canonical label and suffix
///
/// `"Printer.LAN1.example"` becomes `("printer.", "lan1.example.")` and a bare
/// `"printer."` becomes `("printer.", ".")`.
pub fn split_name(name: &str) -> (String, String) {
    let (label, suffix) = name.split_once('.').unwrap_or((name, ""));
    (canonical_name(label), canonical_name(suffix))
}
