//! Build wiring that only matters on the ESP-IDF target.
//!
//! Host builds link `critical-section`'s `std` implementation, so a
//! missing target implementation would only show up as a link error on
//! the board.  Check the feature list instead.

const MANIFEST: &str = include_str!("../../Cargo.toml");

/// Entries of the `espidf = [ ... ]` feature list.
fn espidf_feature() -> Vec<&'static str> {
    const OPEN: &str = "\nespidf = [";
    let start = MANIFEST.find(OPEN).expect("espidf feature declared") + OPEN.len();
    let body = &MANIFEST[start..];
    let end = body.find(']').expect("espidf feature list closed");
    body[..end]
        .lines()
        .map(|line| line.trim().trim_end_matches(',').trim_matches('"'))
        .filter(|entry| !entry.is_empty())
        .collect()
}

#[test]
fn espidf_selects_interrupt_safe_critical_section() {
    let entries = espidf_feature();
    assert!(
        entries.contains(&"esp-idf-hal/critical-section"),
        "espidf feature: {entries:?}"
    );
    assert!(entries.contains(&"dep:esp-idf-hal"), "espidf feature: {entries:?}");
}

#[test]
fn host_critical_section_is_std_only_off_target() {
    let host = MANIFEST
        .find("[target.'cfg(not(target_os = \"espidf\"))'.dependencies]")
        .expect("host dependency table");
    let table = &MANIFEST[host..];
    let table = &table[..table[1..].find("\n[").map_or(table.len(), |i| i + 1)];
    assert!(table.contains("critical-section = { version = \"1.2\", features = [\"std\"] }"));
}
