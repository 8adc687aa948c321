//! Stock keeping unit codes for product variants.
//!
//! Format: `P{product_id}-{COL}-{SIZ}-{XXXXXX}` where the first two segments
//! are the uppercased first three characters of color and size and the last
//! is six random uppercase hex digits. Uniqueness is enforced by the store.

use uuid::Uuid;

const PREFIX_CHARS: usize = 3;
const RANDOM_HEX_DIGITS: usize = 6;

pub fn generate_sku(product_id: i64, color: &str, size: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "P{product_id}-{}-{}-{}",
        segment(color),
        segment(size),
        random[..RANDOM_HEX_DIGITS].to_ascii_uppercase()
    )
}

fn segment(value: &str) -> String {
    value
        .chars()
        .take(PREFIX_CHARS)
        .collect::<String>()
        .to_uppercase()
}
