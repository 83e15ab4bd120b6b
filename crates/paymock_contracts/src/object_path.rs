#![forbid(unsafe_code)]

use crate::item::{ItemSchema, PACKAGE_STORE_PATH_SUFFIX};

pub const MAIN_OBJECT_PATH: &str = "/com/canonical/pay/store";
pub const STORE_PATH_PREFIX: &str = MAIN_OBJECT_PATH;

/// Escapes one object-path element: letters pass, digits pass unless leading,
/// everything else becomes `_XX`.
pub fn encode_path_element(element: &str) -> String {
    let mut out = String::with_capacity(element.len());
    for (i, ch) in element.chars().enumerate() {
        if ch.is_alphabetic() || (ch.is_ascii_digit() && i > 0) {
            out.push(ch);
        } else {
            out.push_str(&format!("_{:02X}", ch as u32));
        }
    }
    out
}

pub fn store_object_path(schema: ItemSchema, package_name: &str) -> String {
    match schema {
        ItemSchema::PayStore => format!(
            "{STORE_PATH_PREFIX}/{}",
            encode_path_element(package_name)
        ),
        ItemSchema::Libpay => format!("{STORE_PATH_PREFIX}/{package_name}"),
    }
}

pub fn is_package_store_path(schema: ItemSchema, path: &str) -> bool {
    schema == ItemSchema::PayStore && path.ends_with(PACKAGE_STORE_PATH_SUFFIX)
}
