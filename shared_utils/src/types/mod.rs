//! Type-Safe Wrappers Module
//!
//! - `file_size`: byte counts with unit parsing
//! - `extension_mask`: normalized extension lists for input and copy masks

pub mod extension_mask;
pub mod file_size;

pub use extension_mask::{CopyMask, ExtensionMask};
pub use file_size::FileSize;

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn file_size_unit_scaling(n in 0u64..1_000_000) {
            prop_assert_eq!(FileSize::parse(&format!("{} KiB", n)).unwrap().bytes(), n * 1024);
            prop_assert_eq!(FileSize::parse(&format!("{}kb", n)).unwrap().bytes(), n * 1000);
            prop_assert_eq!(FileSize::parse(&n.to_string()).unwrap().bytes(), n);
        }

        #[test]
        fn mask_matching_ignores_case_and_dot(ext in "[a-z0-9]{1,5}", stem in "[a-z]{1,8}") {
            let mask = ExtensionMask::parse(&format!(".{}", ext.to_uppercase())).unwrap();
            let file = format!("{}.{}", stem, ext);
            prop_assert!(mask.matches(std::path::Path::new(&file)));
        }
    }
}
