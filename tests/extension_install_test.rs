//! Install-once semantics live in their own binary: once any test in a
//! process touches the hooks, the installation is latched for good.

use spine_ngin::runtime::extension::{self, HOST_EXTENSION};

#[test]
fn hooks_install_exactly_once() {
    extension::install(HOST_EXTENSION).expect("first install must succeed");
    assert!(extension::install(HOST_EXTENSION).is_err());

    // install_default after the fact is tolerated and changes nothing.
    extension::install_default();
    assert!(!extension::allocate(16).is_null());
}
