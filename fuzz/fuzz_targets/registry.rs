#![no_main]

use libfuzzer_sys::fuzz_target;
use libtally::Registry;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let registry = Registry::new();
        if let Ok(account) = registry.account(s) {
            let _ = registry.account(account.name());
        }
        let _ = registry.commodity(s);
    }
});
