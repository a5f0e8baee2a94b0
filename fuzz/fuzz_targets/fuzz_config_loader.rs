#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary TOML must either fail to parse or fail validation, never panic.
    if let Ok(cfg) = robo_config::load_toml(data) {
        let _ = cfg.validate();
    }
});
