#![no_main]

use libfuzzer_sys::fuzz_target;
use verity::compare::compact;
use verity::expect::MessagePattern;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // First line is the configured pattern, the rest is the raised message
        let (pattern, message) = s.split_once('\n').unwrap_or((s, ""));
        if let Ok(pattern) = MessagePattern::parse(pattern) {
            let _ = pattern.is_match(message);
        }
        let _ = compact(pattern, message);
    }
});
