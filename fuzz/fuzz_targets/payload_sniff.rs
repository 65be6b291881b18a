#![no_main]

use libfuzzer_sys::fuzz_target;

use reqstash::cache::fuzzing::PayloadKind;

fuzz_target!(|data: &[u8]| {
    let kind = PayloadKind::sniff(data);

    // The suffix and the image flag must agree with the detected kind.
    let extension = kind.extension();
    if kind == PayloadKind::Unknown {
        assert!(extension.is_empty());
        assert!(!kind.is_image());
    } else {
        assert!(extension.starts_with('.'));
        assert!(extension[1..].bytes().all(|b| b.is_ascii_lowercase()));
    }

    // Detection reads a bounded prefix, so appending bytes can only refine
    // an Unknown verdict, never change a recognized one.
    if kind != PayloadKind::Unknown {
        let mut extended = data.to_vec();
        extended.extend_from_slice(b"trailing junk");
        assert_eq!(PayloadKind::sniff(&extended), kind);
    }
});
