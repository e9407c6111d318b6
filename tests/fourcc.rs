use proptest::prelude::*;
use v4l_negotiate::FourCC;

proptest! {
    #[test]
    fn encode_reproduces_leading_bytes(code in any::<u32>()) {
        let bytes = code.to_le_bytes();
        let keep = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);

        let text = FourCC::encode(code);
        let decoded: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();

        prop_assert_eq!(&decoded[..], &bytes[..keep]);
    }

    #[test]
    fn text_form_parses_back(code in any::<u32>()) {
        let fourcc = FourCC::from(code);
        let parsed: FourCC = fourcc.to_string().parse().unwrap();
        prop_assert_eq!(u32::from(parsed), code);
    }

    #[test]
    fn ascii_codes_keep_their_bytes(text in "[A-Z0-9]{4}") {
        let fourcc: FourCC = text.parse().unwrap();
        prop_assert_eq!(fourcc.str().unwrap(), text.as_str());
        prop_assert_eq!(FourCC::from(u32::from(fourcc)), fourcc);
    }
}

#[test]
fn serializes_as_text() {
    let fourcc = FourCC::new(b"MJPG");
    assert_eq!(serde_json::to_string(&fourcc).unwrap(), "\"MJPG\"");
    assert_eq!(serde_json::from_str::<FourCC>("\"MJPG\"").unwrap(), fourcc);
    assert!(serde_json::from_str::<FourCC>("\"MJPEG\"").is_err());
}
