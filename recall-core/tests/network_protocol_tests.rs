// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for relay message framing and field aliases

use proptest::prelude::*;
use recall_core::network::*;

// ============================================================
// Frame sanitizing
// ============================================================

#[test]
fn test_sanitize_strips_bom_and_nul() {
    let frame = Frame::Text("\u{feff}\0{\"type\":\"pull\",\"userId\":\"abc\"}\0\n".into());
    assert_eq!(
        sanitize_frame(frame).as_deref(),
        Some(r#"{"type":"pull","userId":"abc"}"#)
    );
}

#[test]
fn test_sanitize_drops_leading_garbage() {
    let frame = Frame::Text("garbage;;{\"type\":\"pull\",\"u\":\"abc\"}".into());
    assert_eq!(
        sanitize_frame(frame).as_deref(),
        Some(r#"{"type":"pull","u":"abc"}"#)
    );
}

#[test]
fn test_sanitize_binary_frame() {
    let frame = Frame::Binary(br#"{"type":"push-ack","userId":"abc"}"#.to_vec());
    assert_eq!(
        decode_frame(frame).unwrap(),
        Some(SyncMessage::PushAck {
            identity: "abc".into()
        })
    );
}

#[test]
fn test_noise_frames_decode_to_none() {
    let noise = [
        Frame::Text(String::new()),
        Frame::Text("   ".into()),
        Frame::Text("hello".into()),
        Frame::Binary(vec![0xff, 0xfe, 0x00]),
    ];
    for frame in noise {
        assert_eq!(decode_frame(frame), Ok(None));
    }
}

#[test]
fn test_malformed_json_is_an_error() {
    let result = decode_frame(Frame::Text("{\"type\":\"pull\"".into()));
    assert!(matches!(result, Err(NetworkError::InvalidMessage(_))));
}

#[test]
fn test_oversized_frame_rejected() {
    let big = format!("{{\"type\":\"push\",\"userId\":\"a\",\"data\":\"{}\"}}", "x".repeat(MAX_FRAME_SIZE));
    assert!(matches!(
        decode_frame(Frame::Text(big)),
        Err(NetworkError::FrameTooLarge(_))
    ));
}

// ============================================================
// Field aliases
// ============================================================

#[test]
fn test_short_field_names_accepted() {
    let msg = parse_message(r#"{"type":"push","u":"abc","d":"payload","t":42}"#).unwrap();
    assert_eq!(msg, SyncMessage::push("abc", "payload", Some(42)));
}

#[test]
fn test_long_field_names_accepted() {
    let msg = parse_message(r#"{"type":"push","userId":"abc","data":"payload","timestamp":42}"#)
        .unwrap();
    assert_eq!(msg, SyncMessage::push("abc", "payload", Some(42)));
}

#[test]
fn test_null_long_field_falls_back_to_short() {
    let msg = parse_message(r#"{"type":"pull-response","userId":"abc","data":null,"d":"x"}"#)
        .unwrap();
    assert_eq!(
        msg,
        SyncMessage::PullResponse {
            identity: "abc".into(),
            payload: Some("x".into()),
            timestamp: None,
        }
    );
}

#[test]
fn test_both_spellings_in_one_message() {
    let msg = parse_message(
        r#"{"type":"push","userId":"long","u":"short","data":"a","d":"b","timestamp":5,"t":9}"#,
    )
    .unwrap();
    assert_eq!(msg, SyncMessage::push("long", "a", Some(5)));
}

#[test]
fn test_unknown_fields_are_ignored() {
    let msg = parse_message(r#"{"type":"pull","u":"abc","client":"v2"}"#).unwrap();
    assert_eq!(msg, SyncMessage::pull("abc"));
}

#[test]
fn test_float_timestamp_is_truncated() {
    let msg = parse_message(r#"{"type":"push","u":"abc","d":"p","t":42.9}"#).unwrap();
    assert_eq!(msg, SyncMessage::push("abc", "p", Some(42)));
}

#[test]
fn test_pull_response_without_data() {
    let msg = parse_message(r#"{"type":"pull-response","userId":"abc","data":null}"#).unwrap();
    assert_eq!(
        msg,
        SyncMessage::PullResponse {
            identity: "abc".into(),
            payload: None,
            timestamp: None,
        }
    );
}

#[test]
fn test_structured_data_kept_as_json_text() {
    let msg = parse_message(r#"{"type":"push","userId":"abc","data":{"version":"1"}}"#).unwrap();
    assert_eq!(msg, SyncMessage::push("abc", r#"{"version":"1"}"#, None));
}

#[test]
fn test_invalid_messages_rejected() {
    let bad = [
        r#"[1,2]"#,
        r#"{"userId":"abc"}"#,
        r#"{"type":"subscribe","userId":"abc"}"#,
        r#"{"type":"pull"}"#,
        r#"{"type":"pull","userId":""}"#,
        r#"{"type":"pull","userId":7}"#,
        r#"{"type":"push","userId":"abc"}"#,
        r#"["push","abc","payload"]"#,
    ];
    for text in bad {
        assert!(
            matches!(parse_message(text), Err(NetworkError::InvalidMessage(_))),
            "accepted {}",
            text
        );
    }
}

// ============================================================
// Encoding
// ============================================================

#[test]
fn test_encode_uses_long_field_names() {
    let text = encode_message(&SyncMessage::push("abc", "payload", Some(7))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["type"], "push");
    assert_eq!(value["userId"], "abc");
    assert_eq!(value["data"], "payload");
    assert_eq!(value["timestamp"], 7);
    assert!(value.get("u").is_none());
}

#[test]
fn test_encode_pull_omits_data_and_timestamp() {
    let text = encode_message(&SyncMessage::pull("abc")).unwrap();
    assert_eq!(text, r#"{"type":"pull","userId":"abc"}"#);
}

#[test]
fn test_encode_pull_response_writes_null_data() {
    let text = encode_message(&SyncMessage::PullResponse {
        identity: "abc".into(),
        payload: None,
        timestamp: None,
    })
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["type"], "pull-response");
    assert!(value["data"].is_null());
    assert!(value.as_object().unwrap().contains_key("data"));
}

#[test]
fn test_message_kinds() {
    assert_eq!(SyncMessage::pull("a").kind(), MessageKind::Pull);
    assert_eq!(MessageKind::PushAck.as_str(), "push-ack");
    assert_eq!(MessageKind::PullResponse.as_str(), "pull-response");
    assert!(SyncMessage::push("a", "b", None).is_push());
    assert!(!SyncMessage::pull("a").is_push());
}

proptest! {
    /// Arbitrary input never panics the decoder.
    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_frame(Frame::Binary(bytes));
    }

    #[test]
    fn prop_encoded_messages_parse_back(
        identity in "[a-f0-9]{1,64}",
        payload in ".{0,200}",
        timestamp in proptest::option::of(0i64..i64::MAX / 2),
    ) {
        let msg = SyncMessage::push(identity, payload, timestamp);
        let text = encode_message(&msg).unwrap();
        prop_assert_eq!(parse_message(&text).unwrap(), msg);
    }
}
