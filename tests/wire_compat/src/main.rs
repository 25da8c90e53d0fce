fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use inkwire_protocol::{
        ApplicationKeyMessage, FrameType, HmacChallenge, HmacMessage, InboundFrame,
        MathParameter, ResetMessage, Stroke, TextParameter, frames,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// Captured frames write coordinates as `10`, Rust serializes `f64` as
    /// `10.0`. Both mean the same thing to the server.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Compares an outbound frame against a captured fixture
    /// (order-independent, float-normalized comparison).
    fn assert_matches_fixture(name: &str, produced: &serde_json::Value) {
        let fixture = load_fixture(name);
        assert_eq!(
            normalize_value(&fixture),
            normalize_value(produced),
            "frame mismatch for {name}:\n  fixture:  {fixture}\n  produced: {produced}"
        );
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and
    /// compares the JSON values.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  Rust:    {reserialized}"
        );
    }

    fn first_batch() -> Vec<Stroke> {
        let mut s = Stroke::new();
        s.push(10.0, 20.0, 0);
        s.push(12.5, 22.0, 16);
        s.push(15.0, 24.0, 32);
        vec![s]
    }

    fn second_batch() -> Vec<Stroke> {
        let mut s = Stroke::new();
        s.push(30.0, 40.0, 100);
        s.push(31.0, 48.0, 116);
        vec![s]
    }

    // --- Handshake frames ---

    #[test]
    fn fixture_application_key() {
        roundtrip_test::<ApplicationKeyMessage>("application_key.json");
        let msg = ApplicationKeyMessage::new("7d223f9e-a3cb-4213-ba4b-85e930605f8b");
        assert_matches_fixture(
            "application_key.json",
            &serde_json::to_value(&msg).unwrap(),
        );
    }

    #[test]
    fn fixture_hmac_challenge_answer() {
        let frame = InboundFrame::from_value(load_fixture("hmac_challenge.json")).unwrap();
        assert_eq!(frame.frame_type, FrameType::HmacChallenge);

        let challenge: HmacChallenge = frame.parse_body().unwrap();
        let answer = HmacMessage::answer(&challenge, "app", "secret");
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["type"], "hmac");
        assert_eq!(json["applicationKey"], "app");
        assert_eq!(json["challenge"], "6d1b3c2a-1f0e-4c5d-9a7b-2e8f4d6c1a90");
        // Hex-encoded SHA-512 digest.
        let hmac = json["hmac"].as_str().unwrap();
        assert_eq!(hmac.len(), 128);
        assert!(hmac.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fixture_reset() {
        roundtrip_test::<ResetMessage>("reset.json");
        assert_matches_fixture(
            "reset.json",
            &serde_json::to_value(ResetMessage::default()).unwrap(),
        );
    }

    // --- Recognition input frames ---

    #[test]
    fn fixture_math_start() {
        let frame = frames::math_start(&MathParameter::default(), &first_batch());
        assert_matches_fixture("math_start.json", &frame);
    }

    #[test]
    fn fixture_math_continue() {
        let frame = frames::math_continue(&second_batch());
        assert_matches_fixture("math_continue.json", &frame);
    }

    #[test]
    fn fixture_text_start() {
        let frame = frames::text_start(&TextParameter::default(), &first_batch());
        assert_matches_fixture("text_start.json", &frame);
    }

    #[test]
    fn fixture_text_continue() {
        let frame = frames::text_continue(&second_batch());
        assert_matches_fixture("text_continue.json", &frame);
    }

    #[test]
    fn fixture_math_parameter_defaults() {
        let fixture = load_fixture("math_start.json");
        let params: MathParameter =
            serde_json::from_value(fixture["parameters"].clone()).unwrap();
        assert_eq!(params, MathParameter::default());
    }

    // --- Server frames ---

    #[test]
    fn fixture_math_result_passes_through() {
        let fixture = load_fixture("math_result.json");
        let frame = InboundFrame::from_value(fixture.clone()).unwrap();
        assert_eq!(frame.frame_type, FrameType::MathResult);
        assert!(frame.server_error().is_none());
        assert_eq!(frame.into_body(), fixture);
    }

    #[test]
    fn fixture_error() {
        let frame = InboundFrame::from_value(load_fixture("error.json")).unwrap();
        let err = frame.server_error().expect("error frame");
        assert_eq!(err.code_text().as_deref(), Some("access.not.granted"));
        assert_eq!(err.describe(), "Access not granted");
    }

    #[test]
    fn legacy_error_without_message_field() {
        let frame = InboundFrame::from_value(load_fixture("error_legacy.json")).unwrap();
        let err = frame.server_error().expect("error frame");
        assert!(err.code_text().is_none(), "missing code should default to None");
        assert_eq!(err.describe(), "Session too long");
    }
}
