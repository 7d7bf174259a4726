//! Persistence codec.
//!
//! The whole [`StoreState`] is written as pretty-printed JSON so the data
//! file can be read and hand-edited. Decoding rejects anything that would
//! break the store invariants instead of loading a half-valid state.

use thiserror::Error;

use crate::StoreState;

/// Codec failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// State could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Bytes are not a valid store document.
    #[error("decode error: {0}")]
    Decode(String),

    /// Document parsed but violates a store invariant.
    #[error("inconsistent store data: {0}")]
    Inconsistent(String),
}

/// Encode the state for durable storage.
pub fn encode(state: &StoreState) -> Result<Vec<u8>, CodecError> {
    let mut bytes =
        serde_json::to_vec_pretty(state).map_err(|e| CodecError::Encode(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a stored document.
///
/// Empty or whitespace-only input is an empty store.
pub fn decode(bytes: &[u8]) -> Result<StoreState, CodecError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(StoreState::default());
    }

    let state: StoreState =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    state.check_invariants().map_err(CodecError::Inconsistent)?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> StoreState {
        let mut state = StoreState::default();
        state.register_user("key-alice", "alice").unwrap();
        state.register_user("key-bob", "bob").unwrap();
        let a = state.add_todo("todo_1".into(), "Task A", "first");
        let b = state.add_todo("todo_2".into(), "Task B", "second\nline");
        state.mark_complete("key-bob", &b.id).unwrap();
        state.move_todo(&b.id, crate::Direction::Up).unwrap();
        state.mark_complete("key-bob", &a.id).unwrap();
        state.delete_todo(&a.id).unwrap();
        state
    }

    #[test]
    fn round_trip_preserves_everything() {
        let state = populated();
        let decoded = decode(&encode(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn empty_input_is_empty_store() {
        assert_eq!(decode(b""), Ok(StoreState::default()));
        assert_eq!(decode(b"  \n\t "), Ok(StoreState::default()));
    }

    #[test]
    fn tolerates_missing_sections_and_whitespace() {
        let doc = br#"

            {   "todo_items" : { "x" : { "id":"x", "name":"n", "description":"" } },
                "todo_order" : [ "x" ] }
        "#;
        let state = decode(doc).unwrap();
        assert!(state.users.is_empty());
        assert_eq!(state.todo_at(0).map(|item| item.name.as_str()), Some("n"));
    }

    #[test]
    fn malformed_input_is_decode_error() {
        assert!(matches!(decode(b"{ \"users\": [ }"), Err(CodecError::Decode(_))));
        assert!(matches!(decode(b"not json"), Err(CodecError::Decode(_))));
    }

    #[test]
    fn broken_order_is_inconsistent() {
        let doc = br#"{ "todo_items": {}, "todo_order": ["ghost"] }"#;
        assert!(matches!(decode(doc), Err(CodecError::Inconsistent(_))));
    }
}
