//! PayloadCodec - payload (JSON) と Operation の相互変換

use super::operation::Operation;
use crate::domain::HandlerError;

pub struct PayloadCodec;

impl PayloadCodec {
    pub fn encode<T: Operation>(operation: &T) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(operation)
    }

    /// Decode failure is a permanent handler failure: the same payload will
    /// never decode on a later replay either.
    pub fn decode<T: Operation>(payload: serde_json::Value) -> Result<T, HandlerError> {
        serde_json::from_value(payload).map_err(|e| {
            HandlerError::permanent(format!("json decode for {}: {e}", T::TYPE)).with_source(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::typed::operation::fixtures::CreateNote;
    use serde_json::json;

    #[test]
    fn encode_then_decode() {
        let op = CreateNote {
            title: "groceries".into(),
        };
        let payload = PayloadCodec::encode(&op).unwrap();
        assert_eq!(payload, json!({"title": "groceries"}));
        assert_eq!(PayloadCodec::decode::<CreateNote>(payload).unwrap(), op);
    }

    #[test]
    fn decode_mismatch_is_permanent() {
        let err = PayloadCodec::decode::<CreateNote>(json!({"id": 3})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert!(err.message().contains(CreateNote::TYPE));
    }
}
