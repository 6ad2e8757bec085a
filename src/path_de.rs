use serde::de::DeserializeOwned;

use crate::error::{FormError, Result};

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(decode_error)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(decode_error)
}

fn decode_error<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> FormError {
    let path = err.path().to_string();
    FormError::Decode { path, message: err.into_inner().to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormConfig;

    #[test]
    fn errors_name_the_offending_path() {
        let err = from_str_with_path::<FormConfig>(r#"{"i18n": {"add": 3}}"#).unwrap_err();
        match err {
            FormError::Decode { path, .. } => assert_eq!(path, "i18n.add"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
