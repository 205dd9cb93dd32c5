use thiserror::Error;

#[cfg(feature = "wasm")]
pub use wasm::*;

/// Failures reported by a [crate::worker::CacheStore] backend
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Failed to open cache {name}: {message}")]
    Open { name: String, message: String },
    #[error("Failed to store {url} in cache {name}: {message}")]
    Store { name: String, url: String, message: String },
    #[error("Failed to look up {url} in cache {name}: {message}")]
    Lookup { name: String, url: String, message: String },
    #[error("Failed to delete cache {name}: {message}")]
    Delete { name: String, message: String },
    #[error("Failed to enumerate caches: {message}")]
    Enumerate { message: String },
}

#[cfg(feature = "wasm")]
mod wasm {
    use thiserror::Error;
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::js_sys::{
        Error as GenericJsError, RangeError as JsRangeError, ReferenceError as JsReferenceError,
        SyntaxError as JsSyntaxError, TypeError as JsTypeError, UriError as JsUriError,
    };

    #[derive(Debug, Clone, Error)]
    pub enum JsError {
        #[error("GenericJs Error: {0:?}")]
        GenericJs(GenericJsError),
        #[error("JsRange Error: {0:?}")]
        JsRange(JsRangeError),
        #[error("JsReference Error: {0:?}")]
        JsReference(JsReferenceError),
        #[error("JsSyntax Error: {0:?}")]
        JsSyntax(JsSyntaxError),
        #[error("JsType Error: {0:?}")]
        JsType(JsTypeError),
        #[error("JsUri Error: {0:?}")]
        JsUri(JsUriError),
        #[error("UnknownJsValue Error: {0:?}")]
        UnknownJsValue(String),
    }

    impl From<JsValue> for JsError {
        fn from(err: JsValue) -> JsError {
            if err.is_instance_of::<JsRangeError>() {
                return JsError::JsRange(err.into());
            }
            if err.is_instance_of::<JsReferenceError>() {
                return JsError::JsReference(err.into());
            }
            if err.is_instance_of::<JsSyntaxError>() {
                return JsError::JsSyntax(err.into());
            }
            if err.is_instance_of::<JsTypeError>() {
                return JsError::JsType(err.into());
            }
            if err.is_instance_of::<JsUriError>() {
                return JsError::JsUri(err.into());
            }
            if err.is_instance_of::<GenericJsError>() {
                return JsError::GenericJs(err.into());
            }
            JsError::UnknownJsValue(format!("{:?}", err))
        }
    }

    /// A thrown JS value plus its classification
    ///
    /// The original value is kept so it can be rethrown to the page untouched
    #[derive(Debug, Clone, Error)]
    #[error("{error}")]
    pub struct JsFailure {
        value: JsValue,
        error: JsError,
    }

    impl JsFailure {
        pub fn value(&self) -> &JsValue {
            &self.value
        }

        pub fn error(&self) -> &JsError {
            &self.error
        }

        /// Failure for something that returned successfully but with the wrong type
        pub fn unexpected<S: Into<String>>(message: S) -> Self {
            let message = message.into();
            Self { value: JsValue::from_str(&message), error: JsError::UnknownJsValue(message) }
        }
    }

    impl From<JsValue> for JsFailure {
        fn from(value: JsValue) -> Self {
            let error = JsError::from(value.clone());
            Self { value, error }
        }
    }

    impl From<JsFailure> for JsValue {
        fn from(failure: JsFailure) -> Self {
            failure.value
        }
    }
}
