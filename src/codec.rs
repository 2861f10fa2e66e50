//! Typed value codec
//!
//! Converts caller values to bytes and back. The type is chosen at the call
//! site through generic methods, so no runtime inspection of values happens.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::error::Category;

use crate::error::{PrefsError, PrefsResult};

/// Serialize/deserialize pair used by the preference store
pub trait Codec: Send + Sync {
    /// Encode a value into bytes
    fn encode<T>(&self, value: &T) -> PrefsResult<Vec<u8>>
    where
        T: Serialize + ?Sized;

    /// Decode bytes into a value of type `T`
    ///
    /// Fails with [`PrefsError::MalformedData`] when the bytes are not a
    /// valid encoding of `T`.
    fn decode<T>(&self, bytes: &[u8]) -> PrefsResult<T>
    where
        T: DeserializeOwned;
}

/// Compact JSON codec backed by serde_json
///
/// JSON has no encoding for NaN or infinity, so values containing them are
/// rejected on encode instead of being written as `null`.
///
/// Error messages carry only the error category and position. serde_json's
/// own messages quote the offending input, which here is decrypted data.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T>(&self, value: &T) -> PrefsResult<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        if value.serialize(finite::FiniteFloats).is_err() {
            return Err(PrefsError::malformed(
                "Failed to serialize value: non-finite float (NaN or infinity) cannot be stored",
            ));
        }

        serde_json::to_vec(value).map_err(|e| {
            PrefsError::malformed(format!("Failed to serialize value: {}", describe(&e)))
        })
    }

    fn decode<T>(&self, bytes: &[u8]) -> PrefsResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(bytes).map_err(|e| {
            PrefsError::malformed(format!("Failed to deserialize value: {}", describe(&e)))
        })
    }
}

/// Describe a serde_json error without echoing any of the data
fn describe(error: &serde_json::Error) -> String {
    let category = match error.classify() {
        Category::Io => "I/O error",
        Category::Syntax => "syntax error",
        Category::Data => "value does not match the requested type",
        Category::Eof => "unexpected end of input",
    };
    if error.line() == 0 {
        category.to_string()
    } else {
        format!("{} at line {} column {}", category, error.line(), error.column())
    }
}

mod finite {
    //! Serializer that produces nothing and fails on non-finite floats

    use serde::ser::{self, Error as _, Serialize};

    type Error = serde_json::Error;
    type Result = std::result::Result<(), Error>;

    #[derive(Clone, Copy)]
    pub(super) struct FiniteFloats;

    fn check(value: f64) -> Result {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Error::custom("non-finite float"))
        }
    }

    impl ser::Serializer for FiniteFloats {
        type Ok = ();
        type Error = Error;
        type SerializeSeq = Self;
        type SerializeTuple = Self;
        type SerializeTupleStruct = Self;
        type SerializeTupleVariant = Self;
        type SerializeMap = Self;
        type SerializeStruct = Self;
        type SerializeStructVariant = Self;

        fn serialize_bool(self, _: bool) -> Result {
            Ok(())
        }
        fn serialize_i8(self, _: i8) -> Result {
            Ok(())
        }
        fn serialize_i16(self, _: i16) -> Result {
            Ok(())
        }
        fn serialize_i32(self, _: i32) -> Result {
            Ok(())
        }
        fn serialize_i64(self, _: i64) -> Result {
            Ok(())
        }
        fn serialize_i128(self, _: i128) -> Result {
            Ok(())
        }
        fn serialize_u8(self, _: u8) -> Result {
            Ok(())
        }
        fn serialize_u16(self, _: u16) -> Result {
            Ok(())
        }
        fn serialize_u32(self, _: u32) -> Result {
            Ok(())
        }
        fn serialize_u64(self, _: u64) -> Result {
            Ok(())
        }
        fn serialize_u128(self, _: u128) -> Result {
            Ok(())
        }
        fn serialize_f32(self, v: f32) -> Result {
            check(f64::from(v))
        }
        fn serialize_f64(self, v: f64) -> Result {
            check(v)
        }
        fn serialize_char(self, _: char) -> Result {
            Ok(())
        }
        fn serialize_str(self, _: &str) -> Result {
            Ok(())
        }
        fn serialize_bytes(self, _: &[u8]) -> Result {
            Ok(())
        }
        fn serialize_none(self) -> Result {
            Ok(())
        }
        fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result {
            value.serialize(self)
        }
        fn serialize_unit(self) -> Result {
            Ok(())
        }
        fn serialize_unit_struct(self, _: &'static str) -> Result {
            Ok(())
        }
        fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> Result {
            Ok(())
        }
        fn serialize_newtype_struct<T: ?Sized + Serialize>(
            self,
            _: &'static str,
            value: &T,
        ) -> Result {
            value.serialize(self)
        }
        fn serialize_newtype_variant<T: ?Sized + Serialize>(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            value: &T,
        ) -> Result {
            value.serialize(self)
        }
        fn serialize_seq(self, _: Option<usize>) -> std::result::Result<Self, Error> {
            Ok(self)
        }
        fn serialize_tuple(self, _: usize) -> std::result::Result<Self, Error> {
            Ok(self)
        }
        fn serialize_tuple_struct(
            self,
            _: &'static str,
            _: usize,
        ) -> std::result::Result<Self, Error> {
            Ok(self)
        }
        fn serialize_tuple_variant(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            _: usize,
        ) -> std::result::Result<Self, Error> {
            Ok(self)
        }
        fn serialize_map(self, _: Option<usize>) -> std::result::Result<Self, Error> {
            Ok(self)
        }
        fn serialize_struct(self, _: &'static str, _: usize) -> std::result::Result<Self, Error> {
            Ok(self)
        }
        fn serialize_struct_variant(
            self,
            _: &'static str,
            _: u32,
            _: &'static str,
            _: usize,
        ) -> std::result::Result<Self, Error> {
            Ok(self)
        }
    }

    impl ser::SerializeSeq for FiniteFloats {
        type Ok = ();
        type Error = Error;

        fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
            value.serialize(*self)
        }
        fn end(self) -> Result {
            Ok(())
        }
    }

    impl ser::SerializeTuple for FiniteFloats {
        type Ok = ();
        type Error = Error;

        fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
            value.serialize(*self)
        }
        fn end(self) -> Result {
            Ok(())
        }
    }

    impl ser::SerializeTupleStruct for FiniteFloats {
        type Ok = ();
        type Error = Error;

        fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
            value.serialize(*self)
        }
        fn end(self) -> Result {
            Ok(())
        }
    }

    impl ser::SerializeTupleVariant for FiniteFloats {
        type Ok = ();
        type Error = Error;

        fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
            value.serialize(*self)
        }
        fn end(self) -> Result {
            Ok(())
        }
    }

    impl ser::SerializeMap for FiniteFloats {
        type Ok = ();
        type Error = Error;

        fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result {
            key.serialize(*self)
        }
        fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result {
            value.serialize(*self)
        }
        fn end(self) -> Result {
            Ok(())
        }
    }

    impl ser::SerializeStruct for FiniteFloats {
        type Ok = ();
        type Error = Error;

        fn serialize_field<T: ?Sized + Serialize>(
            &mut self,
            _: &'static str,
            value: &T,
        ) -> Result {
            value.serialize(*self)
        }
        fn end(self) -> Result {
            Ok(())
        }
    }

    impl ser::SerializeStructVariant for FiniteFloats {
        type Ok = ();
        type Error = Error;

        fn serialize_field<T: ?Sized + Serialize>(
            &mut self,
            _: &'static str,
            value: &T,
        ) -> Result {
            value.serialize(*self)
        }
        fn end(self) -> Result {
            Ok(())
        }
    }
}
