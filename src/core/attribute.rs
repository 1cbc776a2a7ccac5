//! Attribute rendering
//!
//! Values arrive as anything implementing [`serde::Serialize`]. Scalars are
//! written straight into the record by a dedicated serializer; structs, maps,
//! sequences and data-carrying enum variants are rendered as JSON by
//! `serde_json`.
//!
//! | value            | Json            | Simple              |
//! |------------------|-----------------|---------------------|
//! | `None`, `()`     | `, "k":null`    | ` k=null`           |
//! | `bool`           | `, "k":true`    | ` k="true"`         |
//! | integer, float   | `, "k":7`       | ` k=7`              |
//! | `&str`, `char`   | `, "k": "v"`    | ` k="v"`            |
//! | unit variant     | `, "k":"Tag"`   | ` k="Tag"`          |
//! | compound         | `, "k":{...}`   | ` k={...}`          |
//!
//! Json keys and strings are escaped. Simple strings are written verbatim;
//! with struct escaping enabled, Simple compounds are quoted and every
//! occurrence of the escape source is replaced inside them.

use super::error::{LoggerError, Result};
use super::options::{Format, LoggerOptions};
use serde::ser::{self, Impossible, Serialize};
use std::fmt;
use std::io::Write;

#[derive(Debug, thiserror::Error)]
enum AttrError {
    /// Not a scalar; render through serde_json instead
    #[error("compound value")]
    Compound,

    #[error("{0}")]
    Custom(String),
}

impl ser::Error for AttrError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        AttrError::Custom(msg.to_string())
    }
}

impl From<serde_json::Error> for AttrError {
    fn from(err: serde_json::Error) -> Self {
        AttrError::Custom(err.to_string())
    }
}

impl From<std::io::Error> for AttrError {
    fn from(err: std::io::Error) -> Self {
        AttrError::Custom(err.to_string())
    }
}

/// Append `name` / `value` to a record.
///
/// On failure nothing is left behind in `out`.
pub fn write_attr<V>(out: &mut Vec<u8>, name: &str, value: &V, options: &LoggerOptions) -> Result<()>
where
    V: Serialize + ?Sized,
{
    let mark = out.len();
    let scalar = ScalarWriter {
        out: &mut *out,
        name,
        options,
    };

    let result = match value.serialize(scalar) {
        Ok(()) => return Ok(()),
        Err(AttrError::Compound) => write_compound(out, name, value, options),
        Err(AttrError::Custom(message)) => Err(LoggerError::serialize(name, message)),
    };
    if result.is_err() {
        out.truncate(mark);
    }
    result
}

/// Append a tag such as an enum variant or an error name.
pub fn write_tag(out: &mut Vec<u8>, name: &str, tag: &str, options: &LoggerOptions) -> Result<()> {
    let mark = out.len();
    let result = write_quoted(out, name, tag, options, false);
    if result.is_err() {
        out.truncate(mark);
    }
    result.map_err(|err| LoggerError::serialize(name, err.to_string()))
}

/// Append a string field, such as the message or the caller.
pub fn write_str(out: &mut Vec<u8>, name: &str, value: &str, options: &LoggerOptions) -> Result<()> {
    let mark = out.len();
    let result = write_quoted(out, name, value, options, true);
    if result.is_err() {
        out.truncate(mark);
    }
    result.map_err(|err| LoggerError::serialize(name, err.to_string()))
}

/// `, "name":` (plus a space for string values) or ` name=`.
fn write_key(out: &mut Vec<u8>, name: &str, format: Format, string_value: bool) -> serde_json::Result<()> {
    match format {
        Format::Json => {
            out.extend_from_slice(b", ");
            serde_json::to_writer(&mut *out, name)?;
            out.push(b':');
            if string_value {
                out.push(b' ');
            }
        }
        Format::Simple => {
            out.push(b' ');
            out.extend_from_slice(name.as_bytes());
            out.push(b'=');
        }
    }
    Ok(())
}

fn write_quoted(
    out: &mut Vec<u8>,
    name: &str,
    value: &str,
    options: &LoggerOptions,
    string_value: bool,
) -> serde_json::Result<()> {
    write_key(out, name, options.format, string_value)?;
    match options.format {
        Format::Json => serde_json::to_writer(&mut *out, value)?,
        Format::Simple => {
            out.push(b'"');
            out.extend_from_slice(value.as_bytes());
            out.push(b'"');
        }
    }
    Ok(())
}

fn write_compound<V>(out: &mut Vec<u8>, name: &str, value: &V, options: &LoggerOptions) -> Result<()>
where
    V: Serialize + ?Sized,
{
    let to_error = |err: serde_json::Error| LoggerError::serialize(name, err.to_string());

    write_key(out, name, options.format, false).map_err(to_error)?;
    if options.format == Format::Simple && options.struct_escape_enabled {
        let json = serde_json::to_string(value).map_err(to_error)?;
        out.push(b'"');
        out.extend_from_slice(
            json.replace(options.struct_escape_src.as_str(), &options.struct_escape_dst)
                .as_bytes(),
        );
        out.push(b'"');
    } else {
        serde_json::to_writer(&mut *out, value).map_err(to_error)?;
    }
    Ok(())
}

/// Serializer that writes scalar values and refuses everything else.
struct ScalarWriter<'a> {
    out: &'a mut Vec<u8>,
    name: &'a str,
    options: &'a LoggerOptions,
}

impl ScalarWriter<'_> {
    fn bare(self, value: impl fmt::Display) -> std::result::Result<(), AttrError> {
        write_key(self.out, self.name, self.options.format, false)?;
        write!(self.out, "{}", value)?;
        Ok(())
    }

    fn float(self, value: f64) -> std::result::Result<(), AttrError> {
        if !value.is_finite() && self.options.format == Format::Json {
            return self.null();
        }
        self.bare(value)
    }

    fn null(self) -> std::result::Result<(), AttrError> {
        self.bare("null")
    }

    fn quoted(self, value: &str, string_value: bool) -> std::result::Result<(), AttrError> {
        write_quoted(self.out, self.name, value, self.options, string_value).map_err(AttrError::from)
    }
}

impl<'a> ser::Serializer for ScalarWriter<'a> {
    type Ok = ();
    type Error = AttrError;
    type SerializeSeq = Impossible<(), AttrError>;
    type SerializeTuple = Impossible<(), AttrError>;
    type SerializeTupleStruct = Impossible<(), AttrError>;
    type SerializeTupleVariant = Impossible<(), AttrError>;
    type SerializeMap = Impossible<(), AttrError>;
    type SerializeStruct = Impossible<(), AttrError>;
    type SerializeStructVariant = Impossible<(), AttrError>;

    fn serialize_bool(self, v: bool) -> std::result::Result<(), AttrError> {
        match self.options.format {
            Format::Json => self.bare(v),
            Format::Simple => self.quoted(if v { "true" } else { "false" }, false),
        }
    }

    fn serialize_i8(self, v: i8) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_i16(self, v: i16) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_i32(self, v: i32) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_i64(self, v: i64) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_i128(self, v: i128) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_u8(self, v: u8) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_u16(self, v: u16) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_u32(self, v: u32) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_u64(self, v: u64) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_u128(self, v: u128) -> std::result::Result<(), AttrError> {
        self.bare(v)
    }

    fn serialize_f32(self, v: f32) -> std::result::Result<(), AttrError> {
        if !v.is_finite() {
            return self.float(f64::from(v));
        }
        self.bare(v)
    }

    fn serialize_f64(self, v: f64) -> std::result::Result<(), AttrError> {
        self.float(v)
    }

    fn serialize_char(self, v: char) -> std::result::Result<(), AttrError> {
        let mut utf8 = [0u8; 4];
        self.quoted(v.encode_utf8(&mut utf8), true)
    }

    fn serialize_str(self, v: &str) -> std::result::Result<(), AttrError> {
        self.quoted(v, true)
    }

    fn serialize_bytes(self, _v: &[u8]) -> std::result::Result<(), AttrError> {
        Err(AttrError::Compound)
    }

    fn serialize_none(self) -> std::result::Result<(), AttrError> {
        self.null()
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> std::result::Result<(), AttrError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> std::result::Result<(), AttrError> {
        self.null()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> std::result::Result<(), AttrError> {
        self.null()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> std::result::Result<(), AttrError> {
        self.quoted(variant, false)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<(), AttrError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> std::result::Result<(), AttrError> {
        Err(AttrError::Compound)
    }

    fn serialize_seq(self, _len: Option<usize>) -> std::result::Result<Self::SerializeSeq, AttrError> {
        Err(AttrError::Compound)
    }

    fn serialize_tuple(self, _len: usize) -> std::result::Result<Self::SerializeTuple, AttrError> {
        Err(AttrError::Compound)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, AttrError> {
        Err(AttrError::Compound)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, AttrError> {
        Err(AttrError::Compound)
    }

    fn serialize_map(self, _len: Option<usize>) -> std::result::Result<Self::SerializeMap, AttrError> {
        Err(AttrError::Compound)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStruct, AttrError> {
        Err(AttrError::Compound)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, AttrError> {
        Err(AttrError::Compound)
    }
}
