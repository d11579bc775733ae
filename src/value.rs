/*
 * Copyright 2024 Oxide Computer Company
 */

use std::ops::Deref;
use std::result::Result as SResult;

use csnmp::ObjectValue;
use serde::de::value::U32Deserializer;
use serde::de::{DeserializeSeed, Error, SeqAccess, Unexpected};
use serde::Deserializer;

#[derive(Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Value(pub(crate) ObjectValue);

impl Deref for Value {
    type Target = ObjectValue;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<ObjectValue> for Value {
    fn from(val: ObjectValue) -> Self {
        Value(val)
    }
}

impl Value {
    pub fn integer(i: i32) -> Value {
        Value(ObjectValue::Integer(i))
    }

    pub fn string<S: AsRef<[u8]>>(s: S) -> Value {
        Value(ObjectValue::String(s.as_ref().to_vec()))
    }

    pub fn counter32(u: u32) -> Value {
        Value(ObjectValue::Counter32(u))
    }

    pub fn counter64(u: u64) -> Value {
        Value(ObjectValue::Counter64(u))
    }

    pub fn into_inner(self) -> ObjectValue {
        self.0
    }

    /**
     * Any of the integer-like SNMP types, as a signed number.  A Counter64
     * beyond the range of an i64 yields None.
     */
    pub fn as_i64(&self) -> Option<i64> {
        ValueDeserializer(&self.0).as_i64().ok()
    }

    /**
     * Any of the integer-like SNMP types, as an unsigned number.  Negative
     * integers yield None.
     */
    pub fn as_u64(&self) -> Option<u64> {
        ValueDeserializer(&self.0).as_u64().ok()
    }

    /**
     * An OCTET STRING that is valid UTF-8.
     */
    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            ObjectValue::String(buf) => std::str::from_utf8(buf).ok(),
            _ => None,
        }
    }
}

/**
 * A quantity the MIB expresses in tenths of a unit (TenthdBmV, TenthdB).
 * Kept as the integer the device sent until it is asked for as a float, at
 * which point it is divided by ten exactly once: IEEE division is correctly
 * rounded, so 350 becomes exactly the double nearest to 35.0 and -3 the one
 * nearest to -0.3, with no multiply-by-0.1 drift.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tenths(pub i64);

impl Tenths {
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl std::fmt::Display for Tenths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

/**
 * Converters for use with the subtree walker: each one takes a walked value
 * and produces the Rust type a particular MIB object is expected to hold.
 */
pub mod convert {
    use super::{Tenths, Value};
    use crate::{Error, Oid, Result};

    fn unexpected(oid: &Oid, expected: &'static str, value: Value) -> Error {
        Error::UnexpectedValue { oid: *oid, expected, value }
    }

    pub fn integer(oid: &Oid, value: Value) -> Result<i32> {
        match value.as_i64().map(i32::try_from) {
            Some(Ok(i)) => Ok(i),
            _ => Err(unexpected(oid, "a 32-bit integer", value)),
        }
    }

    pub fn unsigned(oid: &Oid, value: Value) -> Result<u32> {
        match value.as_u64().map(u32::try_from) {
            Some(Ok(u)) => Ok(u),
            _ => Err(unexpected(oid, "an unsigned 32-bit integer", value)),
        }
    }

    pub fn counter(oid: &Oid, value: Value) -> Result<u64> {
        value.as_u64().ok_or_else(|| unexpected(oid, "a counter", value))
    }

    /**
     * DisplayString values; bytes that are not UTF-8 are replaced rather than
     * rejected, as devices are not careful about what they put in there.
     */
    pub fn string(oid: &Oid, value: Value) -> Result<String> {
        match value.into_inner() {
            csnmp::ObjectValue::String(buf) => {
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            other => Err(unexpected(oid, "an octet string", Value(other))),
        }
    }

    pub fn tenths(oid: &Oid, value: Value) -> Result<Tenths> {
        value.as_i64().map(Tenths).ok_or_else(|| {
            unexpected(oid, "an integer in tenths of a unit", value)
        })
    }
}

impl<'de> serde::de::IntoDeserializer<'de> for &'de Value {
    type Deserializer = ValueDeserializer<'de>;

    fn into_deserializer(self) -> Self::Deserializer {
        ValueDeserializer(&self.0)
    }
}

#[repr(transparent)]
pub struct ValueDeserializer<'a>(&'a ObjectValue);

impl ValueDeserializer<'_> {
    fn as_u64(&self) -> SResult<u64, serde::de::value::Error> {
        match &self.0 {
            ObjectValue::Integer(i) => {
                if *i < 0 {
                    Err(serde::de::value::Error::invalid_value(
                        Unexpected::Signed(*i as i64),
                        &"a u32",
                    ))
                } else {
                    Ok(u64::from(i.unsigned_abs()))
                }
            }

            ObjectValue::Counter32(u)
            | ObjectValue::Unsigned32(u)
            | ObjectValue::TimeTicks(u) => Ok((*u).into()),

            ObjectValue::Counter64(u) => Ok(*u),

            _ => Err(serde::de::value::Error::invalid_value(
                Unexpected::Other("other SNMP type"),
                &"a u64",
            )),
        }
    }

    fn as_i64(&self) -> SResult<i64, serde::de::value::Error> {
        match &self.0 {
            ObjectValue::Integer(i) => Ok((*i).into()),

            ObjectValue::Counter32(u)
            | ObjectValue::Unsigned32(u)
            | ObjectValue::TimeTicks(u) => Ok((*u).into()),

            ObjectValue::Counter64(u) => {
                let v: i64 = (*u).try_into().map_err(|_| {
                    serde::de::value::Error::invalid_value(
                        Unexpected::Unsigned(*u),
                        &"an i64",
                    )
                })?;

                Ok(v)
            }

            _ => Err(serde::de::value::Error::invalid_value(
                Unexpected::Other("other SNMP type"),
                &"an i64",
            )),
        }
    }
}

impl<'de> Deserializer<'de> for ValueDeserializer<'de> {
    type Error = serde::de::value::Error;

    fn deserialize_any<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        match &self.0 {
            ObjectValue::Integer(_) => self.deserialize_i32(v),
            ObjectValue::String(_) => self.deserialize_str(v),
            ObjectValue::ObjectId(_) => self.deserialize_seq(v),
            ObjectValue::Counter32(_)
            | ObjectValue::Unsigned32(_)
            | ObjectValue::TimeTicks(_) => self.deserialize_u32(v),
            ObjectValue::Counter64(_) => self.deserialize_u64(v),
            ObjectValue::IpAddress(_) | ObjectValue::Opaque(_) => {
                self.deserialize_bytes(v)
            }
        }
    }

    fn deserialize_bool<V>(self, _v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no bool support"))
    }

    fn deserialize_i8<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        self.deserialize_i64(v)
    }

    fn deserialize_i16<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        self.deserialize_i64(v)
    }

    fn deserialize_i32<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        self.deserialize_i64(v)
    }

    fn deserialize_i64<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        v.visit_i64(self.as_i64()?)
    }

    fn deserialize_u8<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        self.deserialize_u64(v)
    }

    fn deserialize_u16<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        self.deserialize_u64(v)
    }

    fn deserialize_u32<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        self.deserialize_u64(v)
    }

    fn deserialize_u64<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        v.visit_u64(self.as_u64()?)
    }

    fn deserialize_f32<V>(self, _v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no f32 support"))
    }

    fn deserialize_f64<V>(self, _v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no f64 support"))
    }

    fn deserialize_char<V>(self, _v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no char support"))
    }

    fn deserialize_str<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        match &self.0 {
            ObjectValue::String(buf) => {
                v.visit_str(std::str::from_utf8(buf).map_err(|_| {
                    serde::de::value::Error::invalid_value(
                        Unexpected::Bytes(buf),
                        &"a valid UTF-8 string",
                    )
                })?)
            }
            _ => Err(serde::de::value::Error::invalid_value(
                Unexpected::Other("other SNMP value"),
                &"a valid UTF-8 string",
            )),
        }
    }

    fn deserialize_string<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        self.deserialize_str(v)
    }

    fn deserialize_bytes<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        match &self.0 {
            ObjectValue::String(buf) | ObjectValue::Opaque(buf) => {
                v.visit_bytes(buf)
            }
            _ => Err(serde::de::value::Error::invalid_value(
                Unexpected::Other("other SNMP value"),
                &"an opaque or a string",
            )),
        }
    }

    fn deserialize_byte_buf<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        self.deserialize_bytes(v)
    }

    fn deserialize_option<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        /*
         * An absent column never reaches us, so anything that is here is
         * present:
         */
        v.visit_some(self)
    }

    fn deserialize_unit<V>(self, _v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no unit support"))
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        _v: V,
    ) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no unit struct support"))
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        _v: V,
    ) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no newtype struct support"))
    }

    fn deserialize_seq<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        struct OidSeqAccess<'a> {
            oid: &'a [u32],
            pos: usize,
        }

        impl<'de, 'a> SeqAccess<'de> for OidSeqAccess<'a> {
            type Error = serde::de::value::Error;

            fn next_element_seed<T>(
                &mut self,
                seed: T,
            ) -> SResult<Option<T::Value>, Self::Error>
            where
                T: DeserializeSeed<'de>,
            {
                if self.pos >= self.oid.len() {
                    Ok(None)
                } else {
                    let v = self.oid[self.pos];
                    self.pos += 1;
                    let de = U32Deserializer::new(v);
                    seed.deserialize(de).map(Some)
                }
            }
        }

        match self.0 {
            ObjectValue::ObjectId(oid) => {
                v.visit_seq(OidSeqAccess { oid: oid.as_slice(), pos: 0 })
            }
            _ => Err(serde::de::value::Error::invalid_value(
                Unexpected::Other("other SNMP value"),
                &"an object ID",
            )),
        }
    }

    fn deserialize_tuple<V>(
        self,
        _len: usize,
        _v: V,
    ) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no tuple support"))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        _v: V,
    ) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no tuple struct support"))
    }

    fn deserialize_map<V>(self, _v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no map support"))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _v: V,
    ) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no struct support"))
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _v: V,
    ) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no enum support"))
    }

    fn deserialize_identifier<V>(self, _v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::value::Error::custom("no identifier support"))
    }

    fn deserialize_ignored_any<V>(self, v: V) -> SResult<V::Value, Self::Error>
    where
        V: serde::de::Visitor<'de>,
    {
        /*
         * Columns a record does not name may hold binary strings (e.g.,
         * ifPhysAddress) that would not survive deserialize_any().
         */
        v.visit_unit()
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            ObjectValue::Integer(i) => format_args!("{}", i).fmt(f),
            ObjectValue::String(vu) => {
                format_args!("{:?}", String::from_utf8_lossy(vu)).fmt(f)
            }
            ObjectValue::ObjectId(oid) => format_args!("<oid:{oid}>").fmt(f),
            ObjectValue::IpAddress(ip) => format_args!("{}", ip).fmt(f),
            ObjectValue::Counter32(u) => format_args!("{}", u).fmt(f),
            ObjectValue::Unsigned32(u) => format_args!("{}", u).fmt(f),
            ObjectValue::TimeTicks(u) => format_args!("{}", u).fmt(f),
            ObjectValue::Opaque(buf) => format_args!("{:?}", buf).fmt(f),
            ObjectValue::Counter64(u) => format_args!("{}", u).fmt(f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Oid;
    use serde::Deserialize;

    fn oid() -> Oid {
        Oid::from_arcs(&[1, 3, 6, 1, 2, 1, 10, 127, 1, 1, 1, 1, 6, 3]).unwrap()
    }

    #[test]
    fn tenths_divide_exactly() {
        assert_eq!(Tenths(350).to_f64(), 35.0);
        assert_eq!(Tenths(-3).to_f64(), -0.3);
        assert_eq!(Tenths(361).to_f64(), 36.1);
        assert_eq!(Tenths(-3).to_string(), "-0.3");
        assert_eq!(Tenths(405).to_string(), "40.5");
    }

    #[test]
    fn converters() {
        assert_eq!(
            convert::integer(&oid(), Value::integer(-42)).unwrap(),
            -42
        );
        assert_eq!(
            convert::counter(&oid(), Value::counter64(1 << 40)).unwrap(),
            1 << 40
        );
        assert_eq!(
            convert::unsigned(&oid(), Value::counter32(7)).unwrap(),
            7
        );
        assert_eq!(
            convert::string(&oid(), Value::string("Cable Modem")).unwrap(),
            "Cable Modem"
        );
        assert_eq!(
            convert::tenths(&oid(), Value::integer(-15)).unwrap(),
            Tenths(-15)
        );

        let e = convert::integer(&oid(), Value::string("nope")).unwrap_err();
        assert!(matches!(e, crate::Error::UnexpectedValue { .. }));
        assert!(convert::unsigned(&oid(), Value::integer(-1)).is_err());
        assert!(convert::string(&oid(), Value::integer(1)).is_err());
    }

    #[test]
    fn deserialise_optional_and_ignored() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Row {
            a: Option<i32>,
            b: Option<u64>,
            c: Option<String>,
        }

        let a = Value::integer(-5);
        let c = Value::string("x");
        let junk = Value::string([0xff, 0xfe, 0x00]);
        let map = vec![("a", &a), ("c", &c), ("junk", &junk)];

        let row = Row::deserialize(serde::de::value::MapDeserializer::<
            _,
            serde::de::value::Error,
        >::new(map.into_iter()))
        .unwrap();

        assert_eq!(row, Row { a: Some(-5), b: None, c: Some("x".into()) });
    }
}
