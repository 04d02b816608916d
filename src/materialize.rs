//! Generic result materialization.
//!
//! serde is the reflection substrate here: the caller's destination is
//! serialized to a JSON snapshot, shape-checked against the declared
//! [`ResultType`], reduced row by row, and deserialized back in place. The
//! write-back only happens after every check and every row has been
//! absorbed, so a returned error never leaves a partially populated
//! destination.
//!
//! Struct destinations derive `Serialize`/`Deserialize`; a
//! `#[serde(rename = "col")]` attribute plays the role of an explicit
//! column tag, the field's own name matches otherwise, and columns with no
//! matching field are ignored. Null cells are skipped so the field keeps
//! its current (zero) value; for the plural shape each fresh element is
//! seeded from the element type's zero value, so null and uncovered
//! columns land as zero values there too. One documented tightening over
//! the permissive reference behavior: a non-null cell whose type cannot
//! convert to the field's declared type fails with a shape mismatch
//! instead of being silently skipped.

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::ast::ResultType;
use crate::error::{MapperError, MapperResult};
use crate::row::DecodedRow;

/// Populate `dest` from decoded rows according to the declared result type.
///
/// The destination's shape is validated before any row is read; singular
/// shapes additionally enforce at most one row, and `Value` exactly one
/// column. Zero rows for a singular shape leave the destination untouched.
pub fn materialize<T>(rows: &[DecodedRow], result_type: ResultType, dest: &mut T) -> MapperResult<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut snapshot =
        serde_json::to_value(&*dest).map_err(|e| MapperError::Decode(e.to_string()))?;

    match result_type {
        ResultType::Value => reduce_value(&mut snapshot, rows)?,
        ResultType::Slice => reduce_slice(&mut snapshot, rows)?,
        ResultType::Slices => reduce_slices(&mut snapshot, rows)?,
        ResultType::Map => reduce_map(&mut snapshot, rows)?,
        ResultType::Maps => reduce_maps(&mut snapshot, rows)?,
        ResultType::Struct => reduce_struct(&mut snapshot, rows)?,
        ResultType::Structs => reduce_structs(&mut snapshot, rows, zero_element_template::<T>())?,
    }

    *dest = serde_json::from_value(snapshot).map_err(|e| MapperError::ShapeMismatch {
        expected: required_shape(result_type),
        actual: format!("destination rejected materialized value: {e}"),
    })?;

    Ok(())
}

fn required_shape(result_type: ResultType) -> &'static str {
    match result_type {
        ResultType::Value => "a scalar destination",
        ResultType::Slice | ResultType::Slices | ResultType::Maps | ResultType::Structs => {
            "a sequence destination"
        }
        ResultType::Map | ResultType::Struct => "a mapping destination",
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn shape_error(result_type: ResultType, found: &Value) -> MapperError {
    MapperError::ShapeMismatch {
        expected: required_shape(result_type),
        actual: format!("destination serialized as {}", value_kind(found)),
    }
}

fn expect_array(
    snapshot: &mut Value,
    result_type: ResultType,
) -> MapperResult<&mut Vec<Value>> {
    match snapshot {
        Value::Array(seq) => Ok(seq),
        other => Err(shape_error(result_type, other)),
    }
}

fn expect_object(
    snapshot: &mut Value,
    result_type: ResultType,
) -> MapperResult<&mut Map<String, Value>> {
    match snapshot {
        Value::Object(map) => Ok(map),
        other => Err(shape_error(result_type, other)),
    }
}

fn at_most_one_row(rows: &[DecodedRow]) -> MapperResult<Option<&DecodedRow>> {
    if rows.len() > 1 {
        return Err(MapperError::TooManyRows(rows.len()));
    }
    Ok(rows.first())
}

/// Value: assign the single non-null cell of a one-column row.
fn reduce_value(snapshot: &mut Value, rows: &[DecodedRow]) -> MapperResult<()> {
    if snapshot.is_array() || snapshot.is_object() {
        return Err(shape_error(ResultType::Value, snapshot));
    }

    let Some(row) = at_most_one_row(rows)? else {
        return Ok(());
    };
    if row.len() > 1 {
        return Err(MapperError::TooManyColumns(row.len()));
    }

    if let Some((_, cell)) = row.cells().first() {
        if !cell.is_null() {
            *snapshot = cell.clone();
        }
    }

    Ok(())
}

/// Slice: append the single row's ordered cell values.
fn reduce_slice(snapshot: &mut Value, rows: &[DecodedRow]) -> MapperResult<()> {
    let seq = expect_array(snapshot, ResultType::Slice)?;

    if let Some(row) = at_most_one_row(rows)? {
        seq.extend(row.cells().iter().map(|(_, cell)| cell.clone()));
    }

    Ok(())
}

/// Slices: append one cell-value sequence per row.
fn reduce_slices(snapshot: &mut Value, rows: &[DecodedRow]) -> MapperResult<()> {
    let seq = expect_array(snapshot, ResultType::Slices)?;

    for row in rows {
        let cells: Vec<Value> = row.cells().iter().map(|(_, cell)| cell.clone()).collect();
        seq.push(Value::Array(cells));
    }

    Ok(())
}

/// Map: merge the single row's column-to-value pairs into the destination.
fn reduce_map(snapshot: &mut Value, rows: &[DecodedRow]) -> MapperResult<()> {
    let map = expect_object(snapshot, ResultType::Map)?;

    if let Some(row) = at_most_one_row(rows)? {
        for (column, cell) in row.cells() {
            map.insert(column.clone(), cell.clone());
        }
    }

    Ok(())
}

/// Maps: append one column-to-value mapping per row.
fn reduce_maps(snapshot: &mut Value, rows: &[DecodedRow]) -> MapperResult<()> {
    let seq = expect_array(snapshot, ResultType::Maps)?;

    for row in rows {
        let map: Map<String, Value> = row
            .cells()
            .iter()
            .map(|(column, cell)| (column.clone(), cell.clone()))
            .collect();
        seq.push(Value::Object(map));
    }

    Ok(())
}

/// Struct: overwrite matched fields from the single row's non-null cells.
fn reduce_struct(snapshot: &mut Value, rows: &[DecodedRow]) -> MapperResult<()> {
    let fields = expect_object(snapshot, ResultType::Struct)?;

    if let Some(row) = at_most_one_row(rows)? {
        merge_struct_fields(fields, row);
    }

    Ok(())
}

/// Structs: append one populated field mapping per row, each seeded from
/// the element type's zero value so null and uncovered columns land as
/// zero values.
fn reduce_structs(
    snapshot: &mut Value,
    rows: &[DecodedRow],
    template: Option<Value>,
) -> MapperResult<()> {
    let seq = expect_array(snapshot, ResultType::Structs)?;
    let template = match template {
        Some(Value::Object(fields)) => fields,
        _ => Map::new(),
    };

    for row in rows {
        let mut fields = template.clone();
        merge_struct_fields(&mut fields, row);
        seq.push(Value::Object(fields));
    }

    Ok(())
}

fn merge_struct_fields(fields: &mut Map<String, Value>, row: &DecodedRow) {
    for (column, cell) in row.cells() {
        // Null cells are skipped so the field keeps its zero value; columns
        // with no matching field are dropped by serde at write-back.
        if !cell.is_null() {
            fields.insert(column.clone(), cell.clone());
        }
    }
}

/// Derive the zero-value JSON template for the elements of a sequence
/// destination.
///
/// A one-element probe of `T` is deserialized with every field reading as
/// its zero value, then serialized back; the single element is the
/// template, already keyed by the element type's column names. Returns
/// `None` when the destination is not a sequence of zeroable mappings
/// (an element with an enum field, say); such rows fall back to an empty
/// template, where nullable columns need `Option` or a serde default.
fn zero_element_template<T>() -> Option<Value>
where
    T: Serialize + DeserializeOwned,
{
    let probe = T::deserialize(OneZeroSeq).ok()?;
    let Value::Array(mut items) = serde_json::to_value(&probe).ok()? else {
        return None;
    };

    let element = items.pop()?;
    if !items.is_empty() || !element.is_object() {
        return None;
    }
    Some(element)
}

/// Deserializer presenting a sequence of exactly one zero-valued element.
struct OneZeroSeq;

impl<'de> de::Deserializer<'de> for OneZeroSeq {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(ZeroSeq { remaining: 1 })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string bytes
        byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

/// Deserializer answering every request with that type's zero value.
struct ZeroValue;

impl<'de> de::Deserializer<'de> for ZeroValue {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bool(false)
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(0)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(0)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(0)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_i64(0)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_u64(0)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_u64(0)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_u64(0)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_u64(0)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_f64(0.0)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_f64(0.0)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_char('\0')
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_str("")
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_str("")
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bytes(&[])
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bytes(&[])
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_none()
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(ZeroValue)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(ZeroSeq { remaining: 0 })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(ZeroSeq { remaining: len })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(ZeroSeq { remaining: len })
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_map(ZeroFields { fields: &[], index: 0 })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_map(ZeroFields { fields, index: 0 })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("enum fields have no zero value"))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_str("")
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

struct ZeroSeq {
    remaining: usize,
}

impl<'de> SeqAccess<'de> for ZeroSeq {
    type Error = serde_json::Error;

    fn next_element_seed<S: DeserializeSeed<'de>>(
        &mut self,
        seed: S,
    ) -> Result<Option<S::Value>, Self::Error> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(ZeroValue).map(Some)
    }
}

struct ZeroFields {
    fields: &'static [&'static str],
    index: usize,
}

impl<'de> MapAccess<'de> for ZeroFields {
    type Error = serde_json::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        let Some(field) = self.fields.get(self.index) else {
            return Ok(None);
        };
        self.index += 1;
        seed.deserialize(BorrowedStrDeserializer::new(field)).map(Some)
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value, Self::Error> {
        seed.deserialize(ZeroValue)
    }
}
