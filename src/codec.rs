//! Value codec: conversion between typed values and their SCPI wire form.
//!
//! Everything in this module is pure and stateless. A device declares a
//! [`ValueType`]; [`to_wire`] and [`from_wire`] convert a [`Value`] to and
//! from the string the instrument exchanges:
//!
//! - booleans are `"0"` / `"1"`,
//! - numerics use the shortest round-trip-exact decimal form (never a lossy
//!   fixed-precision one),
//! - enumerated choices use SCPI mnemonic abbreviation rules (see
//!   [`ChoiceSet`]),
//! - binary blocks use the SCPI length-prefixed `#` header, with a
//!   comma-separated ASCII fallback.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{InstrError, Result};

// =============================================================================
// Value
// =============================================================================

/// A typed value held in a device cache or exchanged with an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean, `"0"`/`"1"` on the wire.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Plain or enumerated string.
    Str(String),
    /// Raw binary block payload (native little-endian element bytes).
    Block(Bytes),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Block(_) => "block",
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// String view of the value, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view of the value, if it is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Block payload view of the value, if it is a block.
    pub fn as_block(&self) -> Option<&[u8]> {
        match self {
            Value::Block(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Block(b) => write!(f, "<block of {} bytes>", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

// =============================================================================
// ChoiceSet - SCPI mnemonic matching
// =============================================================================

/// An enumerated choice set following SCPI mnemonic abbreviation rules.
///
/// Each value is spelled like `INTernal`: the leading capitals form the
/// short name, the whole word lower-cased forms the long name. Matching is
/// case-insensitive and accepts either spelling, short form tried first.
/// A value with no capitals has its long name as short name too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSet {
    values: Vec<String>,
}

impl ChoiceSet {
    /// Build a choice set from canonical spellings.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChoiceSet {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    fn short_form(value: &str) -> String {
        let short: String = value
            .chars()
            .filter(|c| !c.is_ascii_lowercase())
            .collect::<String>()
            .to_ascii_lowercase();
        if short.is_empty() {
            value.to_ascii_lowercase()
        } else {
            short
        }
    }

    /// Index of a value matched case-insensitively, short form first.
    pub fn index_of(&self, input: &str) -> Option<usize> {
        let lowered = input.to_ascii_lowercase();
        self.values
            .iter()
            .position(|v| Self::short_form(v) == lowered)
            .or_else(|| {
                self.values
                    .iter()
                    .position(|v| v.to_ascii_lowercase() == lowered)
            })
    }

    /// Whether the input matches any member, in either spelling.
    pub fn contains(&self, input: &str) -> bool {
        self.index_of(input).is_some()
    }

    /// The canonical spelling for a matched input.
    pub fn canonical(&self, input: &str) -> Option<&str> {
        self.index_of(input).map(|i| self.values[i].as_str())
    }

    /// The wire token for a matched input: the canonical short form,
    /// upper-cased (e.g. `INTernal` -> `INT`).
    pub fn wire_token(&self, input: &str) -> Option<String> {
        self.index_of(input)
            .map(|i| Self::short_form(&self.values[i]).to_ascii_uppercase())
    }

    /// Canonical spellings, in declaration order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl fmt::Display for ChoiceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.values.join(", "))
    }
}

// =============================================================================
// Binary blocks
// =============================================================================

/// Element kind of a binary block, for the ASCII fallback and typed views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElemKind {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit little-endian.
    U16,
    /// Unsigned 32-bit little-endian.
    U32,
    /// IEEE-754 single precision little-endian.
    F32,
    /// IEEE-754 double precision little-endian.
    F64,
}

impl ElemKind {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ElemKind::U8 => 1,
            ElemKind::U16 => 2,
            ElemKind::U32 => 4,
            ElemKind::F32 => 4,
            ElemKind::F64 => 8,
        }
    }
}

/// Wire format of a binary block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFormat {
    /// Element type of the payload.
    pub elem: ElemKind,
    /// Separator accepted for the ASCII fallback form. `None` means the
    /// device only ever produces length-prefixed binary.
    pub ascii_sep: Option<char>,
}

impl BlockFormat {
    /// Binary-or-ASCII block of the given element kind, `,`-separated.
    pub fn auto(elem: ElemKind) -> Self {
        BlockFormat {
            elem,
            ascii_sep: Some(','),
        }
    }

    /// Strictly binary block of the given element kind.
    pub fn binary(elem: ElemKind) -> Self {
        BlockFormat {
            elem,
            ascii_sep: None,
        }
    }
}

impl Default for BlockFormat {
    fn default() -> Self {
        BlockFormat::auto(ElemKind::F64)
    }
}

/// Prefix a payload with the SCPI block header `#` + digit-count + byte-count.
pub fn encode_block(payload: &[u8]) -> Vec<u8> {
    let count = payload.len().to_string();
    let mut out = Vec::with_capacity(2 + count.len() + payload.len());
    out.push(b'#');
    out.extend_from_slice(count.len().to_string().as_bytes());
    out.extend_from_slice(count.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// Decode a length-prefixed SCPI block, validating the declared byte count.
///
/// A trailing line ending of one byte (`\r` or `\n`) or two bytes (`\r\n`)
/// beyond the declared count is tolerated; anything else is extra data.
pub fn decode_block(raw: &[u8]) -> Result<Bytes> {
    if raw.first() != Some(&b'#') {
        return Err(InstrError::Decode(
            "block does not start with '#'".to_string(),
        ));
    }
    let ndigits = match raw.get(1) {
        Some(d @ b'1'..=b'9') => (d - b'0') as usize,
        _ => {
            return Err(InstrError::Decode(
                "block header has no digit count".to_string(),
            ))
        }
    };
    let header_len = 2 + ndigits;
    if raw.len() < header_len {
        return Err(InstrError::Decode("block header truncated".to_string()));
    }
    let count_str = std::str::from_utf8(&raw[2..header_len])
        .map_err(|_| InstrError::Decode("block header is not ASCII".to_string()))?;
    let nbytes: usize = count_str
        .parse()
        .map_err(|_| InstrError::Decode(format!("bad block byte count '{count_str}'")))?;

    let payload = &raw[header_len..];
    if payload.len() < nbytes {
        return Err(InstrError::Decode(format!(
            "missing data: got {}, expected {}",
            payload.len(),
            nbytes
        )));
    }
    let extra = payload.len() - nbytes;
    let trimmed = match extra {
        0 => payload,
        1 if matches!(payload[nbytes], b'\r' | b'\n') => &payload[..nbytes],
        2 if &payload[nbytes..] == b"\r\n" => &payload[..nbytes],
        _ => {
            return Err(InstrError::Decode(format!(
                "extra data: got {}, expected {}",
                payload.len(),
                nbytes
            )))
        }
    };
    Ok(Bytes::copy_from_slice(trimmed))
}

/// Decode a block in either wire form.
///
/// A `#`-prefixed input is decoded as a length-prefixed binary block. Anything
/// else is treated as the separator ASCII fallback and re-encoded to native
/// little-endian element bytes, so both forms yield the same payload.
pub fn decode_block_auto(raw: &[u8], format: &BlockFormat) -> Result<Bytes> {
    if raw.first() == Some(&b'#') {
        return decode_block(raw);
    }
    let sep = format.ascii_sep.ok_or_else(|| {
        InstrError::Decode("expected a length-prefixed binary block".to_string())
    })?;
    let text = std::str::from_utf8(raw)
        .map_err(|_| InstrError::Decode("ASCII block is not valid UTF-8".to_string()))?;
    let text = text.trim();
    let mut payload = Vec::new();
    if text.is_empty() {
        return Ok(Bytes::new());
    }
    for field in text.split(sep) {
        let field = field.trim();
        match format.elem {
            ElemKind::U8 => {
                let v: u8 = field
                    .parse()
                    .map_err(|_| InstrError::Decode(format!("bad u8 element '{field}'")))?;
                payload.push(v);
            }
            ElemKind::U16 => {
                let v: u16 = field
                    .parse()
                    .map_err(|_| InstrError::Decode(format!("bad u16 element '{field}'")))?;
                payload.extend_from_slice(&v.to_le_bytes());
            }
            ElemKind::U32 => {
                let v: u32 = field
                    .parse()
                    .map_err(|_| InstrError::Decode(format!("bad u32 element '{field}'")))?;
                payload.extend_from_slice(&v.to_le_bytes());
            }
            ElemKind::F32 => {
                let v: f32 = field
                    .parse()
                    .map_err(|_| InstrError::Decode(format!("bad f32 element '{field}'")))?;
                payload.extend_from_slice(&v.to_le_bytes());
            }
            ElemKind::F64 => {
                let v: f64 = field
                    .parse()
                    .map_err(|_| InstrError::Decode(format!("bad f64 element '{field}'")))?;
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    Ok(Bytes::from(payload))
}

fn check_chunks(payload: &[u8], size: usize, kind: &str) -> Result<()> {
    if payload.len() % size != 0 {
        return Err(InstrError::Decode(format!(
            "payload of {} bytes is not a whole number of {kind} elements",
            payload.len()
        )));
    }
    Ok(())
}

/// View a block payload as little-endian `f32` elements.
pub fn block_to_f32(payload: &[u8]) -> Result<Vec<f32>> {
    check_chunks(payload, 4, "f32")?;
    Ok(payload
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// View a block payload as little-endian `f64` elements.
pub fn block_to_f64(payload: &[u8]) -> Result<Vec<f64>> {
    check_chunks(payload, 8, "f64")?;
    Ok(payload
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

/// View a block payload as little-endian `u16` elements.
pub fn block_to_u16(payload: &[u8]) -> Result<Vec<u16>> {
    check_chunks(payload, 2, "u16")?;
    Ok(payload
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect())
}

/// View a block payload as little-endian `u32` elements.
pub fn block_to_u32(payload: &[u8]) -> Result<Vec<u32>> {
    check_chunks(payload, 4, "u32")?;
    Ok(payload
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Render f64 values in the separator ASCII form (round-trip exact).
pub fn encode_block_ascii(values: &[f64], sep: char) -> String {
    values
        .iter()
        .map(|v| format!("{v}"))
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}

// =============================================================================
// ValueType and the to_wire / from_wire entry points
// =============================================================================

/// Declared wire type of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueType {
    /// `"0"` / `"1"` on the wire.
    Bool,
    /// Decimal integer.
    Int,
    /// Round-trip-exact decimal float.
    Float,
    /// Plain string, passed through unchanged.
    Str,
    /// Enumerated choice with SCPI mnemonic matching.
    Choice(ChoiceSet),
    /// Binary block.
    Block(BlockFormat),
}

impl ValueType {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::Choice(_) => "choice",
            ValueType::Block(_) => "block",
        }
    }

    /// Infer the wire type of an initial value (used by memory devices).
    pub fn of(value: &Value) -> ValueType {
        match value {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::Block(_) => ValueType::Block(BlockFormat::default()),
        }
    }
}

/// Convert a typed value to its wire string.
///
/// For binary blocks only the ASCII fallback form can be rendered as a
/// string; use [`to_wire_bytes`] for the length-prefixed binary form.
pub fn to_wire(value: &Value, vtype: &ValueType) -> Result<String> {
    match (vtype, value) {
        (ValueType::Bool, Value::Bool(b)) => Ok(if *b { "1" } else { "0" }.to_string()),
        (ValueType::Int, Value::Int(v)) => Ok(v.to_string()),
        // repr-style shortest form: round-trips exactly, unlike a fixed
        // precision format.
        (ValueType::Float, Value::Float(v)) => Ok(format!("{v}")),
        (ValueType::Float, Value::Int(v)) => Ok(format!("{}", *v as f64)),
        (ValueType::Str, Value::Str(s)) => Ok(s.clone()),
        (ValueType::Choice(set), Value::Str(s)) => set.wire_token(s).ok_or_else(|| {
            InstrError::Decode(format!("'{s}' is not one of {set}"))
        }),
        (ValueType::Block(fmt), Value::Block(payload)) => {
            let sep = fmt.ascii_sep.ok_or_else(|| {
                InstrError::Decode(
                    "binary-only block cannot be rendered as text; use to_wire_bytes".to_string(),
                )
            })?;
            let rendered = match fmt.elem {
                ElemKind::U8 => payload
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(&sep.to_string()),
                ElemKind::U16 => block_to_u16(payload)?
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(&sep.to_string()),
                ElemKind::U32 => block_to_u32(payload)?
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(&sep.to_string()),
                ElemKind::F32 => block_to_f32(payload)?
                    .iter()
                    .map(|v| format!("{v}"))
                    .collect::<Vec<_>>()
                    .join(&sep.to_string()),
                ElemKind::F64 => encode_block_ascii(&block_to_f64(payload)?, sep),
            };
            Ok(rendered)
        }
        (vt, v) => Err(InstrError::Decode(format!(
            "cannot encode {} value as {}",
            v.type_name(),
            vt.type_name()
        ))),
    }
}

/// Convert a typed value to wire bytes, using the length-prefixed binary
/// form for blocks and the plain string form for everything else.
pub fn to_wire_bytes(value: &Value, vtype: &ValueType) -> Result<Vec<u8>> {
    match (vtype, value) {
        (ValueType::Block(_), Value::Block(payload)) => Ok(encode_block(payload)),
        _ => Ok(to_wire(value, vtype)?.into_bytes()),
    }
}

/// Parse a wire string back into a typed value. Inverse of [`to_wire`].
pub fn from_wire(wire: &str, vtype: &ValueType) -> Result<Value> {
    match vtype {
        ValueType::Block(_) => from_wire_bytes(wire.as_bytes(), vtype),
        _ => {
            let trimmed = wire.trim();
            match vtype {
                ValueType::Bool => {
                    let n: i64 = trimmed.parse().map_err(|_| {
                        InstrError::Decode(format!("'{trimmed}' is not a boolean 0/1"))
                    })?;
                    Ok(Value::Bool(n != 0))
                }
                ValueType::Int => {
                    let n: i64 = trimmed
                        .parse()
                        .map_err(|_| InstrError::Decode(format!("'{trimmed}' is not an integer")))?;
                    Ok(Value::Int(n))
                }
                ValueType::Float => {
                    let v: f64 = trimmed
                        .parse()
                        .map_err(|_| InstrError::Decode(format!("'{trimmed}' is not a float")))?;
                    Ok(Value::Float(v))
                }
                ValueType::Str => Ok(Value::Str(wire.to_string())),
                ValueType::Choice(set) => set
                    .canonical(trimmed)
                    .map(|c| Value::Str(c.to_string()))
                    .ok_or_else(|| {
                        InstrError::Decode(format!("'{trimmed}' is not one of {set}"))
                    }),
                ValueType::Block(_) => unreachable!("handled above"),
            }
        }
    }
}

/// Parse wire bytes back into a typed value; required for binary blocks,
/// which are generally not valid UTF-8.
pub fn from_wire_bytes(raw: &[u8], vtype: &ValueType) -> Result<Value> {
    match vtype {
        ValueType::Block(fmt) => Ok(Value::Block(decode_block_auto(raw, fmt)?)),
        _ => {
            let text = std::str::from_utf8(raw)
                .map_err(|_| InstrError::Decode("reply is not valid UTF-8".to_string()))?;
            from_wire(text, vtype)
        }
    }
}

// =============================================================================
// Quoted strings
// =============================================================================

/// Codec for instruments that quote string replies (`"label"`).
#[derive(Debug, Clone, Copy)]
pub struct QuotedString {
    quote: char,
}

impl QuotedString {
    /// Double-quote codec.
    pub fn new() -> Self {
        QuotedString { quote: '"' }
    }

    /// Use a different quote character.
    pub fn with_quote(quote: char) -> Self {
        QuotedString { quote }
    }

    /// Strip the surrounding quotes from a reply.
    pub fn decode(&self, quoted: &str) -> Result<String> {
        let mut chars = quoted.chars();
        if chars.next() == Some(self.quote) && quoted.len() >= 2 && quoted.ends_with(self.quote) {
            Ok(quoted[1..quoted.len() - 1].to_string())
        } else {
            Err(InstrError::Decode(format!(
                "string <{quoted}> does not start and end with <{}>",
                self.quote
            )))
        }
    }

    /// Wrap a value in quotes for the wire.
    pub fn encode(&self, unquoted: &str) -> Result<String> {
        if unquoted.contains(self.quote) {
            return Err(InstrError::Decode(format!(
                "the given string already contains a quote: {}",
                self.quote
            )));
        }
        Ok(format!("{q}{unquoted}{q}", q = self.quote))
    }
}

impl Default for QuotedString {
    fn default() -> Self {
        QuotedString::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_round_trip() {
        for (v, wire) in [(true, "1"), (false, "0")] {
            assert_eq!(to_wire(&Value::Bool(v), &ValueType::Bool).unwrap(), wire);
            assert_eq!(from_wire(wire, &ValueType::Bool).unwrap(), Value::Bool(v));
        }
    }

    #[test]
    fn float_round_trip_full_precision() {
        for v in [0.0, 1e6, 8.1e9, 1e-6, 0.1 + 0.2, std::f64::consts::PI, -2.5e-300] {
            let wire = to_wire(&Value::Float(v), &ValueType::Float).unwrap();
            assert_eq!(from_wire(&wire, &ValueType::Float).unwrap(), Value::Float(v));
        }
    }

    #[test]
    fn choice_short_and_long_spellings() {
        let set = ChoiceSet::new(["INTernal", "EXTernal", "USB"]);
        let vt = ValueType::Choice(set.clone());
        assert_eq!(set.canonical("int"), Some("INTernal"));
        assert_eq!(set.canonical("external"), Some("EXTernal"));
        assert_eq!(set.canonical("usb"), Some("USB"));
        assert_eq!(set.wire_token("internal"), Some("INT".to_string()));
        // round trip: canonical -> wire token -> canonical
        let wire = to_wire(&Value::Str("EXTernal".into()), &vt).unwrap();
        assert_eq!(wire, "EXT");
        assert_eq!(from_wire(&wire, &vt).unwrap(), Value::Str("EXTernal".into()));
    }

    #[test]
    fn choice_without_capitals_uses_long_name() {
        let set = ChoiceSet::new(["Internal", "External", "USB"]);
        assert_eq!(set.canonical("usb"), Some("USB"));
        assert_eq!(set.canonical("InTeRnAl"), Some("Internal"));
        assert!(!set.contains("ethernet"));
    }

    #[test]
    fn block_encode_header() {
        assert_eq!(encode_block(b""), b"#10".to_vec());
        assert_eq!(encode_block(b"x"), b"#11x".to_vec());
        let enc = encode_block(&[0u8; 12]);
        assert_eq!(&enc[..4], b"#212");
    }

    #[test]
    fn block_round_trip() {
        for payload in [&b""[..], &b"a"[..], &[1u8, 2, 3, 4, 5][..]] {
            let enc = encode_block(payload);
            assert_eq!(decode_block(&enc).unwrap().as_ref(), payload);
        }
    }

    #[test]
    fn block_decode_boundaries() {
        // exactly N bytes: ok
        assert!(decode_block(b"#15hello").is_ok());
        // N-1 bytes: missing data
        match decode_block(b"#15hell") {
            Err(InstrError::Decode(msg)) => assert!(msg.contains("missing data")),
            other => panic!("unexpected: {other:?}"),
        }
        // line-ending slack of 1 or 2 bytes is tolerated
        assert_eq!(decode_block(b"#15hello\n").unwrap().as_ref(), b"hello");
        assert_eq!(decode_block(b"#15hello\r\n").unwrap().as_ref(), b"hello");
        // N+3 bytes: extra data
        match decode_block(b"#15helloabc") {
            Err(InstrError::Decode(msg)) => assert!(msg.contains("extra data")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn block_ascii_fallback_matches_binary() {
        let fmt = BlockFormat::auto(ElemKind::F32);
        let binary = decode_block_auto(b"#18\x00\x00\x80\x3f\x00\x00\x00\x40", &fmt).unwrap();
        let ascii = decode_block_auto(b"1,2", &fmt).unwrap();
        assert_eq!(binary, ascii);
        assert_eq!(block_to_f32(&binary).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn block_two_f32_little_endian() {
        // "#1" + "8" declared bytes, two 32-bit LE floats
        let v = from_wire_bytes(
            b"#18\x00\x00\x80\x3f\x00\x00\x00\x40",
            &ValueType::Block(BlockFormat::auto(ElemKind::F32)),
        )
        .unwrap();
        let payload = v.as_block().unwrap().to_vec();
        assert_eq!(block_to_f32(&payload).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn quoted_string_codec() {
        let q = QuotedString::new();
        assert_eq!(q.decode("\"hello\"").unwrap(), "hello");
        assert_eq!(q.encode("hello").unwrap(), "\"hello\"");
        assert!(q.decode("hello").is_err());
        assert!(q.encode("he\"llo").is_err());
    }
}
