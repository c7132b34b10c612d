//! A recursive descent parser for type names.

use super::{DataType, EnumItem};
use crate::ColumnError;

/// The deepest nesting of parameterised types a type name may contain.
const MAX_NESTING_DEPTH: usize = 64;

/// Parses a complete type name, e.g. `Array(Nullable(FixedString(4)))`.
pub(super) fn parse_type(input: &str) -> Result<DataType, ColumnError> {
    let mut parser = TypeParser { input, pos: 0, depth: 0 };
    let data_type = parser.parse_type()?;
    parser.skip_whitespace();

    if parser.pos != input.len() {
        return Err(parser.error());
    }

    Ok(data_type)
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn error(&self) -> ColumnError {
        ColumnError::InvalidTypeName(self.input.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: u8) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), ColumnError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn ident(&mut self) -> Result<&'a str, ColumnError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }

        if start == self.pos {
            return Err(self.error());
        }
        Ok(&self.input[start..self.pos])
    }

    fn integer(&mut self) -> Result<i64, ColumnError> {
        self.skip_whitespace();
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }

        self.input[start..self.pos]
            .parse()
            .map_err(|_| self.error())
    }

    fn unsigned<T: TryFrom<i64>>(&mut self) -> Result<T, ColumnError> {
        let value = self.integer()?;
        T::try_from(value).map_err(|_| self.error())
    }

    fn quoted(&mut self) -> Result<String, ColumnError> {
        self.expect(b'\'')?;

        let mut value = Vec::new();
        loop {
            let c = self.peek().ok_or_else(|| self.error())?;
            self.pos += 1;
            match c {
                b'\'' => break,
                b'\\' => {
                    let escaped = self.peek().ok_or_else(|| self.error())?;
                    self.pos += 1;
                    value.push(escaped);
                },
                c => value.push(c),
            }
        }

        String::from_utf8(value).map_err(|_| self.error())
    }

    fn parse_nested(&mut self) -> Result<Box<DataType>, ColumnError> {
        self.expect(b'(')?;
        let inner = self.parse_type()?;
        self.expect(b')')?;
        Ok(Box::new(inner))
    }

    fn parse_enum_items(&mut self) -> Result<Vec<EnumItem>, ColumnError> {
        self.expect(b'(')?;
        let mut items = Vec::new();
        loop {
            let name = self.quoted()?;
            self.expect(b'=')?;
            let value = self.integer()?;
            let value = i16::try_from(value).map_err(|_| self.error())?;
            items.push(EnumItem { name, value });

            if !self.eat(b',') {
                break;
            }
        }
        self.expect(b')')?;
        Ok(items)
    }

    fn parse_decimal_scale(&mut self, precision: u8) -> Result<DataType, ColumnError> {
        self.expect(b'(')?;
        let scale = self.unsigned()?;
        self.expect(b')')?;
        DataType::decimal(precision, scale)
    }

    fn parse_type(&mut self) -> Result<DataType, ColumnError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error());
        }

        self.depth += 1;
        let data_type = self.parse_named_type();
        self.depth -= 1;
        data_type
    }

    fn parse_named_type(&mut self) -> Result<DataType, ColumnError> {
        let name = self.ident()?;

        let data_type = match name {
            "Int8" => DataType::Int8,
            "Int16" => DataType::Int16,
            "Int32" => DataType::Int32,
            "Int64" => DataType::Int64,
            "Int128" => DataType::Int128,
            "UInt8" => DataType::UInt8,
            "UInt16" => DataType::UInt16,
            "UInt32" => DataType::UInt32,
            "UInt64" => DataType::UInt64,
            "UInt128" => DataType::UInt128,
            "Float32" => DataType::Float32,
            "Float64" => DataType::Float64,
            "String" => DataType::String,
            "Date" => DataType::Date,
            "Date32" => DataType::Date32,
            "UUID" => DataType::Uuid,
            "IPv4" => DataType::IPv4,
            "IPv6" => DataType::IPv6,
            "FixedString" => {
                self.expect(b'(')?;
                let width: usize = self.unsigned()?;
                self.expect(b')')?;
                DataType::fixed_string(width).map_err(|_| self.error())?
            },
            "DateTime" => {
                let timezone = if self.eat(b'(') {
                    let tz = self.quoted()?;
                    self.expect(b')')?;
                    Some(tz)
                } else {
                    None
                };
                DataType::DateTime { timezone }
            },
            "DateTime64" => {
                self.expect(b'(')?;
                let precision = self.unsigned()?;
                let timezone = if self.eat(b',') {
                    Some(self.quoted()?)
                } else {
                    None
                };
                self.expect(b')')?;
                DataType::datetime64_with_timezone(precision, timezone)?
            },
            "Decimal" => {
                self.expect(b'(')?;
                let precision = self.unsigned()?;
                self.expect(b',')?;
                let scale = self.unsigned()?;
                self.expect(b')')?;
                DataType::decimal(precision, scale)?
            },
            "Decimal32" => self.parse_decimal_scale(9)?,
            "Decimal64" => self.parse_decimal_scale(18)?,
            "Decimal128" => self.parse_decimal_scale(38)?,
            "Enum8" => DataType::enum8(self.parse_enum_items()?)?,
            "Enum16" => DataType::enum16(self.parse_enum_items()?)?,
            "Nullable" => DataType::Nullable(self.parse_nested()?),
            "Array" => DataType::Array(self.parse_nested()?),
            "LowCardinality" => DataType::LowCardinality(self.parse_nested()?),
            "Tuple" => {
                self.expect(b'(')?;
                let mut items = vec![self.parse_type()?];
                while self.eat(b',') {
                    items.push(self.parse_type()?);
                }
                self.expect(b')')?;
                DataType::Tuple(items)
            },
            _ => return Err(self.error()),
        };

        Ok(data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("UInt32")]
    #[case("String")]
    #[case("FixedString(12)")]
    #[case("Date")]
    #[case("DateTime")]
    #[case("DateTime('Europe/Moscow')")]
    #[case("DateTime64(3)")]
    #[case("DateTime64(9, 'UTC')")]
    #[case("Decimal(10, 5)")]
    #[case("UUID")]
    #[case("IPv4")]
    #[case("IPv6")]
    #[case("Enum8('a' = 1, 'b' = 2)")]
    #[case("Enum16('minus' = -1000, 'plus' = 1000)")]
    #[case("Nullable(Int128)")]
    #[case("Array(Array(Nullable(String)))")]
    #[case("Tuple(UInt8, String, Array(Float64))")]
    #[case("LowCardinality(Nullable(FixedString(4)))")]
    fn test_parse_display_round_trip(#[case] name: &str) {
        let parsed: DataType = name.parse().expect("Type name should parse");
        assert_eq!(parsed.to_string(), name);
    }

    #[rstest::rstest]
    #[case("Decimal32(4)", DataType::Decimal { precision: 9, scale: 4 })]
    #[case("Decimal64(2)", DataType::Decimal { precision: 18, scale: 2 })]
    #[case("Decimal128(10)", DataType::Decimal { precision: 38, scale: 10 })]
    #[case("  Array( UInt8 ) ", DataType::array(DataType::UInt8))]
    #[case("Enum8('it\\'s' = 1)", DataType::Enum8(vec![EnumItem::new("it's", 1)]))]
    fn test_parse_aliases(#[case] name: &str, #[case] expected: DataType) {
        let parsed: DataType = name.parse().expect("Type name should parse");
        assert_eq!(parsed, expected);
    }

    #[rstest::rstest]
    #[case("")]
    #[case("UInt33")]
    #[case("Array(UInt8")]
    #[case("Array(UInt8))")]
    #[case("FixedString(0)")]
    #[case("FixedString(-1)")]
    #[case("DateTime64(12)")]
    #[case("Decimal(40, 2)")]
    #[case("Enum8('a' = 300)")]
    #[case("Enum8('a = 1)")]
    #[case("Tuple()")]
    fn test_parse_invalid(#[case] name: &str) {
        let result = name.parse::<DataType>();
        assert!(
            matches!(result, Err(ColumnError::InvalidTypeName(_))),
            "Expected parse failure for {name:?}, got: {result:?}"
        );
    }

    #[rstest::rstest]
    #[case(MAX_NESTING_DEPTH - 1, true)]
    #[case(MAX_NESTING_DEPTH, false)]
    #[case(200_000, false)]
    fn test_nesting_depth_limit(#[case] arrays: usize, #[case] valid: bool) {
        let name = format!("{}UInt8{}", "Array(".repeat(arrays), ")".repeat(arrays));
        let result = name.parse::<DataType>();
        assert_eq!(result.is_ok(), valid, "Unexpected result for {arrays} nested arrays");
        if !valid {
            assert!(matches!(result, Err(ColumnError::InvalidTypeName(_))));
        }
    }
}
