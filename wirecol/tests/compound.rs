mod common;

use bytes::Bytes;
use wirecol::*;

#[test]
fn test_uint32_save_load_scenario() {
    common::init_logging();

    let mut column = ColumnUInt32::new();
    for value in [1, 2, 3] {
        column.append(value);
    }

    let mut output = BufferOutput::new();
    column.save(&mut output).expect("Unbounded buffer should accept the column");
    assert_eq!(output.len(), 12);

    let mut loaded = ColumnUInt32::new();
    let mut input = BufferInput::new(output.freeze());
    assert!(loaded.load(&mut input, 3));
    assert_eq!(loaded.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(input.remaining(), 0);
}

#[test]
fn test_fixed_string_padding_scenario() {
    let mut column = ColumnFixedString::new(12).expect("Width should be valid");
    column.append("foobar").expect("Short value should be padded");

    let padded = b"foobar\0\0\0\0\0\0";
    assert_eq!(column.at(0).unwrap(), padded);
    assert_eq!(
        column.value_at(0).unwrap(),
        Value::FixedString(Bytes::from_static(padded))
    );

    let mut buffer = [0u8; 12];
    let mut output = ArrayOutput::new(&mut buffer);
    column.save(&mut output).expect("Buffer should fit exactly one value");
    assert_eq!(output.remaining(), 0);
    assert_eq!(&buffer, padded);
}

#[test]
fn test_sink_exhaustion_is_surfaced() {
    let column: ColumnUInt64 = [1, 2].into_iter().collect();
    let mut buffer = [0u8; 12];
    let mut output = ArrayOutput::new(&mut buffer);

    let err = column.save(&mut output).expect_err("Buffer should be too small");
    assert!(matches!(
        err,
        SinkError::CapacityExhausted {
            requested: 16,
            remaining: 12
        }
    ));
}

#[test]
fn test_array_offset_invariant() {
    let mut column = ColumnArray::new(Box::new(ColumnString::new()));
    let rows = [vec!["a", "b"], vec![], vec!["c"]];

    for row in rows {
        let items = row.into_iter().map(Value::from).collect();
        column.append_value(Value::Array(items)).unwrap();
        assert_eq!(
            column.offsets().last().copied(),
            Some(column.nested().size() as u64)
        );
    }
}

#[test]
fn test_array_of_nullable_round_trip() {
    let data_type = DataType::array(DataType::nullable(DataType::UInt8));
    let mut column = create_column(&data_type, &LoadLimits::default()).unwrap();
    column
        .append_value(Value::Array(vec![Value::UInt8(1), Value::Null]))
        .unwrap();
    column.append_default();

    let mut output = BufferOutput::new();
    column.save(&mut output).unwrap();
    let mut loaded = column.clone_empty();
    assert!(loaded.load(&mut ArrayInput::new(output.as_slice()), 2));
    assert_eq!(
        loaded.value_at(0).unwrap(),
        Value::Array(vec![Value::UInt8(1), Value::Null])
    );
    assert_eq!(loaded.value_at(1).unwrap(), Value::Array(Vec::new()));
}

#[test]
fn test_array_of_low_cardinality_forwards_prefix() {
    let mut column = create_column_by_name("Array(LowCardinality(String))").unwrap();
    column
        .append_value(Value::Array(vec![Value::from("a"), Value::from("a")]))
        .unwrap();

    let mut output = BufferOutput::new();
    column.save(&mut output).unwrap();
    assert_eq!(&output.as_slice()[..8], &1u64.to_le_bytes(), "Version prefix should come first");

    let mut loaded = column.clone_empty();
    assert!(loaded.load(&mut ArrayInput::new(output.as_slice()), 1));
    assert_eq!(loaded.value_at(0).unwrap(), column.value_at(0).unwrap());
}

#[test]
fn test_tuple_sizes_stay_equal() {
    let mut column = create_column_by_name("Tuple(UInt8, String, Nullable(Int32))").unwrap();
    column
        .append_value(Value::Tuple(vec![Value::UInt8(1), Value::from("x"), Value::Null]))
        .unwrap();
    let result = column.append_value(Value::Tuple(vec![
        Value::UInt8(2),
        Value::from("y"),
        Value::from("not an int"),
    ]));
    assert!(matches!(result, Err(ColumnError::TypeMismatch { .. })));

    let tuple = column.as_strict::<ColumnTuple>().unwrap();
    for i in 0..tuple.arity() {
        assert_eq!(tuple.column(i).unwrap().size(), 1);
    }
}

#[test]
fn test_enum_by_name_through_factory() {
    let mut column = create_column_by_name("Enum8('on' = 1, 'off' = 0)").unwrap();
    column.append_value(Value::from("off")).unwrap();
    column.append_value(Value::Enum8(1)).unwrap();
    assert!(matches!(
        column.append_value(Value::from("maybe")),
        Err(ColumnError::UnknownEnumValue(_))
    ));

    let column = column.as_strict::<ColumnEnum8>().unwrap();
    assert_eq!(column.name_at(0).unwrap(), "off");
    assert_eq!(column.name_at(1).unwrap(), "on");
}

#[test]
fn test_narrowing_mutably() {
    let mut column = create_column_by_name("Date").unwrap();
    column
        .as_strict_mut::<ColumnDate>()
        .expect("Column should be a date column")
        .append(1);
    assert!(column.as_strict_mut::<ColumnDate32>().is_err());
    assert_eq!(column.value_at(0).unwrap(), Value::Date(1));
}
