use anyhow::Result;
use std::fs;
use tfrecords_table::{DecodeOptions, EncodeOptions, ErrorKind, Value, decode, encode};

#[cfg(feature = "io-jsonl")]
#[test]
fn jsonl_to_records_and_back() -> Result<()> {
    use tfrecords_table::{read_jsonl_table, write_jsonl_table};

    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in.jsonl");
    fs::write(
        &input,
        concat!(
            "{\"id\": 1, \"tags\": [\"a\", \"b\"], \"score\": 0.25}\n",
            "\n",
            "{\"id\": 2, \"tags\": [\"c\"], \"score\": null}\n",
        ),
    )?;

    let table = read_jsonl_table(&input)?;
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["id", "tags", "score"]);
    assert_eq!(table.num_rows(), 2);

    let out = tmp.path().join("records");
    encode(&table, out.to_str().unwrap(), &EncodeOptions::default())?;
    let back = decode(&[out.to_str().unwrap()], &DecodeOptions::default())?;
    assert_eq!(
        back.column("score").unwrap().values,
        vec![Value::Float(0.25), Value::Float(-999.0)]
    );

    let written = tmp.path().join("nested/out.jsonl");
    assert_eq!(write_jsonl_table(&written, &back)?, 2);
    let lines: Vec<String> = fs::read_to_string(&written)?
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines[0], r#"{"id":1,"score":0.25,"tags":["a","b"]}"#);
    assert_eq!(lines[1], r#"{"id":2,"score":-999.0,"tags":["c"]}"#);
    Ok(())
}

#[cfg(feature = "io-jsonl")]
#[test]
fn jsonl_rejects_non_objects() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("bad.jsonl");
    fs::write(&input, "[1, 2]\n")?;
    let err = tfrecords_table::read_jsonl_table(&input).unwrap_err();
    assert_eq!(err.kind, ErrorKind::IoFailure);

    fs::write(&input, "{\"meta\": {\"k\": 1}}\n")?;
    let err = tfrecords_table::read_jsonl_table(&input).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedType);
    Ok(())
}

#[cfg(feature = "io-csv")]
#[test]
fn csv_cells_are_typed() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in.csv");
    fs::write(&input, "id,price,city\n1,9.5,Oslo\n2,,Lima\n")?;

    let table = tfrecords_table::read_csv_table(&input)?;
    assert_eq!(
        table.column("id").unwrap().values,
        vec![Value::Int(1), Value::Int(2)]
    );
    assert_eq!(
        table.column("price").unwrap().values,
        vec![Value::Float(9.5), Value::Null]
    );

    let out = tmp.path().join("records");
    encode(&table, out.to_str().unwrap(), &EncodeOptions::default())?;
    let back = decode(&[out.to_str().unwrap()], &DecodeOptions::default())?;
    assert_eq!(
        back.column("price").unwrap().values,
        vec![Value::Float(9.5), Value::Float(-999.0)]
    );
    assert_eq!(
        back.column("city").unwrap().values,
        vec![Value::from("Oslo"), Value::from("Lima")]
    );
    Ok(())
}
