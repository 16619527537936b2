use anyhow::Result;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const BIN: &str = env!("CARGO_BIN_EXE_bnql-exec");

const SCRIPT: &str = r#"[
    {"CreateTable": {"table_name": "items", "columns": [
        {"name": "id", "data_type": "Integer"},
        {"name": "label", "data_type": "Text", "length": 8},
        {"name": "price", "data_type": "Float"}
    ]}},
    {"CreateIndex": {"index_name": "items_id", "table_name": "items", "column": "id", "unique": true}},
    {"Insert": {"table_name": "items", "values": [{"Integer": 1}, {"Text": "pen"}, {"Float": 1.5}]}},
    {"Insert": {"table_name": "items", "values": [{"Integer": 2}, {"Text": "ink"}, {"Float": 4.126}]}},
    {"Insert": {"table_name": "items", "values": [{"Integer": 2}, {"Text": "dup"}, {"Float": 1.0}]}},
    {"Select": {"tables": ["items"], "columns": [{"Wildcard": {}}],
        "filter": [{"left": {"Column": {"name": "id"}}, "comparator": "GreaterEqual",
                    "right": {"Literal": {"Integer": 1}}}]}},
    {"Select": {"tables": ["items"], "aggregations": [
        {"kind": "Count", "target": "Star"},
        {"kind": "Avg", "target": {"Column": {"name": "price"}}}
    ]}},
    "ShowTables"
]"#;

fn write_script(contents: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn test_cli_runs_script() -> Result<()> {
    let script = write_script(SCRIPT)?;
    let output = Command::new(BIN).arg("run").arg(script.path()).output()?;
    assert!(output.status.success(), "bnql-exec run failed: {:?}", output);

    let stdout = String::from_utf8(output.stdout)?;
    let expected = "SUCCESS\nSUCCESS\nSUCCESS\nSUCCESS\nFAILURE\n\
                    id | label | price\n1 | pen | 1.5\n2 | ink | 4.13\n\
                    COUNT(*) | AVG(PRICE)\n2 | 2.81\n\
                    items\n";
    assert_eq!(stdout, expected);

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Error:"), "duplicate insert should report its error");
    Ok(())
}

#[test]
fn test_cli_float_precision_flag() -> Result<()> {
    let script = write_script(SCRIPT)?;
    let output = Command::new(BIN)
        .args(["--float-precision", "3", "--no-index-scan", "run"])
        .arg(script.path())
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("2 | ink | 4.126\n"));
    assert!(stdout.contains("2 | 2.813\n"));
    Ok(())
}

#[test]
fn test_cli_rejects_malformed_script() -> Result<()> {
    let script = write_script("[{\"Select\": 42}]")?;
    let output = Command::new(BIN).arg("run").arg(script.path()).output()?;
    assert!(!output.status.success());

    let output = Command::new(BIN).args(["run", "/nonexistent/script.json"]).output()?;
    assert!(!output.status.success());
    Ok(())
}
