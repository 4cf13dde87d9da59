use super::*;

fn text(raw: &[&str]) -> PatchText {
    PatchText {
        lines: raw.iter().map(|s| s.to_string()).collect(),
        line_ending: LineEnding::Lf,
    }
}

// ── Directive ──────────────────────────────────────────────────────────

#[test]
fn test_directive_plain_json() {
    let d = parse_directive(r#"{"minRecords": 1, "maxRecords": 5}"#)
        .unwrap()
        .unwrap();
    assert_eq!(d.min_records, Some(1));
    assert_eq!(d.max_records, Some(5));
}

#[test]
fn test_directive_commented_forms() {
    for line in [
        r#"--{"maxRecords": 3}"#,
        r#"-- {"maxRecords": 3}"#,
        r#"--   {"maxRecords": 3}  "#,
    ] {
        let d = parse_directive(line).unwrap().unwrap();
        assert_eq!(d.max_records, Some(3), "line: {line}");
        assert_eq!(d.min_records, None, "line: {line}");
    }
}

#[test]
fn test_directive_pascal_case_fields() {
    let d = parse_directive(r#"-- {"MinRecords": 2, "MaxRecords": null}"#)
        .unwrap()
        .unwrap();
    assert_eq!(d.min_records, Some(2));
    assert_eq!(d.max_records, None);
}

#[test]
fn test_not_a_directive() {
    assert_eq!(parse_directive("CREATE TABLE t (id INT);").unwrap(), None);
    assert_eq!(parse_directive("-- just a comment").unwrap(), None);
    assert_eq!(parse_directive("").unwrap(), None);
}

#[test]
fn test_directive_without_bounds_is_error() {
    let err = parse_directive(r#"-- {"minRecords": null}"#).unwrap_err();
    match err {
        CoreError::DirectiveDecode { message } => {
            assert!(message.contains("MinRecords and/or MaxRecords"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(parse_directive("{}").is_err());
}

#[test]
fn test_malformed_directive_is_error() {
    let err = parse_directive("-- {maxRecords: ten}").unwrap_err();
    assert!(matches!(err, CoreError::DirectiveDecode { .. }));
}

#[test]
fn test_directive_admits() {
    let d = RowCountDirective {
        min_records: Some(2),
        max_records: Some(4),
    };
    assert!(!d.admits(1));
    assert!(d.admits(2));
    assert!(d.admits(4));
    assert!(!d.admits(5));

    let max_only = RowCountDirective {
        min_records: None,
        max_records: Some(0),
    };
    assert!(max_only.admits(0));
    assert!(!max_only.admits(1));
}

// ── Batch splitting ────────────────────────────────────────────────────

#[test]
fn test_separator_detection() {
    assert!(is_batch_separator("GO"));
    assert!(is_batch_separator("go"));
    assert!(is_batch_separator("  Go -- next"));
    assert!(is_batch_separator("GO 5"));
    assert!(!is_batch_separator("SELECT 'GO'"));
    assert!(!is_batch_separator("G"));
    assert!(!is_batch_separator(""));
}

#[test]
fn test_split_on_go() {
    let t = text(&["CREATE TABLE a (id INT);", "GO", "INSERT INTO a VALUES (1);", "go"]);
    let batches = split_batches(&t.lines, t.line_ending);
    assert_eq!(
        batches,
        vec![
            "CREATE TABLE a (id INT);\n".to_string(),
            "INSERT INTO a VALUES (1);\n".to_string(),
            String::new(),
        ]
    );
}

#[test]
fn test_split_without_separator_yields_single_batch() {
    let t = text(&["SELECT 1;", "SELECT 2;"]);
    assert_eq!(
        split_batches(&t.lines, t.line_ending),
        vec!["SELECT 1;\nSELECT 2;\n".to_string()]
    );
}

#[test]
fn test_split_empty_input_yields_one_empty_batch() {
    assert_eq!(split_batches(&[], LineEnding::Lf), vec![String::new()]);
}

#[test]
fn test_split_keeps_crlf() {
    let t = PatchText::from_content("SELECT 1;\r\nGO\r\nSELECT 2;\r\n");
    assert_eq!(t.line_ending, LineEnding::CrLf);
    assert_eq!(
        split_batches(&t.lines, t.line_ending),
        vec!["SELECT 1;\r\n".to_string(), "SELECT 2;\r\n".to_string()]
    );
}

#[test]
fn test_from_content_strips_bom() {
    let t = PatchText::from_content("\u{feff}-- {\"maxRecords\": 1}\nSELECT 1;\n");
    assert_eq!(t.lines[0], "-- {\"maxRecords\": 1}");
    assert_eq!(t.line_ending, LineEnding::Lf);
    assert_eq!(t.lines.len(), 2);
}

// ── Preparation ────────────────────────────────────────────────────────

#[test]
fn test_prepare_strips_directive_line() {
    let t = text(&[r#"-- {"maxRecords": 1}"#, "UPDATE t SET x = 1;"]);
    let prepared = prepare_script(&t, None).unwrap();
    assert_eq!(prepared.directive.unwrap().max_records, Some(1));
    assert_eq!(prepared.batches, vec!["UPDATE t SET x = 1;\n".to_string()]);
}

#[test]
fn test_prepare_directive_only_recognised_on_first_line() {
    let t = text(&["SELECT 1;", r#"-- {"maxRecords": 1}"#]);
    let prepared = prepare_script(&t, None).unwrap();
    assert!(prepared.directive.is_none());
    assert_eq!(prepared.batches[0], "SELECT 1;\n-- {\"maxRecords\": 1}\n");
}

#[test]
fn test_prepare_filters_environment_after_directive() {
    let t = text(&[
        r#"{"minRecords": 1}"#,
        "<environment>",
        "<dev>",
        "INSERT INTO t VALUES (1);",
        "GO",
        "INSERT INTO t VALUES (2);",
        "</dev>",
        "<prod>",
        "INSERT INTO t VALUES (3);",
        "</prod>",
        "</environment>",
    ]);
    let prepared = prepare_script(&t, Some("DEV")).unwrap();
    assert_eq!(prepared.directive.unwrap().min_records, Some(1));
    assert_eq!(
        prepared.batches,
        vec![
            "INSERT INTO t VALUES (1);\n".to_string(),
            "INSERT INTO t VALUES (2);\n".to_string(),
        ]
    );
}

#[test]
fn test_prepare_unmatched_environment_has_nothing_to_execute() {
    let t = text(&["<environment>", "<prod>SELECT 1;</prod>", "</environment>"]);
    let prepared = prepare_script(&t, Some("dev")).unwrap();
    assert_eq!(prepared.batches, vec![String::new()]);
    assert_eq!(prepared.executable_batches().count(), 0);
}

#[test]
fn test_executable_batches_skip_blank() {
    let t = text(&["GO", "SELECT 1;", "GO", "   ", "GO"]);
    let prepared = prepare_script(&t, None).unwrap();
    assert_eq!(prepared.batches.len(), 4);
    let executable: Vec<&str> = prepared.executable_batches().collect();
    assert_eq!(executable, vec!["SELECT 1;\n"]);
}

#[test]
fn test_prepare_propagates_directive_error() {
    let t = text(&["-- {}", "SELECT 1;"]);
    assert!(matches!(
        prepare_script(&t, None),
        Err(CoreError::DirectiveDecode { .. })
    ));
}
