use super::*;

const INPUT_1: &str = ".*";
const INPUT_2: &str = r"// ;warn:(\d+):(\d+): (.*)";
const OUTPUT_1: &str = ".*";
const OUTPUT_2: &str = r"\w+ - (\d+)/(\d+) - (.*)$";

#[allow(clippy::too_many_arguments)]
fn warn(
    exec_cmd: &str,
    input: &str,
    output: &str,
    has_line: Option<bool>,
    has_column: Option<bool>,
    line: Option<usize>,
    column: Option<usize>,
    message: usize,
    exact: Option<bool>,
) -> WarnPluginConfig {
    WarnPluginConfig {
        exec_cmd: Some(exec_cmd.to_string()),
        warnings_input_pattern: Some(Pattern::new(input)),
        warnings_output_pattern: Some(Pattern::new(output)),
        warning_text_has_line: has_line,
        warning_text_has_column: has_column,
        line_capture_group: line,
        column_capture_group: column,
        message_capture_group: Some(message),
        exact_warnings_match: exact,
        ..WarnPluginConfig::default()
    }
}

fn warn_2() -> WarnPluginConfig {
    warn(
        "execCmd2",
        INPUT_1,
        OUTPUT_1,
        Some(true),
        Some(true),
        Some(2),
        Some(2),
        2,
        Some(true),
    )
}

fn warn_3() -> WarnPluginConfig {
    warn(
        "execCmd3",
        INPUT_2,
        OUTPUT_2,
        None,
        Some(false),
        Some(3),
        Some(3),
        3,
        None,
    )
}

#[test]
fn child_keeps_identity_fields_and_inherits_gaps() {
    let merged = warn_3().merge_with(&warn_2());
    let expected = warn(
        "execCmd3",
        INPUT_2,
        OUTPUT_2,
        Some(true),
        Some(false),
        Some(3),
        Some(3),
        3,
        Some(true),
    );
    assert_eq!(merged, expected);
}

#[test]
fn omitted_line_group_and_exact_flag_come_from_nearest_ancestor() {
    let grandparent = WarnPluginConfig {
        line_capture_group: Some(7),
        exact_warnings_match: Some(true),
        ..warn_2()
    };
    let parent = WarnPluginConfig {
        exact_warnings_match: Some(false),
        line_capture_group: None,
        ..warn_2()
    };
    let child = WarnPluginConfig {
        exec_cmd: Some("childCmd".to_string()),
        message_capture_group: Some(9),
        ..WarnPluginConfig::default()
    };
    let merged = child.merge_with(&parent.merge_with(&grandparent));
    assert_eq!(merged.line_capture_group, Some(7));
    assert_eq!(merged.exact_warnings_match, Some(false));
    assert_eq!(merged.exec_cmd.as_deref(), Some("childCmd"));
    assert_eq!(merged.message_capture_group, Some(9));
}

#[test]
fn identity_fields_are_never_taken_from_parent() {
    let child = WarnPluginConfig {
        batch_size: Some(2),
        ..WarnPluginConfig::default()
    };
    let merged = child.merge_with(&warn_2());
    assert_eq!(merged.exec_cmd, None);
    assert_eq!(merged.message_capture_group, None);
    let err = merged.validate_and_set_defaults(None).unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingField {
            section: "warn",
            field: "execCmd"
        }
    );
}

#[test]
fn validation_sets_documented_defaults() {
    let config = WarnPluginConfig {
        exec_cmd: Some("execCmd".to_string()),
        message_capture_group: Some(1),
        ..WarnPluginConfig::default()
    };
    let validated = config.validate_and_set_defaults(None).unwrap();
    assert_eq!(validated.input_pattern().as_str(), DEFAULT_INPUT_PATTERN);
    assert_eq!(validated.output_pattern().as_str(), DEFAULT_OUTPUT_PATTERN);
    assert_eq!(validated.warning_text_has_line, Some(false));
    assert_eq!(validated.warning_text_has_column, Some(false));
    assert_eq!(validated.exact_warnings_match, Some(true));
    assert_eq!(validated.batch_size, Some(1));
    assert_eq!(validated.batch_separator.as_deref(), Some(" "));
    assert_eq!(validated.test_name_suffix.as_deref(), Some("Test"));
    assert_eq!(validated.delimiters(), ("{{".to_string(), "}}".to_string()));
    assert_eq!(
        validated.validate_and_set_defaults(None).unwrap(),
        validated,
        "validation must be a fixed point"
    );
}

#[test]
fn line_flag_without_group_is_fatal() {
    let config = WarnPluginConfig {
        exec_cmd: Some("execCmd".to_string()),
        warning_text_has_line: Some(true),
        message_capture_group: Some(1),
        ..WarnPluginConfig::default()
    };
    let err = config.validate_and_set_defaults(None).unwrap_err();
    assert_eq!(
        err,
        ConfigError::LocationGroupMissing {
            flag: "warningTextHasLine",
            group: "lineCaptureGroup"
        }
    );
}

#[test]
fn column_group_with_disabled_flag_is_fatal() {
    let config = WarnPluginConfig {
        exec_cmd: Some("execCmd".to_string()),
        warning_text_has_column: Some(false),
        column_capture_group: Some(2),
        message_capture_group: Some(1),
        ..WarnPluginConfig::default()
    };
    let err = config.validate_and_set_defaults(None).unwrap_err();
    assert!(err.to_string().contains("columnCaptureGroup is provided (actual: 2)"));
}

#[test]
fn group_without_flag_turns_flag_on() {
    let config = WarnPluginConfig {
        exec_cmd: Some("execCmd".to_string()),
        line_capture_group: Some(2),
        message_capture_group: Some(1),
        ..WarnPluginConfig::default()
    };
    let validated = config.validate_and_set_defaults(None).unwrap();
    assert_eq!(validated.warning_text_has_line, Some(true));
}

#[test]
fn general_section_supplies_command_and_input_pattern() {
    let general = GeneralConfig {
        exec_cmd: Some("ktlint".to_string()),
        expected_warnings_pattern: Some(Pattern::new(r"// ;warn:(.+)")),
        ..GeneralConfig::default()
    };
    let config = WarnPluginConfig {
        message_capture_group: Some(1),
        ..WarnPluginConfig::default()
    };
    let validated = config.validate_and_set_defaults(Some(&general)).unwrap();
    assert_eq!(validated.exec_cmd().unwrap(), "ktlint");
    assert_eq!(validated.input_pattern().as_str(), r"// ;warn:(.+)");
}

#[test]
fn invalid_regex_and_zero_batch_are_rejected() {
    let bad_regex = WarnPluginConfig {
        exec_cmd: Some("execCmd".to_string()),
        message_capture_group: Some(1),
        warnings_output_pattern: Some(Pattern::new("(oops")),
        ..WarnPluginConfig::default()
    };
    assert!(matches!(
        bad_regex.validate_and_set_defaults(None),
        Err(ConfigError::InvalidPattern {
            field: "warningsOutputPattern",
            ..
        })
    ));

    let zero_batch = WarnPluginConfig {
        exec_cmd: Some("execCmd".to_string()),
        message_capture_group: Some(1),
        batch_size: Some(0),
        ..WarnPluginConfig::default()
    };
    assert!(matches!(
        zero_batch.validate_and_set_defaults(None),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn resource_pattern_uses_suffix() {
    let config = WarnPluginConfig {
        test_name_suffix: Some("Check".to_string()),
        ..WarnPluginConfig::default()
    };
    let pattern = config.resource_name_pattern();
    assert!(pattern.matches_entire("ClassNameCheck.kt"));
    assert!(!pattern.matches_entire("ClassNameTest.kt"));
}
