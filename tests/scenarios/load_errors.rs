//! Test: Load errors - malformed documents are rejected before planning

use stagegate::{PipelineSpec, SpecError};

fn load_err(yaml: &str) -> SpecError {
    match PipelineSpec::from_yaml(yaml) {
        Ok(spec) => panic!("Expected '{}' to be rejected", spec.name),
        Err(e) => e,
    }
}

#[test]
fn test_duplicate_stage_name() {
    let err = load_err(
        r#"
name: "Dup"
stages:
  - name: test
  - name: test
"#,
    );
    assert!(matches!(err, SpecError::DuplicateStageName(name) if name == "test"));
}

#[test]
fn test_duplicate_stage_position() {
    let err = load_err(
        r#"
name: "Dup position"
stages:
  - name: test
    position: 2
  - name: deploy
"#,
    );
    match err {
        SpecError::DuplicateStagePosition { position, first, second } => {
            assert_eq!(position, 2);
            assert_eq!(first, "test");
            assert_eq!(second, "deploy");
        }
        other => panic!("Expected DuplicateStagePosition, got {:?}", other),
    }
}

#[test]
fn test_exclusion_must_name_known_axis_values() {
    let err = load_err(
        r#"
name: "Bad exclude"
stages:
  - name: build
    jobs:
      - name: binary
        matrix:
          os: [linux, osx]
        exclude:
          - { arch: arm64 }
"#,
    );
    match err {
        SpecError::UnknownAxis { location, axis } => {
            assert_eq!(location, "stage 'build', job 'binary'");
            assert_eq!(axis, "arch");
        }
        other => panic!("Expected UnknownAxis, got {:?}", other),
    }

    let err = load_err(
        r#"
name: "Bad value"
stages:
  - name: build
    jobs:
      - name: binary
        matrix:
          os: [linux, osx]
        exclude:
          - { os: windows }
"#,
    );
    assert!(matches!(err, SpecError::UnknownAxisValue { value, .. } if value == "windows"));
}

#[test]
fn test_empty_axis_is_rejected() {
    let err = load_err(
        r#"
name: "Empty axis"
stages:
  - name: test
    jobs:
      - name: unit
        matrix:
          python: []
"#,
    );
    assert!(matches!(err, SpecError::EmptyAxis { axis, .. } if axis == "python"));
}

#[test]
fn test_condition_is_checked_against_context_schema() {
    let err = load_err(
        r#"
name: "Unknown field"
stages:
  - name: publish
    if: { eq: { field: commit_message, value: release } }
"#,
    );
    match err {
        SpecError::UnknownField { location, field } => {
            assert_eq!(location, "stage 'publish'");
            assert_eq!(field, "commit_message");
        }
        other => panic!("Expected UnknownField, got {:?}", other),
    }

    let err = load_err(
        r#"
name: "Bad literal"
stages:
  - name: publish
    if: { eq: { field: event_type, value: merge } }
"#,
    );
    assert!(matches!(err, SpecError::InvalidLiteral { .. }));

    let err = load_err(
        r#"
name: "Bad pattern"
stages:
  - name: publish
    if: { matches: { field: branch, pattern: "release/(" } }
"#,
    );
    assert!(matches!(err, SpecError::InvalidPattern { .. }));
}

#[test]
fn test_unknown_operator_is_a_parse_error() {
    let err = load_err(
        r#"
name: "Bad operator"
stages:
  - name: publish
    if: { xor: [pull_request, pull_request] }
"#,
    );
    assert!(matches!(err, SpecError::Yaml(_)));
}

#[test]
fn test_dangling_deploy_references() {
    let err = load_err(
        r#"
name: "Unknown template"
stages:
  - name: publish
    jobs:
      - name: upload
        deploy: [pypi]
"#,
    );
    assert!(matches!(err, SpecError::UnknownDeployTemplate { name, .. } if name == "pypi"));

    let err = load_err(
        r#"
name: "Dangling base"
deploy_templates:
  testpypi:
    extends: pypi
    provider: pypi
stages: []
"#,
    );
    match err {
        SpecError::DanglingComposition { location, base } => {
            assert_eq!(location, "deploy template 'testpypi'");
            assert_eq!(base, "pypi");
        }
        other => panic!("Expected DanglingComposition, got {:?}", other),
    }
}

#[test]
fn test_errors_name_their_location() {
    let err = load_err(
        r#"
name: "Location"
stages:
  - name: test
    jobs:
      - name: unit
        matrix:
          python: ["3.7"]
        allow_failures:
          - { python: "2.7" }
"#,
    );
    assert_eq!(
        err.to_string(),
        "stage 'test', job 'unit': value '2.7' is not declared on matrix axis 'python'"
    );
}

#[test]
fn test_deploy_gate_keys_are_checked() {
    let err = load_err(
        r#"
name: "Misspelt gate"
stages:
  - name: publish
    jobs:
      - name: upload
        deploy:
          - provider: pypi
            on: { tag: true, branchs: master }
"#,
    );
    assert!(matches!(err, SpecError::Yaml(_)));

    let err = load_err(
        r#"
name: "Misspelt clause"
deploy_templates:
  pypi:
    provider: pypi
    parms: { user: bot }
stages: []
"#,
    );
    assert!(matches!(err, SpecError::Yaml(_)));
}

#[test]
fn test_repeated_axis_value_is_rejected() {
    let err = load_err(
        r#"
name: "Repeated value"
stages:
  - name: test
    jobs:
      - name: unit
        matrix:
          os: [linux, linux, osx]
        exclude:
          - { os: linux }
"#,
    );
    match err {
        SpecError::DuplicateAxisValue { location, axis, value } => {
            assert_eq!(location, "stage 'test', job 'unit'");
            assert_eq!(axis, "os");
            assert_eq!(value, "linux");
        }
        other => panic!("Expected DuplicateAxisValue, got {:?}", other),
    }
}

#[test]
fn test_unquoted_float_versions_are_rejected() {
    let err = load_err(
        r#"
name: "Float axis"
stages:
  - name: test
    jobs:
      - name: unit
        matrix:
          runtime_version: [3.8, 3.10]
"#,
    );
    match err {
        SpecError::InvalidMatrix { location, message } => {
            assert_eq!(location, "stage 'test', job 'unit'");
            assert!(message.contains("runtime_version"));
            assert!(message.contains("quote it"));
        }
        other => panic!("Expected InvalidMatrix, got {:?}", other),
    }

    let err = load_err(
        r#"
name: "Float exclusion"
stages:
  - name: test
    jobs:
      - name: unit
        matrix:
          runtime_version: ["3.8", "3.10"]
        exclude:
          - { runtime_version: 3.10 }
"#,
    );
    assert!(matches!(err, SpecError::InvalidMatrix { .. }));
}

#[test]
fn test_quoted_versions_keep_their_text() {
    let spec = PipelineSpec::from_yaml(
        r#"
name: "Quoted"
stages:
  - name: test
    jobs:
      - name: unit
        matrix:
          runtime_version: ["3.8", "3.10"]
"#,
    )
    .unwrap();
    let values = &spec.stages[0].jobs[0].axes[0].values;
    assert_eq!(values, &vec!["3.8".to_string(), "3.10".to_string()]);
}

#[test]
fn test_zero_max_parallel_is_rejected() {
    let err = load_err(
        r#"
name: "No slots"
max_parallel: 0
stages:
  - name: test
    jobs:
      - name: unit
"#,
    );
    assert!(matches!(err, SpecError::InvalidMaxParallel));
}
