//! End-to-end tests: description text in, artifact files out.

use smgen::codegen::{self, Artifact, Generator};
use smgen::config::Manifest;
use smgen::model::{self, ValidationGap};
use smgen::parser::{self, Builder, DanglingPolicy};
use std::fs;
use std::io::{self, Write};

const DOOR: &str = r#"<?xml version="1.0"?>
<stateMachine>
  <title>Door</title>
  <state name="Open" initial="true"/>
  <state name="Closed" error="true"/>
  <transition from="Open" to="Closed" condition="locked" action="lockDoor"/>
</stateMachine>
"#;

struct FailingSink;

impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_door_scenario() {
    let machine = parser::parse(DOOR).unwrap();
    assert!(model::check(&machine).is_empty());

    let dir = tempfile::tempdir().unwrap();
    let base = codegen::base_name(&machine, None);
    assert_eq!(base, "door");

    let generators: Vec<Box<dyn Generator>> =
        Artifact::ALL.into_iter().map(Artifact::generator).collect();
    let results = codegen::write_artifacts(&machine, &generators, dir.path(), &base);
    let paths: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(
        paths,
        ["door.dot", "door.h", "door.c", "door.txt"].map(|name| dir.path().join(name))
    );

    let dot = fs::read_to_string(dir.path().join("door.dot")).unwrap();
    assert!(dot.starts_with("digraph \"door\" {\n"));
    assert!(dot.contains("\"Open\" [label = \"Open\", shape = \"doublecircle\"];"));
    assert!(dot.contains("\"Closed\" [label = \"Closed\", style = \"filled\""));
    assert_eq!(dot.matches(" -> ").count(), 1);
    assert!(dot.contains("\"Open\" -> \"Closed\" [label = \"locked / lockDoor\"];"));

    let header = fs::read_to_string(dir.path().join("door.h")).unwrap();
    assert!(header.contains("    door_Open,\n    door_Closed,\n    DOOR_STATE_COUNT\n"));
    assert!(header.contains("void lockDoor(void);"));

    let source = fs::read_to_string(dir.path().join("door.c")).unwrap();
    assert!(source.contains("#include \"door.h\""));
    assert!(source.contains("        if (locked) {\n            lockDoor();\n            return door_Closed;\n"));

    let doc = fs::read_to_string(dir.path().join("door.txt")).unwrap();
    assert!(doc.starts_with("Door\n====\n"));
    assert!(doc.contains("Open [initial]\n"));
    assert!(doc.contains("Closed [error]\n"));
    assert!(doc.contains("\nOpen\n    Open -> Closed\n        condition: locked  action: lockDoor\n"));
}

#[test]
fn test_failing_sink_does_not_affect_other_artifacts() {
    let machine = parser::parse(DOOR).unwrap();

    let err = Artifact::Header
        .generator()
        .write_to(&machine, "door", &mut FailingSink)
        .unwrap_err();
    assert_eq!(err.artifact, Artifact::Header);
    assert!(err.to_string().contains("disk full"));

    let mut buffer = Vec::new();
    Artifact::Source
        .generator()
        .write_to(&machine, "door", &mut buffer)
        .unwrap();
    assert!(String::from_utf8(buffer).unwrap().contains("door_step"));
}

#[test]
fn test_unwritable_artifact_is_reported_alone() {
    let machine = parser::parse(DOOR).unwrap();
    let dir = tempfile::tempdir().unwrap();

    // A directory where the header file should go makes only that artifact fail.
    fs::create_dir(dir.path().join("door.h")).unwrap();

    let generators: Vec<Box<dyn Generator>> =
        Artifact::ALL.into_iter().map(Artifact::generator).collect();
    let results = codegen::write_artifacts(&machine, &generators, dir.path(), "door");

    assert_eq!(results.len(), 4);
    for (artifact, result) in Artifact::ALL.into_iter().zip(&results) {
        match artifact {
            Artifact::Header => {
                let err = result.as_ref().unwrap_err();
                assert_eq!(err.artifact, Artifact::Header);
                assert!(err.target.ends_with("door.h"));
            }
            _ => assert!(result.is_ok(), "{artifact} failed"),
        }
    }
    assert!(dir.path().join("door.c").is_file());
}

#[test]
fn test_regeneration_is_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let generators = Manifest::default().generators();

    for dir in [&first, &second] {
        let machine = parser::parse(DOOR).unwrap();
        for result in codegen::write_artifacts(&machine, &generators, dir.path(), "door") {
            result.unwrap();
        }
    }

    for artifact in Artifact::ALL {
        let name = artifact.file_name("door");
        assert_eq!(
            fs::read(first.path().join(&name)).unwrap(),
            fs::read(second.path().join(&name)).unwrap(),
            "{name} differs"
        );
    }
}

#[test]
fn test_first_match_wins_end_to_end() {
    let machine = parser::parse(
        r#"<stateMachine title="Guards">
             <state name="S1" initial="true">
               <transition to="S2" condition="true"/>
               <transition to="S3" condition="false"/>
             </state>
             <state name="S2"/>
             <state name="S3"/>
           </stateMachine>"#,
    )
    .unwrap();

    let source = Artifact::Source.generator().generate(&machine, "guards");
    let case = &source[source.find("case guards_S1:").unwrap()..];
    let first = case.find("if (true)").unwrap();
    let second = case.find("if (false)").unwrap();
    assert!(first < second);
    assert!(case[first..second].contains("return guards_S2;"));
}

#[test]
fn test_dangling_policies() {
    let source = r#"<stateMachine><state name="A"/><transition from="A" to="B"/></stateMachine>"#;

    let warned = Builder::new().parse_str(source).unwrap();
    assert!(!warned.has_state("B"));
    assert!(model::check(&warned)
        .iter()
        .any(|gap| matches!(gap, ValidationGap::DanglingEndpoint { name, .. } if name == "B")));

    let declared = Builder::new()
        .with_policy(DanglingPolicy::Declare)
        .parse_str(source)
        .unwrap();
    let names: Vec<_> = declared.states().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);

    assert!(Builder::new()
        .with_policy(DanglingPolicy::Reject)
        .parse_str(source)
        .is_err());
}

#[test]
fn test_parse_from_reader() {
    let machine = Builder::new()
        .parse_reader(io::BufReader::new(DOOR.as_bytes()))
        .unwrap();
    assert_eq!(machine, parser::parse(DOOR).unwrap());
}
