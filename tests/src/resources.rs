use crate::support::{App, apply_file_diff, parse_diff, section};
use smalipatch_patch::resource::{PUBLIC_XML, parse_public_table};
use smalipatch_patch::{PatchRegistry, define_resource};
use smalipatch_utils::errors::{ApplyError, InstructionError};

const R_PATH: &str = "smali/com/example/app";
const R_ID: &str = "smali/com/example/app/R$id.smali";

const TABLE: &str = "\
<?xml version=\"1.0\" encoding=\"utf-8\"?>
<resources>
    <public type=\"id\" name=\"a\" id=\"0x7f010001\" />
</resources>
";

const R_CLASS: &str = "\
.class public final Lcom/example/app/R$id;
.super Ljava/lang/Object;

.field public static final a:I = 0x7f010001
";

fn app() -> App {
    let app = App::new();
    app.write(PUBLIC_XML, TABLE).write(R_ID, R_CLASS);
    app
}

fn define_b() -> PatchRegistry {
    let mut reg = PatchRegistry::new();
    reg.register("ids", vec![define_resource(R_PATH, "id", "b")])
        .unwrap();
    reg
}

#[test]
fn allocates_next_id_and_declares_field() {
    let app = app();
    let (res, diff) = app.apply(&define_b());
    res.unwrap();

    let table = app.read(PUBLIC_XML);
    assert!(table.contains("<public type=\"id\" name=\"b\" id=\"0x7f010002\" />\n</resources>"));
    let entries = parse_public_table(&table).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].id, "0x7f010002");

    let r = app.read(R_ID);
    assert!(r.starts_with(R_CLASS));
    assert!(r.ends_with("\n.field public static final b:I = 0x7f010002\n"));

    let files = parse_diff(&diff);
    assert_eq!(files.len(), 2);
    assert_eq!(apply_file_diff(TABLE, section(&files, PUBLIC_XML)), table);
    assert_eq!(apply_file_diff(R_CLASS, section(&files, R_ID)), r);
}

#[test]
fn second_run_changes_nothing() {
    let app = app();
    let (res, _) = app.apply(&define_b());
    res.unwrap();
    let table = app.read(PUBLIC_XML);
    let r = app.read(R_ID);

    let (res, diff) = app.apply(&define_b());
    res.unwrap();
    assert_eq!(app.read(PUBLIC_XML), table);
    assert_eq!(app.read(R_ID), r);
    // only the table header, the R class is not visited
    assert_eq!(diff, format!("--- a/{PUBLIC_XML}\n+++ b/{PUBLIC_XML}\n"));
}

#[test]
fn unseeded_type_fails() {
    let app = app();
    let mut reg = PatchRegistry::new();
    reg.register("strings", vec![define_resource(R_PATH, "string", "hello")])
        .unwrap();

    let (res, _) = app.apply(&reg);
    let ApplyError::Instruction { source, .. } = res.unwrap_err();
    assert!(matches!(source, InstructionError::ResourceTypeSeedMissing(t) if t == "string"));
    assert_eq!(app.read(PUBLIC_XML), TABLE);
}

#[test]
fn missing_r_class_fails_after_table_update() {
    let app = App::new();
    app.write(PUBLIC_XML, TABLE);
    let (res, _) = app.apply(&define_b());
    let ApplyError::Instruction { source, .. } = res.unwrap_err();
    assert!(matches!(source, InstructionError::Io { op: "read", path, .. } if path == R_ID));
    assert!(app.read(PUBLIC_XML).contains("name=\"b\""));
}
