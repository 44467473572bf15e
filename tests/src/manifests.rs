use crate::support::App;
use serde_json::json;
use smalipatch_patch::manifest::{Manifest, load_registry};
use smalipatch_patch::{ApplyConfig, pass};
use std::fs;
use tempfile::TempDir;

const WEB: &str = "smali/com/example/Web.smali";

const WEB_UNIT: &str = "\
.class public Lcom/example/Web;
.super Ljava/lang/Object;

.field public static final VERSION:Ljava/lang/String; = \"1.0\"

.method static constructor <clinit>()V
    .locals 0
    return-void
.end method
";

fn manifest() -> serde_json::Value {
    json!({
        "patches": [
            {
                "name": "web-debug",
                "instructions": [{
                    "op": "patch_file",
                    "paths": [WEB],
                    "patchers": [
                        { "op": "in_method", "signature": "<clinit>()V", "patchers": [
                            { "op": "replace_string",
                              "find": "    return-void\n",
                              "replace": "    const/4 v0, 0x1\n    invoke-static {v0}, Landroid/webkit/WebView;->setWebContentsDebuggingEnabled(Z)V\n    return-void\n" }
                        ]},
                        { "op": "in_constant", "identifier": "VERSION:Ljava/lang/String;", "patcher":
                            { "op": "replace_regex", "pattern": "\"[0-9.]+\"", "replace": "\"1.0-$$patched\"", "literal": false }
                        }
                    ]
                }]
            },
            {
                "name": "fonts",
                "instructions": [
                    { "op": "copy_file", "path": "assets/fonts/mono.txt", "source": "data/mono.txt" }
                ]
            }
        ]
    })
}

fn write_manifest(dir: &TempDir) -> std::path::PathBuf {
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/mono.txt"), "glyphs\n").unwrap();
    let path = dir.path().join("patches.json");
    fs::write(&path, serde_json::to_string_pretty(&manifest()).unwrap()).unwrap();
    path
}

#[test]
fn manifest_patches_apply() {
    let app = App::new();
    app.write(WEB, WEB_UNIT);
    let defs = TempDir::new().unwrap();
    let registry = load_registry(&[write_manifest(&defs)]).unwrap();

    let (res, diff) = app.apply(&registry);
    let summary = res.unwrap();
    assert_eq!(summary.applied, ["fonts", "web-debug"]);

    let web = app.read(WEB);
    assert!(web.contains("setWebContentsDebuggingEnabled(Z)V\n    return-void\n.end method"));
    assert!(web.contains("= \"1.0-$patched\"\n"));
    assert_eq!(app.read("assets/fonts/mono.txt"), "glyphs\n");
    assert!(diff.contains("+++ b/assets/fonts/mono.txt\n"));
}

#[test]
fn skipped_patch_leaves_tree_alone() {
    let app = App::new();
    app.write(WEB, WEB_UNIT);
    let defs = TempDir::new().unwrap();
    let registry = load_registry(&[write_manifest(&defs)]).unwrap();

    let cfg = ApplyConfig {
        skip: vec!["web-debug".into()],
        ..Default::default()
    };
    let mut sink = Vec::new();
    let summary = pass::run(&registry, app.root(), &mut sink, &cfg).unwrap();
    assert_eq!(summary.skipped, ["web-debug"]);
    assert_eq!(app.read(WEB), WEB_UNIT);
}

#[test]
fn manifest_round_trips_through_json() {
    let parsed: Manifest = serde_json::from_value(manifest()).unwrap();
    let again = Manifest::parse(&serde_json::to_string(&parsed).unwrap()).unwrap();
    assert_eq!(again.patches.len(), 2);
    assert_eq!(again.patches[0].name, "web-debug");
}
