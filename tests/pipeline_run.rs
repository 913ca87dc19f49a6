mod common;

use common::{boxed, CountingPrompter, FakeBackend, FakeInstaller};
use rtf2md::{
    config::Config,
    engine::build_backends,
    install::FixedAnswer,
    pipeline::Pipeline,
    probe::{resolve, Availability},
    report::FailureStage,
};
use std::fs;
use std::path::Path;
use std::rc::Rc;

fn pipeline_with(cfg: &Config, backends: Vec<FakeBackend>, answer: bool) -> Pipeline {
    let mut prompter = CountingPrompter::answering(answer);
    let res = resolve(boxed(backends), &mut prompter, &FakeInstaller::failing());
    Pipeline::new(cfg, res).expect("pipeline")
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), "{\\rtf1 placeholder}").unwrap();
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn one_artifact_per_successful_backend() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    touch(input.path(), "a.rtf");
    touch(input.path(), "b.rtf");
    touch(input.path(), "notes.txt");

    let high = FakeBackend::high(true).failing_on("b");
    let fallback = FakeBackend::fallback();
    let (high_probes, high_converts) = (Rc::clone(&high.probes), Rc::clone(&high.converts));
    let fallback_converts = Rc::clone(&fallback.converts);

    let cfg = Config::default();
    let pipeline = pipeline_with(&cfg, vec![high, fallback], false);
    let report = pipeline.run(input.path(), out.path()).unwrap();

    assert_eq!(
        listing(out.path()),
        vec!["a_pandoc.md", "a_striprtf.md", "b_striprtf.md"]
    );
    assert_eq!(report.files_found, 2);
    assert_eq!(report.files_converted, 2);
    assert_eq!(report.artifacts_created, 3);

    assert_eq!(high_probes.get(), 1);
    assert_eq!(high_converts.get(), 2);
    assert_eq!(fallback_converts.get(), 2);

    let b = &report.files[1];
    assert_eq!(b.failures.len(), 1);
    assert_eq!(b.failures[0].backend, "pandoc");
    assert_eq!(b.failures[0].stage, FailureStage::Convert);
}

#[test]
fn artifact_carries_header_and_normalized_body() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    touch(input.path(), "letter.rtf");

    let cfg = Config::default();
    let pipeline = pipeline_with(&cfg, vec![FakeBackend::high(true)], false);
    pipeline.run(input.path(), out.path()).unwrap();

    let text = fs::read_to_string(out.path().join("letter_pandoc.md")).unwrap();
    assert!(text.starts_with("**File Type:** RTF\n**Converted on:** "));
    assert!(text.contains("\n**Converter:** fake high fidelity\n\n---\n\n"));
    assert!(text.ends_with("---\n\npandoc text for letter\n\nend\n"));
}

#[test]
fn fallback_only_never_claims_high_fidelity() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    for name in ["one.rtf", "two.rtf", "three.rtf"] {
        touch(input.path(), name);
    }

    let cfg = Config::default();
    let pipeline = pipeline_with(
        &cfg,
        vec![FakeBackend::high(false), FakeBackend::fallback()],
        false,
    );
    assert_eq!(pipeline.availability(), Availability::DegradedReady);

    let report = pipeline.run(input.path(), out.path()).unwrap();
    assert_eq!(report.artifacts_created, 3);
    for name in listing(out.path()) {
        assert!(name.ends_with("_striprtf.md"), "{name}");
    }
    assert!(report
        .files
        .iter()
        .flat_map(|f| &f.artifacts)
        .all(|a| a.backend == "striprtf"));
}

#[test]
fn empty_input_creates_output_dir_and_reports_zero() {
    let input = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("nested").join("markdown_output");

    let cfg = Config::default();
    let pipeline = pipeline_with(&cfg, vec![FakeBackend::fallback()], false);
    let report = pipeline.run(input.path(), &out).unwrap();

    assert!(out.is_dir());
    assert_eq!(report.files_found, 0);
    assert_eq!(report.files_converted, 0);
    assert_eq!(report.artifacts_created, 0);
}

#[test]
fn missing_input_dir_is_not_fatal() {
    let root = tempfile::tempdir().unwrap();
    let cfg = Config::default();
    let pipeline = pipeline_with(&cfg, vec![FakeBackend::fallback()], false);

    let report = pipeline
        .run(&root.path().join("does-not-exist"), &root.path().join("out"))
        .unwrap();
    assert_eq!(report.files_found, 0);
}

#[test]
fn vanished_input_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let cfg = Config::default();
    let pipeline = pipeline_with(&cfg, vec![FakeBackend::fallback()], false);

    let file = pipeline.convert_file(&root.path().join("gone.rtf"), root.path());
    assert!(!file.converted());
    assert_eq!(file.failures[0].stage, FailureStage::Missing);
}

#[test]
fn write_failures_are_recorded_per_artifact() {
    let input = tempfile::tempdir().unwrap();
    touch(input.path(), "a.rtf");
    let blocker = input.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();

    let cfg = Config::default();
    let pipeline = pipeline_with(
        &cfg,
        vec![FakeBackend::high(true), FakeBackend::fallback()],
        false,
    );
    let report = pipeline.run(input.path(), &blocker).unwrap();

    assert_eq!(report.files_converted, 0);
    let stages: Vec<_> = report.files[0].failures.iter().map(|f| f.stage).collect();
    assert_eq!(stages, vec![FailureStage::Write, FailureStage::Write]);
}

#[test]
fn discovery_is_case_insensitive_and_sorted() {
    let input = tempfile::tempdir().unwrap();
    touch(input.path(), "c.rtf");
    touch(input.path(), "a.RTF");
    touch(input.path(), "b.rtf");
    touch(input.path(), "d.rtfx");

    let cfg = Config::default();
    let pipeline = pipeline_with(&cfg, vec![FakeBackend::fallback()], false);
    let names: Vec<String> = pipeline
        .discover(input.path())
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.RTF", "b.rtf", "c.rtf"]);
}

#[test]
fn report_json_is_written_when_enabled() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    touch(input.path(), "a.rtf");

    let mut cfg = Config::default();
    cfg.output.write_report_json = true;
    let pipeline = pipeline_with(&cfg, vec![FakeBackend::fallback()], false);
    pipeline.run(input.path(), out.path()).unwrap();

    let raw = fs::read_to_string(out.path().join("conversion-report.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["artifacts_created"], 1);
    assert_eq!(json["availability"], "DegradedReady");
}

#[test]
fn builtin_fallback_converts_real_rtf() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fs::write(
        input.path().join("memo.rtf"),
        "{\\rtf1\\ansi{\\fonttbl\\f0\\fswiss Helvetica;}\\f0\\pard\n\
         Quarterly memo\\par\\par\\par\\par\n\
         Revenue up \\'93a lot\\'94.\\par\n}",
    )
    .unwrap();

    let mut cfg = Config::default();
    cfg.pandoc.enabled = false;
    let res = resolve(
        build_backends(&cfg),
        &mut FixedAnswer(false),
        &FakeInstaller::unused(),
    );
    let pipeline = Pipeline::new(&cfg, res).unwrap();
    let report = pipeline.run(input.path(), out.path()).unwrap();
    assert_eq!(report.artifacts_created, 1);

    let text = fs::read_to_string(out.path().join("memo_striprtf.md")).unwrap();
    assert!(text.contains("**Converter:** striprtf (tables not preserved)"));
    assert!(text.ends_with("---\n\nQuarterly memo\n\nRevenue up \u{201C}a lot\u{201D}.\n"));
}
