//! 整合測試 - 以假的外部工具驗證整批轉檔流程
//!
//! 假工具會記錄每次呼叫，渲染時寫出來源路徑，編碼時在輸入內容後附加工具名稱

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chiptune_convert::component::chiptune_converter::{
    BatchReport, ChiptuneConverter, ConversionError, Stage, TaskStatus, ToolInvocation,
    ToolRunner,
};
use chiptune_convert::config::{Config, ConversionRequest, TargetFormat, UserSettings};
use tempfile::TempDir;

#[derive(Default)]
struct FakeTools {
    calls: Mutex<Vec<ToolInvocation>>,
    /// 渲染時會失敗的來源檔名
    broken_sources: HashSet<String>,
}

impl FakeTools {
    fn with_broken(names: &[&str]) -> Self {
        Self {
            broken_sources: names.iter().map(|n| (*n).to_string()).collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, stage: Stage) -> usize {
        self.calls().iter().filter(|c| c.stage == stage).count()
    }
}

impl ToolRunner for FakeTools {
    fn run(&self, invocation: &ToolInvocation, working_dir: &Path) -> Result<(), ConversionError> {
        self.calls.lock().unwrap().push(invocation.clone());
        assert!(invocation.output.starts_with(working_dir));

        let content = match invocation.stage {
            Stage::Render => {
                let name = invocation
                    .input
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .to_string();
                if self.broken_sources.contains(&name) {
                    return Err(ConversionError::ExternalToolFailure {
                        stage: invocation.stage,
                        program: invocation.program.clone(),
                        detail: "結束狀態 1".to_string(),
                    });
                }
                format!("rendered:{}", invocation.input.display())
            }
            _ => {
                let pcm = fs::read_to_string(&invocation.input).unwrap();
                format!("{pcm}|{}", invocation.program)
            }
        };

        fs::write(&invocation.output, content).unwrap();
        Ok(())
    }
}

struct Batch {
    music: TempDir,
    scratch: TempDir,
}

impl Batch {
    fn new() -> Self {
        Self {
            music: TempDir::new().unwrap(),
            scratch: TempDir::new().unwrap(),
        }
    }

    fn file(&self, relative: &str) -> PathBuf {
        let path = self.music.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"chiptune").unwrap();
        path
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.music.path().join(relative)
    }

    fn run(&self, request: ConversionRequest, sources: &[PathBuf], tools: &FakeTools) -> BatchReport {
        let settings = UserSettings {
            scratch_directory: Some(self.scratch.path().to_path_buf()),
            ..UserSettings::default()
        };
        let config = Config::with_settings(settings).unwrap();
        let converter =
            ChiptuneConverter::new(config, request, Arc::new(AtomicBool::new(false)));
        converter.run_with_runner(sources, tools).unwrap()
    }

    fn scratch_is_empty(&self) -> bool {
        fs::read_dir(self.scratch.path()).unwrap().next().is_none()
    }
}

fn request(formats: &[TargetFormat]) -> ConversionRequest {
    let mut request = ConversionRequest::from_settings(&UserSettings::default());
    request.formats = formats.iter().copied().collect();
    request
}

#[test]
fn test_single_sid_to_ogg() {
    let batch = Batch::new();
    let source = batch.file("tune.sid");
    let tools = FakeTools::default();

    let report = batch.run(request(&[TargetFormat::Ogg]), &[source], &tools);

    assert_eq!(report.count(TaskStatus::Completed), 1);
    let calls = tools.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].stage, Stage::Render);
    assert_eq!(calls[0].output.file_name().unwrap(), "tune.wav");
    assert!(calls[0].output.starts_with(report.workspace.as_ref().unwrap()));
    assert_eq!(calls[1].stage, Stage::Encode(TargetFormat::Ogg));
    assert!(calls[1].args.iter().any(|a| a == "8"));

    assert!(batch.path("tune.ogg").is_file());
    assert!(!batch.path("tune.wav").exists());
    assert!(!report.workspace.unwrap().exists());
    assert!(batch.scratch_is_empty());
}

#[test]
fn test_two_sources_in_parallel_do_not_mix() {
    let batch = Batch::new();
    let a = batch.file("a.sid");
    let b = batch.file("b.sap");
    let tools = FakeTools::default();
    let mut request = request(&[TargetFormat::Wav, TargetFormat::Flac]);
    request.parallel = 2;

    let report = batch.run(request, &[a, b], &tools);

    assert_eq!(report.count(TaskStatus::Completed), 2);
    for name in ["a", "b"] {
        let wav = fs::read_to_string(batch.path(&format!("{name}.wav"))).unwrap();
        let flac = fs::read_to_string(batch.path(&format!("{name}.flac"))).unwrap();
        let ext = if name == "a" { "sid" } else { "sap" };
        assert!(wav.ends_with(&format!("{name}.{ext}")), "{wav}");
        assert!(flac.starts_with(&wav), "{flac}");
        assert!(flac.ends_with("|flac"));
    }
    assert_eq!(tools.count(Stage::Render), 2);
    assert_eq!(tools.count(Stage::Encode(TargetFormat::Flac)), 2);
    assert!(batch.scratch_is_empty());
}

#[test]
fn test_directory_with_unrelated_file() {
    let batch = Batch::new();
    batch.file("one.sid");
    batch.file("two.sid");
    batch.file("three.sid");
    batch.file("notes.txt");
    batch.file("sub/deep.sid");
    let tools = FakeTools::default();

    let report = batch.run(
        request(&[TargetFormat::Ogg]),
        &[batch.music.path().to_path_buf()],
        &tools,
    );

    assert_eq!(report.outcomes.len(), 3);
    let names: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| o.source.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["one.sid", "three.sid", "two.sid"]);
    assert!(!batch.path("notes.ogg").exists());
    assert!(!batch.path("sub/deep.ogg").exists());
}

#[test]
fn test_recursive_directory_walk() {
    let batch = Batch::new();
    batch.file("top.sid");
    batch.file("sub/deep.sid");
    let tools = FakeTools::default();
    let mut request = request(&[TargetFormat::Ogg]);
    request.recursive = true;

    let report = batch.run(request, &[batch.music.path().to_path_buf()], &tools);

    assert_eq!(report.count(TaskStatus::Completed), 2);
    assert!(batch.path("sub/deep.ogg").is_file());
    assert!(batch.path("top.ogg").is_file());
}

#[test]
fn test_rerun_on_complete_outputs_invokes_nothing() {
    let batch = Batch::new();
    let source = batch.file("tune.sid");

    let first = FakeTools::default();
    batch.run(
        request(&[TargetFormat::Ogg, TargetFormat::Flac]),
        &[source.clone()],
        &first,
    );
    assert_eq!(first.calls().len(), 3);

    let second = FakeTools::default();
    let report = batch.run(
        request(&[TargetFormat::Ogg, TargetFormat::Flac]),
        &[source],
        &second,
    );

    assert!(second.calls().is_empty());
    assert_eq!(report.count(TaskStatus::UpToDate), 1);
}

#[test]
fn test_overwrite_always_encodes() {
    let batch = Batch::new();
    let source = batch.file("tune.sid");
    fs::write(batch.path("tune.ogg"), "old").unwrap();
    fs::write(batch.path("tune.flac"), "old").unwrap();
    let tools = FakeTools::default();
    let mut request = request(&[TargetFormat::Ogg, TargetFormat::Flac]);
    request.overwrite = true;

    let report = batch.run(request, &[source], &tools);

    assert_eq!(report.count(TaskStatus::Completed), 1);
    assert_eq!(tools.count(Stage::Encode(TargetFormat::Ogg)), 1);
    assert_eq!(tools.count(Stage::Encode(TargetFormat::Flac)), 1);
    assert_ne!(fs::read_to_string(batch.path("tune.ogg")).unwrap(), "old");
}

#[test]
fn test_existing_wav_prevents_rendering() {
    let batch = Batch::new();
    let source = batch.file("tune.sid");
    fs::write(batch.path("tune.wav"), "kept-pcm").unwrap();
    let tools = FakeTools::default();

    let report = batch.run(
        request(&[TargetFormat::Wav, TargetFormat::Ogg, TargetFormat::Flac]),
        &[source],
        &tools,
    );

    assert_eq!(report.count(TaskStatus::Completed), 1);
    assert_eq!(tools.count(Stage::Render), 0);
    assert_eq!(
        fs::read_to_string(batch.path("tune.ogg")).unwrap(),
        "kept-pcm|oggenc"
    );
    assert_eq!(fs::read_to_string(batch.path("tune.wav")).unwrap(), "kept-pcm");
}

#[test]
fn test_failure_is_isolated_and_reported() {
    let batch = Batch::new();
    let a = batch.file("a.sid");
    let b = batch.file("b.sid");
    let tools = FakeTools::with_broken(&["a.sid"]);
    let mut request = request(&[TargetFormat::Ogg]);
    request.parallel = 2;

    let report = batch.run(request, &[a, b], &tools);

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].status, TaskStatus::Failed);
    assert_eq!(report.outcomes[1].status, TaskStatus::Completed);
    let failure = report.outcomes[0].failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Render);
    assert_eq!(report.failures().count(), 1);
    assert!(batch.path("b.ogg").is_file());
    assert!(!batch.path("a.ogg").exists());
    assert!(!report.workspace.unwrap().exists());
}

#[test]
fn test_same_base_name_in_different_directories() {
    let batch = Batch::new();
    let first = batch.file("left/tune.sid");
    let second = batch.file("right/tune.sid");
    let tools = FakeTools::default();
    let mut request = request(&[TargetFormat::Wav]);
    request.parallel = 2;

    let report = batch.run(request, &[first, second], &tools);

    assert_eq!(report.count(TaskStatus::Completed), 2);
    let left = fs::read_to_string(batch.path("left/tune.wav")).unwrap();
    let right = fs::read_to_string(batch.path("right/tune.wav")).unwrap();
    assert!(left.ends_with("left/tune.sid"), "{left}");
    assert!(right.ends_with("right/tune.sid"), "{right}");
}

#[test]
fn test_missing_source_is_skipped() {
    let batch = Batch::new();
    let present = batch.file("tune.sid");
    let missing = batch.path("gone.sid");
    let tools = FakeTools::default();

    let report = batch.run(request(&[TargetFormat::Ogg]), &[missing.clone(), present], &tools);

    assert_eq!(report.missing_sources, vec![missing]);
    assert_eq!(report.count(TaskStatus::Completed), 1);
}

#[test]
fn test_destination_override() {
    let batch = Batch::new();
    let source = batch.file("tune.sap");
    let out = batch.scratch.path().join("published");
    let tools = FakeTools::default();
    let mut request = request(&[TargetFormat::Ogg]);
    request.destination = Some(out.clone());

    let report = batch.run(request, &[source], &tools);

    assert_eq!(report.count(TaskStatus::Completed), 1);
    assert!(out.join("tune.ogg").is_file());
    assert!(!batch.path("tune.ogg").exists());
}

#[test]
fn test_nothing_to_convert_needs_no_workspace() {
    let batch = Batch::new();
    batch.file("readme.txt");
    let tools = FakeTools::default();

    let report = batch.run(
        request(&[TargetFormat::Ogg]),
        &[batch.music.path().to_path_buf()],
        &tools,
    );

    assert!(report.outcomes.is_empty());
    assert!(report.workspace.is_none());
    assert!(batch.scratch_is_empty());
}
