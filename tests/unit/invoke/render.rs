use super::*;
use crate::foundation::core::{FrameIndex, Resolution, Viewport};

fn job(output: PathBuf) -> FrameJob {
    FrameJob {
        index: FrameIndex(3),
        viewport: Viewport::new(-0.7436438870000001, -0.743643886999999, 0.125, 0.25).unwrap(),
        resolution: Resolution {
            width: 64,
            height: 36,
        },
        iterations: 2048,
        output,
    }
}

#[test]
fn job_args_are_positional_and_round_trip() {
    let j = job(PathBuf::from("snaps/fractal_0003.png"));
    let args = ProcessRenderer::job_args(&j);
    assert_eq!(args.len(), 8);
    assert_eq!(args[0].parse::<f64>().unwrap(), j.viewport.x.min);
    assert_eq!(args[1].parse::<f64>().unwrap(), j.viewport.x.max);
    assert_eq!(&args[2..], &["0.125", "0.25", "2048", "64", "36", "snaps/fractal_0003.png"]);
}

#[test]
fn closures_are_render_invokers() {
    let ok = |_: &FrameJob| -> Result<(), RenderError> { Ok(()) };
    assert!(ok.render(&job(PathBuf::from("x.png"))).is_ok());
}

#[test]
fn spawn_failure_is_reported() {
    let renderer = ProcessRenderer::new("/definitely/not/a/renderer");
    let err = renderer.render(&job(PathBuf::from("x.png"))).unwrap_err();
    assert!(matches!(err, RenderError::Spawn { .. }), "{err}");
}

#[test]
fn exit_error_display_includes_status() {
    let err = RenderError::Exit {
        code: Some(3),
        stderr: "bad domain".to_string(),
    };
    assert_eq!(err.to_string(), "renderer exited with status 3: bad domain");
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::PermissionsExt as _;

    fn script(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn successful_render_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        // Output path is the 8th positional argument.
        let exe = script(dir.path(), "ok.sh", r#"printf 'img' > "$8""#);
        let out = dir.path().join("frame_0003.png");
        ProcessRenderer::new(&exe).render(&job(out.clone())).unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "img");
    }

    #[test]
    fn leading_args_shift_positionals() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(
            dir.path(),
            "lead.sh",
            r#"[ "$1" = "--mode" ] || exit 9; printf '%s' "$6" > "${10}""#,
        );
        let out = dir.path().join("frame.png");
        ProcessRenderer::new(&exe)
            .with_leading_args(["--mode", "mandel"])
            .render(&job(out.clone()))
            .unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "2048");
    }

    #[test]
    fn non_zero_exit_captures_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "fail.sh", "echo 'out of range' >&2; exit 4");
        let err = ProcessRenderer::new(&exe)
            .render(&job(dir.path().join("f.png")))
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::Exit {
                code: Some(4),
                stderr: "out of range".to_string()
            }
        );
    }

    #[test]
    fn success_without_output_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "lazy.sh", "exit 0");
        let err = ProcessRenderer::new(&exe)
            .render(&job(dir.path().join("f.png")))
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingOutput { .. }));
    }

    #[test]
    fn slow_renderer_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "slow.sh", "exec sleep 5");
        let started = Instant::now();
        let err = ProcessRenderer::new(&exe)
            .with_timeout(Some(Duration::from_millis(200)))
            .render(&job(dir.path().join("f.png")))
            .unwrap_err();
        assert!(matches!(err, RenderError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
