use super::*;

#[test]
fn file_names_are_zero_padded() {
    let naming = FrameNaming::default();
    assert_eq!(naming.file_name(FrameIndex(0)), "fractal_0000.png");
    assert_eq!(naming.file_name(FrameIndex(42)), "fractal_0042.png");
    assert_eq!(
        naming.path_for(FrameIndex(899)),
        PathBuf::from("snaps").join("fractal_0899.png")
    );
}

#[test]
fn lexicographic_order_matches_index_order() {
    let naming = FrameNaming::default();
    let names: Vec<String> = [0u64, 1, 9, 10, 99, 100, 999, 1000, 9999]
        .into_iter()
        .map(|i| naming.file_name(FrameIndex(i)))
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn pad_width_must_cover_last_index() {
    let naming = FrameNaming {
        pad_width: 3,
        ..FrameNaming::default()
    };
    assert!(naming.validate(1000).is_ok());
    assert!(naming.validate(1001).is_err());
}

#[test]
fn prefix_and_extension_are_plain() {
    let bad_prefix = FrameNaming {
        prefix: "a/b".to_string(),
        ..FrameNaming::default()
    };
    assert!(bad_prefix.validate(10).is_err());

    let bad_ext = FrameNaming {
        extension: ".png".to_string(),
        ..FrameNaming::default()
    };
    assert!(bad_ext.validate(10).is_err());
}

#[test]
fn glob_pattern_selects_the_layout() {
    let naming = FrameNaming {
        dir: PathBuf::from("out/frames"),
        prefix: "zoom".to_string(),
        extension: "png".to_string(),
        pad_width: 5,
    };
    assert_eq!(
        naming.glob_pattern(),
        PathBuf::from("out/frames").join("zoom_*.png")
    );
}

#[test]
fn digits_counts_decimal_width() {
    assert_eq!(digits(0), 1);
    assert_eq!(digits(9), 1);
    assert_eq!(digits(10), 2);
    assert_eq!(digits(1199), 4);
}
