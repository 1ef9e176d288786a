use blurpad::cli::{Action, CliArgs, run};
use clap::Parser;
use std::process::ExitCode;

#[test]
fn headless_run_writes_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.cfg");
    std::fs::write(&config, "kernel_size=5\nkernel_sigma=1.5\n").unwrap();
    let out = dir.path().join("out.png");

    let args = CliArgs::try_parse_from([
        "blurpad",
        "--config",
        config.to_str().unwrap(),
        "--width",
        "24",
        "--height",
        "24",
        "-o",
        out.to_str().unwrap(),
        "color #FFFFFF",
        "size 6",
        "stroke 4,12 20,12",
        "blur 12,12",
        "undo",
    ])
    .unwrap();
    assert_eq!(run(args), ExitCode::SUCCESS);

    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (24, 24));
    // The blur was undone, so the stroke core is still solid white.
    assert_eq!(img.get_pixel(12, 12).0, [255, 255, 255, 255]);
}

#[test]
fn input_image_sets_canvas_size() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    image::RgbaImage::from_pixel(10, 7, image::Rgba([16, 245, 73, 255]))
        .save(&input)
        .unwrap();
    let out = dir.path().join("copy.png");
    let config = dir.path().join("empty.cfg");
    std::fs::write(&config, "").unwrap();

    let args = CliArgs::try_parse_from([
        "blurpad",
        "-c",
        config.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(run(args), ExitCode::SUCCESS);
    let img = image::open(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (10, 7));
    assert_eq!(img.get_pixel(9, 6).0, [16, 245, 73, 255]);
}

#[test]
fn bad_override_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("empty.cfg");
    std::fs::write(&config, "").unwrap();
    let args = CliArgs::try_parse_from([
        "blurpad",
        "-c",
        config.to_str().unwrap(),
        "--set",
        "kernel_size=4",
        "-o",
        dir.path().join("x.png").to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(run(args), ExitCode::FAILURE);
    assert!(!dir.path().join("x.png").exists());
}

#[test]
fn action_text_parses() {
    assert_eq!("resize 3 2".parse::<Action>(), Ok(Action::Resize(3, 2)));
    assert!("stroke".parse::<Action>().is_err());
}
