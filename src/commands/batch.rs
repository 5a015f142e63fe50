//! # batch 命令实现
//!
//! 原位序列批量处理。
//!
//! ## 流程
//! 1. 收集并排序匹配的帧
//! 2. （可选）在参考帧上确定背底锚点：`--anchors` 给定或交互式选点
//! 3. 并行积分每一帧，按需导出一维曲线（`<stem>.txt` 与图）、二维图像、扣背底结果
//! 4. 按文件顺序组装矩阵，写出 `1D/output.txt` 与 `1D/output_subBk.txt`
//!
//! 参考帧阶段失败时给出警告并在无背底的情况下继续；逐帧阶段首个错误即中止。
//!
//! ## 依赖关系
//! - 使用 `cli/batch.rs` 定义的参数
//! - 使用 `batch/`, `waxs/background.rs`, `waxs/session.rs`, `waxs/export.rs`
//! - 复用 `commands/integrate.rs` 与 `commands/render.rs` 的单帧流程

use super::integrate::integrate_frame;
use super::render::{write_image, ImageRequest};
use super::{colormap, load_settings, normalization, profile_selection};
use crate::batch::{BatchRunner, CancelToken, FileCollector};
use crate::cli::batch::BatchArgs;
use crate::error::{Result, WaxsError};
use crate::models::{Profile, ProfileMatrix};
use crate::parsers;
use crate::settings::SessionSettings;
use crate::utils::output;
use crate::waxs::background::{self, BackgroundPoints, BaselineTemplate};
use crate::waxs::export::{matrix_to_txt, profile_to_txt};
use crate::waxs::plot::{self, PlotOptions};
use crate::waxs::{BackgroundSession, CommandOutcome, Normalization, ProfileSelection, SessionCommand};

use console::{style, Term};
use std::fs;
use std::path::{Path, PathBuf};

/// 原始积分矩阵文件名
pub const RAW_MATRIX_FILE: &str = "output.txt";
/// 扣背底矩阵文件名
pub const SUBTRACTED_MATRIX_FILE: &str = "output_subBk.txt";

/// 单帧处理所需的只读上下文
struct FrameContext<'a> {
    settings: &'a SessionSettings,
    selection: ProfileSelection,
    normalization: Normalization,
    template: Option<&'a BaselineTemplate>,
    curve_dir: Option<&'a Path>,
    image_dir: Option<&'a Path>,
    image_request: &'a ImageRequest,
    plot_options: &'a PlotOptions,
}

/// 参考帧阶段的只读上下文
struct ReferenceContext<'a> {
    settings: &'a SessionSettings,
    selection: ProfileSelection,
    normalization: Normalization,
    curve_dir: &'a Path,
    plot_options: &'a PlotOptions,
}

/// 单帧处理结果
struct FrameOutput {
    profile: Profile,
    corrected: Option<Vec<f64>>,
}

/// 执行 batch 命令
pub fn execute(args: BatchArgs, settings_path: &Path) -> Result<()> {
    output::print_header("In-situ Batch Processing");

    let settings = load_settings(settings_path, &args.overrides)?;

    if !args.curves && !args.images && !args.background {
        output::print_warning("Nothing to export: pass --curves, --images and/or --background");
        return Ok(());
    }
    if args.background && args.anchors.is_none() && !args.interactive {
        return Err(WaxsError::Validation(
            "--background needs --anchors or --interactive".to_string(),
        ));
    }

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive)
        .collect()?;
    output::print_info(&format!("Found {} frames", files.len()));

    let out_dir = output_root(&args);
    let curve_dir = out_dir.join("1D");
    let image_dir = out_dir.join("image");
    if args.curves || args.background {
        create_dir(&curve_dir)?;
    }
    if args.images {
        create_dir(&image_dir)?;
    }

    let selection = profile_selection(args.profile, args.raw);
    let normalization = normalization(args.normalization);
    let plot_options = PlotOptions {
        log_y: args.log_y,
        ..Default::default()
    };

    let template = if args.background {
        let reference = ReferenceContext {
            settings: &settings,
            selection,
            normalization,
            curve_dir: &curve_dir,
            plot_options: &plot_options,
        };
        match choose_template(&args, &files, &reference) {
            Ok(template) => {
                output::print_success(&format!(
                    "Background anchors: {}",
                    format_anchors(&template.anchor_x)
                ));
                Some(template)
            }
            Err(WaxsError::Cancelled) => {
                output::print_warning("Background selection cancelled, batch aborted");
                return Ok(());
            }
            Err(e) => {
                output::print_warning(&format!(
                    "Background selection failed ({}), continuing without background",
                    e
                ));
                None
            }
        }
    } else {
        None
    };

    let image_request = ImageRequest {
        mode: args.image_mode,
        colormap: colormap(args.colormap),
        flip: false,
        limits: settings.axis_limits(),
        options: PlotOptions {
            width: 1200,
            height: 1000,
            log_y: false,
        },
    };
    let context = FrameContext {
        settings: &settings,
        selection,
        normalization,
        template: template.as_ref(),
        curve_dir: args.curves.then_some(curve_dir.as_path()),
        image_dir: args.images.then_some(image_dir.as_path()),
        image_request: &image_request,
        plot_options: &plot_options,
    };

    let cancel = CancelToken::new();
    let runner = BatchRunner::new(args.jobs)
        .with_cancel_token(cancel.clone())
        .with_progress(Term::stderr().is_term());
    output::print_info(&format!("Processing with {} job(s)", runner.jobs()));
    let results = runner
        .run(&files, |_, path| process_frame(path, &context))
        .map_err(|e| {
            if cancel.is_cancelled() && files.len() > 1 {
                output::print_warning("Batch aborted, remaining frames skipped");
            }
            output::print_warning("Frames already written stay on disk");
            e
        })?;

    let (raw_matrix, subtracted_matrix) = assemble(&results)?;
    if args.curves {
        let path = curve_dir.join(RAW_MATRIX_FILE);
        matrix_to_txt(&raw_matrix, &path)?;
        output::print_written("profile matrix", &path);
    }
    if let Some(matrix) = subtracted_matrix {
        let path = curve_dir.join(SUBTRACTED_MATRIX_FILE);
        matrix_to_txt(&matrix, &path)?;
        output::print_written("background-subtracted matrix", &path);
    }

    output::print_done(&format!(
        "Processed {} frame(s) into '{}'",
        results.len(),
        out_dir.display()
    ));
    Ok(())
}

fn output_root(args: &BatchArgs) -> PathBuf {
    match &args.output {
        Some(dir) => dir.clone(),
        None if args.input.is_file() => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        None => args.input.clone(),
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| WaxsError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame")
}

fn format_anchors(anchor_x: &[f64]) -> String {
    anchor_x
        .iter()
        .map(|x| format!("{:.4}", x))
        .collect::<Vec<_>>()
        .join(", ")
}

// ─────────────────────────────────────────────────────────────
// 逐帧处理
// ─────────────────────────────────────────────────────────────

fn process_frame(path: &Path, ctx: &FrameContext) -> Result<FrameOutput> {
    let frame = parsers::load_frame(path)?;
    let integration = integrate_frame(&frame, ctx.settings, ctx.normalization)?;
    let profile = integration.profile(ctx.selection)?;
    let corrected = ctx
        .template
        .map(|t| t.apply(&profile.x, &profile.y))
        .transpose()?;

    let stem = file_stem(path);
    if let Some(dir) = ctx.image_dir {
        write_image(
            &frame,
            ctx.settings,
            ctx.image_request,
            &dir.join(format!("{}.jpg", stem)),
        )?;
    }
    if let Some(dir) = ctx.curve_dir {
        profile_to_txt(&profile, &dir.join(format!("{}.txt", stem)))?;
        plot::plot_profile(&profile, &dir.join(format!("{}.jpg", stem)), ctx.plot_options)?;
    }

    log::debug!("{}: {} points", path.display(), profile.len());
    Ok(FrameOutput { profile, corrected })
}

/// 按文件顺序组装原始矩阵与扣背底矩阵
fn assemble(results: &[FrameOutput]) -> Result<(ProfileMatrix, Option<ProfileMatrix>)> {
    let Some(first) = results.first() else {
        return Err(WaxsError::Computation("no frame was processed".to_string()));
    };

    let mut raw = ProfileMatrix::new(first.profile.x.clone());
    let mut subtracted = first
        .corrected
        .as_ref()
        .map(|_| ProfileMatrix::new(first.profile.x.clone()));

    for result in results {
        if result.profile.x.len() != raw.x.len() {
            return Err(WaxsError::Computation(format!(
                "frame profile has {} points, expected {}",
                result.profile.x.len(),
                raw.x.len()
            )));
        }
        raw.push_column(result.profile.y.clone())?;
        if let (Some(matrix), Some(y)) = (subtracted.as_mut(), result.corrected.as_ref()) {
            matrix.push_column(y.clone())?;
        }
    }
    Ok((raw, subtracted))
}

// ─────────────────────────────────────────────────────────────
// 参考帧背底选择
// ─────────────────────────────────────────────────────────────

fn choose_template(
    args: &BatchArgs,
    files: &[PathBuf],
    ctx: &ReferenceContext,
) -> Result<BaselineTemplate> {
    let index = args.reference;
    if index == 0 || index > files.len() {
        return Err(WaxsError::InvalidRange(format!(
            "reference frame {} is outside 1..={}",
            index,
            files.len()
        )));
    }
    let path = &files[index - 1];
    output::print_info(&format!("Reference frame: {}", path.display()));

    let frame = parsers::load_frame(path)?;
    let profile =
        integrate_frame(&frame, ctx.settings, ctx.normalization)?.profile(ctx.selection)?;
    let window = args.window.map(|w| w.as_tuple());
    let preview = ctx.curve_dir.join("background.jpg");

    let template = if args.interactive {
        interactive_template(&profile, window, args.remove_threshold, &preview, ctx.plot_options)?
    } else if let Some(anchors) = &args.anchors {
        anchor_template(&profile, &anchors.0, window)?
    } else {
        return Err(WaxsError::Validation(
            "no background anchors were given".to_string(),
        ));
    };

    let corrected = template.apply(&profile.x, &profile.y)?;
    write_preview(&profile, &template, &corrected, &preview, ctx.plot_options);
    Ok(template)
}

/// 由给定 x 位置构造模板，锚点 y 取窗口内最近样本
fn anchor_template(
    profile: &Profile,
    anchor_x: &[f64],
    window: Option<(f64, f64)>,
) -> Result<BaselineTemplate> {
    let (x, y) = background::crop(&profile.x, &profile.y, window)?;
    let points = BackgroundPoints::from_anchor_x(&x, &y, anchor_x)?;
    Ok(BaselineTemplate::from_points(&points))
}

/// 参考帧的原始曲线、背底与扣除结果，失败只警告
fn write_preview(
    profile: &Profile,
    template: &BaselineTemplate,
    corrected: &[f64],
    path: &Path,
    plot_options: &PlotOptions,
) {
    let result = BackgroundPoints::from_anchor_x(&profile.x, &profile.y, &template.anchor_x)
        .and_then(|points| background::fit(&profile.x, &profile.y, &points))
        .and_then(|baseline| {
            plot::plot_background(profile, &baseline, corrected, path, plot_options)
        });
    match result {
        Ok(()) => output::print_written("background preview", path),
        Err(e) => output::print_warning(&format!("Background preview not written: {}", e)),
    }
}

// ─────────────────────────────────────────────────────────────
// 交互式选点
// ─────────────────────────────────────────────────────────────

/// 终端输入命令
#[derive(Debug, Clone, PartialEq)]
enum PromptCommand {
    Session(SessionCommand),
    List,
    Preview,
    Help,
}

const PROMPT_HELP: &str = "a <x>  add anchor   r <x>  remove anchor   l  list   p  preview   c  commit   q  cancel";

fn parse_prompt(line: &str) -> std::result::Result<PromptCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(PromptCommand::Help);
    };
    let mut position = || -> std::result::Result<f64, String> {
        let raw = parts
            .next()
            .ok_or_else(|| format!("'{}' needs an x position", verb))?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid x position '{}'", raw))
    };

    match verb {
        "a" | "add" => Ok(PromptCommand::Session(SessionCommand::AddAnchor(position()?))),
        "r" | "remove" => Ok(PromptCommand::Session(SessionCommand::RemoveAnchor(position()?))),
        "c" | "commit" => Ok(PromptCommand::Session(SessionCommand::Commit)),
        "q" | "cancel" => Ok(PromptCommand::Session(SessionCommand::Cancel)),
        "l" | "list" => Ok(PromptCommand::List),
        "p" | "preview" => Ok(PromptCommand::Preview),
        "h" | "help" | "?" => Ok(PromptCommand::Help),
        other => Err(format!("unknown command '{}'", other)),
    }
}

fn interactive_template(
    profile: &Profile,
    window: Option<(f64, f64)>,
    remove_threshold: f64,
    preview: &Path,
    plot_options: &PlotOptions,
) -> Result<BaselineTemplate> {
    let term = Term::stdout();
    if !term.is_term() {
        return Err(WaxsError::Validation(
            "interactive background selection needs a terminal".to_string(),
        ));
    }
    let io_err = |e: std::io::Error| WaxsError::FileReadError {
        path: "<stdin>".to_string(),
        source: e,
    };

    let mut session = BackgroundSession::new(&profile.x, &profile.y, window)?
        .with_remove_threshold(remove_threshold);
    session.start()?;
    let (lo, hi) = (session.x()[0], session.x()[session.x().len() - 1]);
    term.write_line(&format!(
        "{} {} samples in [{:.4}, {:.4}]",
        style("Background selection:").bold(),
        session.x().len(),
        lo,
        hi
    ))
    .map_err(io_err)?;
    term.write_line(&style(PROMPT_HELP).dim().to_string())
        .map_err(io_err)?;

    loop {
        term.write_str(&format!("{} ", style(format!("[{}]>", session.state())).cyan()))
            .map_err(io_err)?;
        let line = term.read_line().map_err(io_err)?;

        let command = match parse_prompt(&line) {
            Ok(command) => command,
            Err(msg) => {
                output::print_warning(&msg);
                continue;
            }
        };

        match command {
            PromptCommand::Help => {
                term.write_line(PROMPT_HELP).map_err(io_err)?;
            }
            PromptCommand::List => {
                for (i, (x, y)) in session.anchors().iter().enumerate() {
                    term.write_line(&format!("  {:>2}  x = {:.4}  y = {:.4}", i + 1, x, y))
                        .map_err(io_err)?;
                }
            }
            PromptCommand::Preview => match (session.baseline(), session.corrected()) {
                (Some(baseline), Some(Ok(corrected))) => {
                    let full = Profile::new(
                        profile.axis,
                        profile.smoothed,
                        session.x().to_vec(),
                        session.y().to_vec(),
                    )?;
                    match plot::plot_background(&full, baseline, &corrected, preview, plot_options) {
                        Ok(()) => output::print_written("preview", preview),
                        Err(e) => output::print_warning(&e.to_string()),
                    }
                }
                _ => output::print_warning("No baseline yet: add anchors until at least three"),
            },
            PromptCommand::Session(cmd) => match session.apply(cmd) {
                Ok(CommandOutcome::Added((x, y))) => {
                    output::print_info(&format!("anchor added at ({:.4}, {:.4})", x, y));
                }
                Ok(CommandOutcome::Removed((x, y))) => {
                    output::print_info(&format!("anchor removed at ({:.4}, {:.4})", x, y));
                }
                Ok(CommandOutcome::Ignored(reason)) => output::print_warning(&reason),
                Ok(CommandOutcome::Committed) => {
                    return session.template().ok_or_else(|| {
                        WaxsError::Computation("committed session has no template".to_string())
                    });
                }
                Ok(CommandOutcome::Cancelled) => return Err(WaxsError::Cancelled),
                Err(e) => output::print_warning(&e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::NormalizationChoice;
    use crate::models::ProfileAxis;

    fn frame_output(y: Vec<f64>, corrected: Option<Vec<f64>>) -> FrameOutput {
        let x = (0..y.len()).map(|i| i as f64).collect();
        FrameOutput {
            profile: Profile::new(ProfileAxis::Q, true, x, y).unwrap(),
            corrected,
        }
    }

    #[test]
    fn test_assemble_keeps_file_order() {
        let results = vec![
            frame_output(vec![1.0, 2.0, 3.0], None),
            frame_output(vec![4.0, 5.0, 6.0], None),
            frame_output(vec![7.0, 8.0, 9.0], None),
        ];
        let (raw, subtracted) = assemble(&results).unwrap();
        assert!(subtracted.is_none());
        assert_eq!(raw.n_frames(), 3);
        assert_eq!(raw.row(1), vec![1.0, 2.0, 5.0, 8.0]);
        assert_eq!(raw.columns[2], vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_assemble_subtracted_columns() {
        let results = vec![
            frame_output(vec![1.0, 2.0], Some(vec![0.5, 0.5])),
            frame_output(vec![3.0, 4.0], Some(vec![1.5, 1.5])),
        ];
        let (_, subtracted) = assemble(&results).unwrap();
        let subtracted = subtracted.unwrap();
        assert_eq!(subtracted.n_frames(), 2);
        assert_eq!(subtracted.columns[1], vec![1.5, 1.5]);
    }

    #[test]
    fn test_assemble_rejects_mismatched_frames() {
        let results = vec![frame_output(vec![1.0, 2.0], None), frame_output(vec![1.0], None)];
        assert!(assemble(&results).is_err());
        assert!(assemble(&[]).is_err());
    }

    #[test]
    fn test_anchor_template_snaps_y_inside_window() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
        let profile = Profile::new(ProfileAxis::Pixel, false, x, y).unwrap();

        let template = anchor_template(&profile, &[2.0, 8.0, 14.0], Some((1.0, 15.0))).unwrap();
        assert_eq!(template.anchor_x, vec![2.0, 8.0, 14.0]);

        assert!(anchor_template(&profile, &[2.0, 8.0], None).is_err());
        assert!(anchor_template(&profile, &[2.0, 8.0, 14.0], Some((30.0, 40.0))).is_err());
    }

    #[test]
    fn test_parse_prompt() {
        assert_eq!(
            parse_prompt("a 1.25").unwrap(),
            PromptCommand::Session(SessionCommand::AddAnchor(1.25))
        );
        assert_eq!(
            parse_prompt("remove -3").unwrap(),
            PromptCommand::Session(SessionCommand::RemoveAnchor(-3.0))
        );
        assert_eq!(
            parse_prompt(" c ").unwrap(),
            PromptCommand::Session(SessionCommand::Commit)
        );
        assert_eq!(parse_prompt("").unwrap(), PromptCommand::Help);
        assert!(parse_prompt("a").is_err());
        assert!(parse_prompt("a x").is_err());
        assert!(parse_prompt("zoom").is_err());
    }

    fn batch_fixture(dir: &Path) -> (PathBuf, PathBuf) {
        let settings_path = dir.join("waxskit.json");
        let mut settings = SessionSettings::default();
        settings.set("x_Center", "16").unwrap();
        settings.set("y_Center", "16").unwrap();
        settings.set("outer_radius", "15").unwrap();
        settings.set("numbin", "10").unwrap();
        settings.save(&settings_path).unwrap();

        let frames = dir.join("frames");
        fs::create_dir_all(&frames).unwrap();
        for (i, level) in [100u16, 200, 300].iter().enumerate() {
            let img = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_pixel(
                32,
                32,
                image::Luma([*level]),
            );
            img.save(frames.join(format!("frame_{:02}.png", i))).unwrap();
        }
        (settings_path, frames)
    }

    fn batch_args(frames: &Path, out: PathBuf, normalization: NormalizationChoice) -> BatchArgs {
        use crate::cli::{ColormapChoice, ProfileKind, RenderMode};

        BatchArgs {
            input: frames.to_path_buf(),
            output: Some(out),
            pattern: "*.png".to_string(),
            recursive: false,
            curves: false,
            images: false,
            image_mode: RenderMode::Raw,
            colormap: ColormapChoice::Jet,
            background: false,
            reference: 1,
            anchors: None,
            interactive: false,
            remove_threshold: 20.0,
            window: None,
            profile: ProfileKind::Pixel,
            raw: true,
            normalization,
            log_y: false,
            jobs: 2,
            overrides: Default::default(),
        }
    }

    #[test]
    fn test_batch_writes_matrices_in_file_order() {
        use crate::utils::args::ListArg;

        let dir = tempfile::tempdir().unwrap();
        let (settings_path, frames) = batch_fixture(dir.path());

        let args = BatchArgs {
            background: true,
            anchors: Some(ListArg(vec![1.0, 5.0, 14.0])),
            ..batch_args(&frames, dir.path().join("out"), NormalizationChoice::PixelMean)
        };
        execute(args, &settings_path).unwrap();

        let matrix =
            parsers::parse_matrix_file(&dir.path().join("out/1D").join(SUBTRACTED_MATRIX_FILE))
                .unwrap();
        assert_eq!(matrix.n_frames(), 3);
        assert_eq!(matrix.n_rows(), 10);
        // 平坦帧扣除背底后接近 0
        for column in &matrix.columns {
            assert!(column.iter().all(|v| v.abs() < 1e-3));
        }
        assert!(!dir.path().join("out/1D").join(RAW_MATRIX_FILE).exists());
    }

    #[test]
    fn test_batch_normalization_reaches_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let (settings_path, frames) = batch_fixture(dir.path());

        let mut matrices = Vec::new();
        for (name, choice) in [
            ("mean", NormalizationChoice::PixelMean),
            ("width", NormalizationChoice::BinWidth),
        ] {
            let out = dir.path().join(name);
            let args = BatchArgs {
                curves: true,
                ..batch_args(&frames, out.clone(), choice)
            };
            execute(args, &settings_path).unwrap();
            assert!(out.join("1D/frame_00.txt").exists());
            matrices.push(parsers::parse_matrix_file(&out.join("1D").join(RAW_MATRIX_FILE)).unwrap());
        }

        // 平坦帧：逐 bin 平均为常数，按 bin 宽归一化随环面像素数增长
        let mean = &matrices[0].columns[0];
        let width = &matrices[1].columns[0];
        let first = mean[0];
        assert!(first > 0.0);
        assert!(mean.iter().all(|v| (v - first).abs() < 1e-3));
        assert!(width[width.len() - 1] > width[0] * 2.0);
    }
}
