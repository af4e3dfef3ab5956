mod common;

use axilang::driver::{Model, PathPoint, Point, Units};
use axilang::token::Kind;
use axilang::{lex_line, AxiError, Mode, Progress, Severity};
use common::{dispatcher, dispatcher_with, run, temp_file, Call, FakeTransport, RecordingDriver};
use std::fs;

fn messages(d: &axilang::Dispatcher<RecordingDriver>) -> Vec<String> {
    d.diagnostics().iter().map(|d| d.message.clone()).collect()
}

#[test]
fn test_goto_without_mode() {
    let mut d = dispatcher(false);
    assert_eq!(run(&mut d, "GOTO 1 2").unwrap(), Progress::Complete);

    assert!(d.driver().calls.is_empty());
    assert_eq!(messages(&d), vec!["No mode specified. Please set a mode first."]);
    assert_eq!(d.diagnostics()[0].usage.as_deref(), Some("MODE <I|P>"));
}

#[test]
fn test_goto_without_mode_strict() {
    let mut d = dispatcher(true);
    let result = run(&mut d, "GOTO 1 2\nMODE I");

    assert!(matches!(result, Err(AxiError::Command(_))));
    assert!(d.driver().calls.is_empty());
    assert_eq!(d.mode(), Mode::Unset);
}

#[test]
fn test_interactive_goto() {
    let mut d = dispatcher(true);
    run(&mut d, "MODE I\nGOTO 1 2").unwrap();

    assert_eq!(d.mode(), Mode::Interactive);
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive, Call::GoTo(1.0, 2.0)]);
}

#[test]
fn test_goto_rel_and_wait() {
    let mut d = dispatcher(true);
    run(&mut d, "MODE I GOTO_REL 5 10 WAIT 250 PENTOGGLE").unwrap();

    assert_eq!(
        d.driver().calls,
        vec![
            Call::EnterInteractive,
            Call::GoToRelative(5.0, 10.0),
            Call::Wait(250.0),
            Call::PenToggle,
        ]
    );
}

#[test]
fn test_goto_missing_y() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE I\nGOTO 1\nHOME").unwrap();

    assert_eq!(messages(&d), vec!["Invalid Y coordinate specified."]);
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive, Call::Home]);
}

#[test]
fn test_draw_path() {
    let mut d = dispatcher(true);
    run(&mut d, "MODE I\nDRAW 1 2 3 4").unwrap();

    assert_eq!(
        d.driver().calls,
        vec![
            Call::EnterInteractive,
            Call::DrawPath(vec![
                PathPoint::Move(Point::new(1.0, 2.0)),
                PathPoint::Line(Point::new(3.0, 4.0)),
            ]),
        ]
    );
}

#[test]
fn test_draw_odd_coordinates() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE I\nDRAW 1 2 3").unwrap();

    assert_eq!(messages(&d), vec!["Invalid Y coordinate specified."]);
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive]);
}

#[test]
fn test_draw_without_points() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE I\nDRAW\nPENUP").unwrap();

    assert_eq!(messages(&d), vec!["Invalid X coordinate specified."]);
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive, Call::PenUp]);
}

#[test]
fn test_plot_mode_options() {
    let mut d = dispatcher(true);
    run(&mut d, "MODE P\nOPTS ACCEL 75 END_OPTS").unwrap();

    assert_eq!(d.driver().calls, vec![Call::SetAcceleration(75.0), Call::CommitOptions]);
}

#[test]
fn test_options_applied_in_order() {
    let mut d = dispatcher(true);
    run(
        &mut d,
        "MODE I\nOPTS PENU_POS 60 PEND_POS 30 MODEL 2 PORT \"COM3\" UNITS 2 END_OPTS",
    )
    .unwrap();

    assert_eq!(
        d.driver().calls,
        vec![
            Call::EnterInteractive,
            Call::SetPenUpPosition(60.0),
            Call::SetPenDownPosition(30.0),
            Call::SetModel(Model::V3A3SeA3),
            Call::SetPort(String::from("COM3")),
            Call::SetUnits(Units::Millimeters),
            Call::CommitOptions,
        ]
    );
}

#[test]
fn test_options_span_lines() {
    let mut d = dispatcher(true);
    run(&mut d, "MODE P\nOPTS\n  ACCEL 40\n  PEND_RATE 80\nEND_OPTS").unwrap();

    assert_eq!(
        d.driver().calls,
        vec![Call::SetAcceleration(40.0), Call::SetPenDownRate(80.0), Call::CommitOptions]
    );
}

#[test]
fn test_units_outside_interactive() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nOPTS UNITS 1 END_OPTS").unwrap();

    assert_eq!(messages(&d), vec!["UNITS can only be set in interactive mode."]);
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_uopts_in_plot_mode() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nUOPTS ACCEL 10 END_UOPTS").unwrap();

    assert_eq!(messages(&d), vec!["UOPTS can only be used in interactive mode."]);
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_uopts_in_interactive_mode() {
    let mut d = dispatcher(true);
    run(&mut d, "MODE I\nUOPTS PENU_SPEED 90 END_UOPTS").unwrap();

    assert_eq!(
        d.driver().calls,
        vec![Call::EnterInteractive, Call::SetPenUpSpeed(90.0), Call::CommitOptions]
    );
}

#[test]
fn test_model_out_of_range() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nOPTS MODEL 9 END_OPTS").unwrap();

    assert_eq!(messages(&d), vec!["Invalid model specified."]);
    assert_eq!(d.diagnostics()[0].usage.as_deref(), Some("MODEL <1-7>"));
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_port_requires_string() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nOPTS PORT 5 END_OPTS").unwrap();

    assert_eq!(messages(&d), vec!["Invalid port specified."]);
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_invalid_block_applies_nothing() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nOPTS ACCEL 10 PENU_POS \"high\" END_OPTS\nOPTS ACCEL 20 END_OPTS").unwrap();

    assert_eq!(messages(&d), vec!["Invalid raised pen position specified."]);
    assert_eq!(d.driver().calls, vec![Call::SetAcceleration(20.0), Call::CommitOptions]);
}

#[test]
fn test_block_never_closed() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nOPTS ACCEL 5").unwrap();

    assert_eq!(messages(&d), vec!["OPTS block is never closed."]);
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_wrong_terminator() {
    let mut d = dispatcher(true);
    let result = run(&mut d, "MODE P\nOPTS ACCEL 5 END_UOPTS");

    assert!(matches!(result, Err(AxiError::Command(_))));
    assert_eq!(messages(&d), vec!["END_UOPTS cannot close a block opened with OPTS."]);
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_command_inside_block() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE I\nOPTS ACCEL 5 HOME END_OPTS").unwrap();

    assert_eq!(messages(&d), vec!["Invalid option specified."]);
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive]);
}

#[test]
fn test_duplicate_option_warns() {
    let mut d = dispatcher(true);
    run(&mut d, "MODE P\nOPTS ACCEL 10 ACCEL 20 END_OPTS").unwrap();

    assert_eq!(d.diagnostics().len(), 1);
    assert_eq!(d.diagnostics()[0].severity, Severity::Warning);
    assert_eq!(
        d.driver().calls,
        vec![Call::SetAcceleration(10.0), Call::SetAcceleration(20.0), Call::CommitOptions]
    );
}

#[test]
fn test_open_block_is_incomplete() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P").unwrap();

    let tokens: Vec<_> = lex_line("OPTS ACCEL 10 END_OPTS OPTS PEND_POS", 2)
        .tokens
        .into_iter()
        .filter(|t| t.kind() != Kind::EndOfFile)
        .collect();

    assert_eq!(d.dispatch(&tokens).unwrap(), Progress::Incomplete { resume_at: 4 });
    assert!(d.diagnostics().is_empty());
    assert_eq!(d.driver().calls, vec![Call::SetAcceleration(10.0), Call::CommitOptions]);
}

fn line(text: &str, number: usize) -> Vec<axilang::token::PositionedToken> {
    lex_line(text, number)
        .tokens
        .into_iter()
        .filter(|t| t.kind() != Kind::EndOfFile)
        .collect()
}

#[test]
fn test_rejected_open_block_is_discarded() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE I").unwrap();

    assert_eq!(d.dispatch(&line("OPTS ACCEL abc", 2)).unwrap(), Progress::Discarding);
    assert_eq!(d.dispatch(&line("PENU_POS 40 HOME", 3)).unwrap(), Progress::Discarding);
    assert_eq!(d.dispatch(&line("END_OPTS HOME", 4)).unwrap(), Progress::Complete);

    assert!(!d.is_discarding());
    assert_eq!(messages(&d), vec!["Invalid acceleration specified."]);
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive, Call::Home]);
}

#[test]
fn test_strict_never_discards() {
    let mut d = dispatcher(true);
    run(&mut d, "MODE I").unwrap();

    let result = d.dispatch(&line("OPTS ACCEL abc", 2));
    assert!(matches!(result, Err(AxiError::Command(_))));
    assert!(!d.is_discarding());
}

#[test]
fn test_lenient_skips_bad_line() {
    let mut d = dispatcher(false);
    let result = run(&mut d, "MODE I\nGOTO 1 abc 7\nHOME");

    assert_eq!(result.unwrap(), Progress::Complete);
    assert_eq!(messages(&d), vec!["Invalid Y coordinate specified."]);
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive, Call::Home]);
}

#[test]
fn test_strict_halts_on_bad_line() {
    let mut d = dispatcher(true);
    let result = run(&mut d, "MODE I\nGOTO 1 abc 7\nHOME");

    assert!(matches!(result, Err(AxiError::Command(_))));
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive]);
}

#[test]
fn test_unknown_token_position() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE I\n  HOME FLY\nPENDOWN").unwrap();

    let diagnostic = &d.diagnostics()[0];
    assert_eq!(diagnostic.message, "Unknown token 'FLY'");
    assert_eq!(diagnostic.line_number(), Some(2));
    assert_eq!(diagnostic.position.as_ref().map(|p| p.start), Some(7));
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive, Call::Home, Call::PenDown]);
}

#[test]
fn test_stray_tokens() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE I\n42\nEND_OPTS\nI").unwrap();

    assert_eq!(
        messages(&d),
        vec![
            "Unexpected token '42'",
            "Unexpected token 'END_OPTS'",
            "Unexpected token 'I'",
        ]
    );
}

#[test]
fn test_mode_set_twice() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nMODE I").unwrap();

    assert_eq!(d.mode(), Mode::Plot);
    assert_eq!(messages(&d), vec!["Mode is already set to plot."]);
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_invalid_mode() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE X").unwrap();

    assert!(!d.is_mode_set());
    assert_eq!(messages(&d), vec!["Invalid mode specified."]);
}

#[test]
fn test_interactive_command_in_plot_mode() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nHOME").unwrap();

    assert_eq!(messages(&d), vec!["HOME can only be used in interactive mode."]);
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_setplot_in_interactive_mode() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE I\nSETPLOT \"drawing.svg\"").unwrap();

    assert_eq!(messages(&d), vec!["SETPLOT can only be used in plot mode."]);
}

#[test]
fn test_setplot_missing_path() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nSETPLOT\nSETPLOT 12").unwrap();

    assert_eq!(
        messages(&d),
        vec!["No file path/internet URL specified.", "No file path/internet URL specified."]
    );
}

#[test]
fn test_setplot_missing_file() {
    let mut d = dispatcher(false);
    run(&mut d, "MODE P\nSETPLOT \"/nonexistent/axilang/plot.svg\"\nPLOT").unwrap();

    assert_eq!(
        messages(&d),
        vec![
            "Could not open file '/nonexistent/axilang/plot.svg'.",
            "No plot file set. Use SETPLOT first.",
        ]
    );
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_plot_without_setplot() {
    let mut d = dispatcher(true);
    let result = run(&mut d, "MODE P\nPLOT");

    assert!(matches!(result, Err(AxiError::Command(_))));
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_setplot_and_plot() {
    let path = temp_file("setplot.svg", "<svg/>");
    let mut d = dispatcher(true);
    run(&mut d, &format!("MODE P\nSETPLOT \"{}\"\nPLOT", path.display())).unwrap();

    assert_eq!(d.driver().calls, vec![Call::SetupPlot(path.clone()), Call::RunPlot]);
    fs::remove_file(path).unwrap();
}

#[test]
fn test_setplot_url() {
    let transport = FakeTransport::default()
        .redirect("http://plots.test/latest", "http://plots.test/v2.svg")
        .serve("http://plots.test/v2.svg", "<svg>v2</svg>");
    let mut d = dispatcher_with(RecordingDriver::default(), transport, true);
    run(&mut d, "MODE P\nSETPLOT \"http://plots.test/latest\"").unwrap();

    let downloaded = match d.driver().calls.as_slice() {
        [Call::SetupPlot(path)] => path.clone(),
        calls => panic!("unexpected calls: {:?}", calls),
    };
    assert_eq!(fs::read_to_string(&downloaded).unwrap(), "<svg>v2</svg>");
    fs::remove_file(downloaded).unwrap();
}

#[test]
fn test_setplot_url_failure_is_fatal() {
    let mut d = dispatcher(false);
    let result = run(&mut d, "MODE P\nSETPLOT \"http://plots.test/missing.svg\"\nPLOT");

    match result {
        Err(e @ AxiError::Fetch(_)) => assert!(e.is_fatal()),
        other => panic!("expected a fetch error, got {:?}", other),
    }
    assert!(d.driver().calls.is_empty());
}

#[test]
fn test_unsupported_setting_warns() {
    let driver = RecordingDriver {
        unsupported: vec!["set_pen_up_rate"],
        ..RecordingDriver::default()
    };
    let mut d = dispatcher_with(driver, FakeTransport::default(), true);
    run(&mut d, "MODE I\nOPTS PENU_RATE 50 ACCEL 20 END_OPTS\nHOME").unwrap();

    assert_eq!(d.diagnostics()[0].severity, Severity::Warning);
    assert_eq!(
        d.driver().calls,
        vec![
            Call::EnterInteractive,
            Call::SetAcceleration(20.0),
            Call::CommitOptions,
            Call::Home,
        ]
    );
}

#[test]
fn test_driver_fatal_error() {
    let driver = RecordingDriver {
        fatal_connect: true,
        ..RecordingDriver::default()
    };
    let mut d = dispatcher_with(driver, FakeTransport::default(), false);
    let result = run(&mut d, "MODE I\nCONNECT\nHOME");

    assert!(matches!(result, Err(AxiError::Driver(_))));
    assert_eq!(d.driver().calls, vec![Call::EnterInteractive]);
}

#[test]
fn test_simulated_driver_script() {
    use axilang::{Config, Dispatcher, Fetcher, SimulatedDriver};

    let config = Config::default();
    let mut d = Dispatcher::new(SimulatedDriver::new(), Fetcher::new(&config), true, &config);
    let tokens = common::tokens("MODE I\nOPTS ACCEL 60 END_OPTS\nCONNECT\nGOTO 3 4\nPENDOWN\nGETPOS\nDISCONNECT");

    assert_eq!(d.dispatch(&tokens).unwrap(), Progress::Complete);
    assert!(!d.driver().is_connected());
    assert_eq!(d.driver().options().acceleration, 60.0);
}
