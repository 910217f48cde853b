use milpkit::{
    Domain, SaveFileSettings, Session, SessionSettings, SolutionStatus, SolverError, Variable,
};
use std::fs;
use tempfile::TempDir;

const EPS: f64 = 1e-6;

struct Production {
    x: Variable,
    y: Variable,
    profit: Variable,
}

/// max 3x + 2y  s.t.  x + y <= 4, x + 3y <= 6, x, y >= 0
fn production_model(session: &mut Session, with_goal: bool) -> Production {
    let x = session.create("x", Domain::PositiveOrZeroReal).unwrap();
    let y = session.create("y", Domain::PositiveOrZeroReal).unwrap();

    let one = session.from_constant(1.0, Domain::AnyConstantReal).unwrap();
    let two = session.from_constant(2.0, Domain::AnyConstantReal).unwrap();
    let three = session.from_constant(3.0, Domain::AnyConstantReal).unwrap();
    let four = session.from_constant(4.0, Domain::AnyConstantReal).unwrap();
    let six = session.from_constant(6.0, Domain::AnyConstantReal).unwrap();

    let x_plus_y = session.sum(&x, &y, Domain::AnyReal).unwrap();
    session.set_less_or_equal(&x_plus_y, &four).unwrap();

    let three_y = session.multiply_by_constant(&y, &three, Domain::AnyReal).unwrap();
    let one_x = session.multiply_by_constant(&x, &one, Domain::AnyReal).unwrap();
    let mixed = session.sum(&one_x, &three_y, Domain::AnyReal).unwrap();
    session.set_less_or_equal(&mixed, &six).unwrap();

    let three_x = session.multiply_by_constant(&x, &three, Domain::AnyReal).unwrap();
    let two_y = session.multiply_by_constant(&y, &two, Domain::AnyReal).unwrap();
    let profit = session.sum(&three_x, &two_y, Domain::AnyReal).unwrap();
    if with_goal {
        session.add_goal("profit", &profit).unwrap();
    }

    Production { x, y, profit }
}

#[test]
fn reloaded_model_solves_like_the_saved_one() {
    let dir = TempDir::new().unwrap();
    let files = SaveFileSettings::new(dir.path().join("production.lp"));

    let mut saved = Session::new();
    let model = production_model(&mut saved, true);
    assert_eq!(saved.solve().unwrap(), SolutionStatus::Optimal);
    let x_value = saved.value(&model.x).unwrap();
    let y_value = saved.value(&model.y).unwrap();
    saved.save_model(&files).unwrap();
    assert!(files.metadata_path().exists());

    let mut reloaded = Session::new();
    reloaded.load_model(&files).unwrap();
    assert!(reloaded.has_goal());
    assert_eq!(reloaded.goal_name(), Some("profit"));
    assert_eq!(reloaded.solve().unwrap(), SolutionStatus::Optimal);

    let x = reloaded.get_by_name("x").unwrap();
    let y = reloaded.get_by_name("y").unwrap();
    assert_eq!(x.domain(), Domain::PositiveOrZeroReal);
    assert!((reloaded.value(&x).unwrap() - x_value).abs() < EPS);
    assert!((reloaded.value(&y).unwrap() - y_value).abs() < EPS);
    assert!((reloaded.value(&x).unwrap() - 4.0).abs() < EPS);
    assert!((reloaded.objective_value().unwrap().unwrap() - 12.0).abs() < EPS);
}

#[test]
fn load_in_place_and_rehydrate_old_handles() {
    let dir = TempDir::new().unwrap();
    let files = SaveFileSettings::new(dir.path().join("production.lp"));

    let mut session = Session::new();
    let model = production_model(&mut session, true);
    session.save_model(&files).unwrap();
    session.load_model(&files).unwrap();
    assert_eq!(session.solve().unwrap(), SolutionStatus::Optimal);

    // Old handles point at the released environment
    assert!(matches!(session.value(&model.x), Err(SolverError::ForeignHandle(_))));

    let x = session.rehydrate(&model.x).unwrap();
    let profit = session.rehydrate(&model.profit).unwrap();
    assert!((session.value(&x).unwrap() - 4.0).abs() < EPS);
    assert!((session.value(&profit).unwrap() - 12.0).abs() < EPS);

    // Rehydrating a current handle is a no-op
    assert_eq!(session.rehydrate(&x).unwrap(), x);

    // New columns do not collide with loaded ones
    let z = session.create_anonymous(Domain::AnyReal).unwrap();
    assert_eq!(z.name(), "x_2");
}

#[test]
fn model_without_goal_reloads_without_objective() {
    let dir = TempDir::new().unwrap();
    let files = SaveFileSettings::new(dir.path().join("feasibility.lp"));

    let mut saved = Session::new();
    production_model(&mut saved, false);
    assert!(!saved.has_goal());
    saved.save_model(&files).unwrap();

    let mut reloaded = Session::new();
    reloaded.load_model(&files).unwrap();
    assert!(!reloaded.has_goal());
    assert!(reloaded.goal_name().is_none());
    assert!(reloaded.model().unwrap().objective.is_none());

    assert_eq!(reloaded.solve().unwrap(), SolutionStatus::Optimal);
    let x = reloaded.value(&reloaded.get_by_name("x").unwrap()).unwrap();
    let y = reloaded.value(&reloaded.get_by_name("y").unwrap()).unwrap();
    assert!(x + y <= 4.0 + EPS);
    assert!(x + 3.0 * y <= 6.0 + EPS);
}

#[test]
fn missing_metadata_keeps_the_current_model() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("lonely.lp");
    fs::write(&model_path, "Maximize\n obj: a\nSubject To\n c0: a <= 2\nEnd\n").unwrap();

    let mut session = Session::new();
    let kept = session.create("kept", Domain::AnyInteger).unwrap();
    let files = SaveFileSettings::new(&model_path);

    assert!(matches!(session.load_model(&files), Err(SolverError::Io(_))));
    assert_eq!(session.get_by_name("kept").unwrap(), kept);
    assert_eq!(session.model().unwrap().columns.len(), 1);
}

#[test]
fn minimal_metadata_loads_a_hand_written_model() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("hand.lp");
    let meta_path = dir.path().join("hand.json");
    fs::write(
        &model_path,
        "Maximize\n obj: 2 a + b\nSubject To\n c0: a + b <= 3\nBounds\n a <= 2\nEnd\n",
    )
    .unwrap();
    fs::write(&meta_path, r#"{ "has_goal": true }"#).unwrap();

    let mut session = Session::new();
    let files = SaveFileSettings::new(&model_path).with_metadata_path(&meta_path);
    session.load_model(&files).unwrap();

    assert!(session.has_goal());
    assert_eq!(session.variables().count(), 0);
    assert_eq!(session.solve().unwrap(), SolutionStatus::Optimal);
    assert!((session.objective_value().unwrap().unwrap() - 5.0).abs() < EPS);
}

#[test]
fn syntax_errors_carry_a_line_number() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("broken.lp");
    let meta_path = dir.path().join("broken.json");
    fs::write(&model_path, "Maximize\n obj: a\nSubject To\n c0: a <= <= 2\nEnd\n").unwrap();
    fs::write(&meta_path, r#"{ "has_goal": true }"#).unwrap();

    let mut session = Session::new();
    let files = SaveFileSettings::new(&model_path).with_metadata_path(&meta_path);
    match session.load_model(&files) {
        Err(SolverError::ModelFormat { line, .. }) => assert_eq!(line, 4),
        other => panic!("expected ModelFormat, got {other:?}"),
    }
}

#[test]
fn metadata_naming_a_missing_column_is_a_remap_error() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("short.lp");
    let meta_path = dir.path().join("short.json");
    fs::write(&model_path, "Maximize\n obj: a\nSubject To\n c0: a <= 2\nEnd\n").unwrap();
    fs::write(
        &meta_path,
        r#"{
            "has_goal": true,
            "columns": ["a", "ghost"],
            "variables": [
                { "name": "a", "domain": "PositiveOrZeroReal", "persistence_index": 0 },
                { "name": "g", "domain": "AnyReal", "persistence_index": 1 }
            ]
        }"#,
    )
    .unwrap();

    let mut session = Session::new();
    let files = SaveFileSettings::new(&model_path).with_metadata_path(&meta_path);
    assert!(matches!(
        session.load_model(&files),
        Err(SolverError::Remap { column, index: 1 }) if column == "ghost"
    ));
}

#[test]
fn custom_prefix_round_trips() {
    let dir = TempDir::new().unwrap();
    let files = SaveFileSettings::new(dir.path().join("prefixed.lp"));
    let settings = SessionSettings::default().with_variable_prefix("col.");

    let mut saved = Session::with_settings(settings.clone()).unwrap();
    let x = saved.create_anonymous(Domain::PositiveOrZeroReal).unwrap();
    assert_eq!(x.name(), "col.0");
    let four = saved.from_constant(4.0, Domain::AnyConstantReal).unwrap();
    saved.set_less_or_equal(&x, &four).unwrap();
    saved.add_goal("x", &x).unwrap();
    saved.save_model(&files).unwrap();

    let mut reloaded = Session::with_settings(settings).unwrap();
    reloaded.load_model(&files).unwrap();
    assert_eq!(reloaded.solve().unwrap(), SolutionStatus::Optimal);
    let x = reloaded.get_by_name("col.0").unwrap();
    assert!((reloaded.value(&x).unwrap() - 4.0).abs() < EPS);

    // A prefix that would not survive the LP file is refused before any save
    let empty = SessionSettings::default().with_variable_prefix("");
    assert!(matches!(Session::with_settings(empty), Err(SolverError::InvalidProblem(_))));
}
