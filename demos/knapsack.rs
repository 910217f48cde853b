// Example: Mixed-Integer Programming (MIP) - 0/1 Knapsack Problem
//
// A hiker has a knapsack with capacity of 15 kg.
// There are 5 items to choose from:
//
// Item   | Weight (kg) | Value ($)
// -------|-------------|----------
// Tent   |     7       |   150
// Stove  |     3       |    90
// Food   |     4       |   120
// Water  |     5       |   100
// Camera |     2       |    80
//
// Decision Variables: x_i ∈ {0, 1} for each item (take it or not)
// Maximize: 150*x₁ + 90*x₂ + 120*x₃ + 100*x₄ + 80*x₅
// Subject to: 7*x₁ + 3*x₂ + 4*x₃ + 5*x₄ + 2*x₅ ≤ 15 (weight limit)
//
// The model is saved, reloaded into a second session and solved again.
//
// Run with: cargo run --example knapsack [-- --verbose]

use milpkit::{
    init_tracing, Domain, SaveFileSettings, Session, SessionSettings, SolutionStatus,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let verbose = std::env::args().any(|arg| arg == "--verbose" || arg == "-v");
    init_tracing(verbose);

    println!("=== Knapsack Problem (Mixed-Integer Programming) ===\n");

    let items = [
        ("Tent", 7, 150),
        ("Stove", 3, 90),
        ("Food", 4, 120),
        ("Water", 5, 100),
        ("Camera", 2, 80),
    ];

    println!("Available Items:");
    println!("┌────────┬────────────┬───────────┐");
    println!("│ Item   │ Weight(kg) │ Value ($) │");
    println!("├────────┼────────────┼───────────┤");
    for (name, weight, value) in &items {
        println!("│ {:6} │    {:5}   │   {:6}  │", name, weight, value);
    }
    println!("└────────┴────────────┴───────────┘");
    println!("\nKnapsack Capacity: 15 kg\n");

    let mut session = Session::with_settings(SessionSettings::default())?;
    println!("Solver: {}\n", session.solver_name());

    let mut total_weight = session.from_integer(0, Domain::AnyConstantInteger)?;
    let mut total_value = session.from_integer(0, Domain::AnyConstantInteger)?;
    let mut picks = Vec::new();

    for (name, weight, value) in &items {
        let pick = session.create(*name, Domain::BinaryInteger)?;
        let weight = session.from_integer(*weight, Domain::AnyConstantInteger)?;
        let value = session.from_integer(*value, Domain::AnyConstantInteger)?;

        let weighted = session.multiply_by_constant(&pick, &weight, Domain::PositiveOrZeroInteger)?;
        let valued = session.multiply_by_constant(&pick, &value, Domain::PositiveOrZeroInteger)?;
        total_weight = session.sum(&total_weight, &weighted, Domain::PositiveOrZeroInteger)?;
        total_value = session.sum(&total_value, &valued, Domain::PositiveOrZeroInteger)?;
        picks.push(pick);
    }

    let capacity = session.from_integer(15, Domain::AnyConstantInteger)?;
    session.set_less_or_equal(&total_weight, &capacity)?;
    session.add_goal("total_value", &total_value)?;

    match session.solve()? {
        SolutionStatus::Optimal | SolutionStatus::Feasible => {
            println!("✓ Optimal solution found!\n");
            println!("Items to Pack:");
            for ((name, weight, value), pick) in items.iter().zip(&picks) {
                if session.value(pick)? > 0.5 {
                    println!("  ✓ {:6} - Weight: {} kg, Value: ${}", name, weight, value);
                } else {
                    println!("  ✗ {:6} - (not selected)", name);
                }
            }

            println!("\nSummary:");
            println!("  Total Weight:  {:.1} / 15.0 kg", session.value(&total_weight)?);
            println!("  Total Value:   ${:.0}", session.value(&total_value)?);

            if let Some(stats) = session.statistics()? {
                println!("\nSolver Statistics:");
                println!(
                    "  Variables:   {} ({} binary)",
                    stats.num_columns, stats.num_binary_columns
                );
                println!("  Constraints: {}", stats.num_rows);
                println!("  Solve Time:  {:.2} ms", stats.solve_time_ms);
            }
        }
        SolutionStatus::Infeasible => println!("✗ Problem is infeasible"),
        SolutionStatus::Unbounded => println!("⚠ Problem is unbounded"),
        SolutionStatus::Unknown => println!("✗ Solver error"),
    }

    // Persist, reload into a fresh session and solve again
    let path = std::env::temp_dir().join("milpkit-knapsack.lp");
    let files = SaveFileSettings::new(&path);
    session.save_model(&files)?;
    session.dispose();

    let mut reloaded = Session::new();
    reloaded.load_model(&files)?;
    let status = reloaded.solve()?;
    println!("\n=== Reloaded from {} ===\n", path.display());
    println!("Status: {}", status);
    for (name, _, _) in &items {
        let pick = reloaded.get_by_name(name)?;
        println!("  {:6} = {}", name, reloaded.value(&pick)?);
    }
    if let Some(objective) = reloaded.objective_value()? {
        println!("  Objective: ${:.0}", objective);
    }

    Ok(())
}
