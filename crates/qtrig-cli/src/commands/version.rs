//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - timing-aware compilation to channel trigger streams",
        style("qtrig").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qtrig-ir       Platforms, kernels and programs");
    println!("  qtrig-sched    ASAP/ALAP scheduling with channel exclusivity");
    println!("  qtrig-codegen  Wait/trigger stream generation");
    println!("  qtrig-compile  Passes and pass pipeline");
    println!("  qtrig-cli      Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style(env!("CARGO_PKG_REPOSITORY")).underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
