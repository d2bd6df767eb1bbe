use colored::Colorize;

const WIDTH: usize = 12;

/// Prints the value of a training metric after an epoch.
pub(crate) fn epoch(model: &str, epoch: usize, metric: &str, value: f64) {
    println!(
        "{}    {}",
        format!("  [{} epoch {:>4}]", model, epoch).bold().red(),
        format!("[{} {:>width$.4}]", metric, value, width = WIDTH)
            .bold()
            .green(),
    );
}

/// Prints the binary task a multiclass member is trained on.
pub(crate) fn member(model: &str, task: &str, train_size: usize) {
    println!(
        "{}    {}    {}",
        format!("  [{}]", model).bold().red(),
        format!("[{}]", task).bold().yellow(),
        format!("[TRAIN {:>width$}]", train_size, width = WIDTH)
            .bold()
            .green(),
    );
}
